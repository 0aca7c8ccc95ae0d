//! Frame check byte.
//!
//! The bus protects every frame with a single byte: the XOR of all header and
//! payload bytes. The check byte itself is not part of the sum.

/// Calculate the check byte of a byte slice.
#[inline]
#[must_use]
pub fn calculate_crc(data: &[u8]) -> u8 {
    data.iter().fold(0, |crc, &b| crc ^ b)
}

/// Check byte digest for incremental calculation.
///
/// Use this when building a frame word-by-word (e.g., while swapping the
/// byte order into the wire layout).
#[derive(Debug, Clone, Copy, Default)]
pub struct CrcDigest {
    crc: u8,
}

impl CrcDigest {
    /// Create a new digest.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { crc: 0 }
    }

    /// Update the digest with a single byte.
    #[inline]
    pub fn update(&mut self, byte: u8) {
        self.crc ^= byte;
    }

    /// Update the digest with a byte slice.
    #[inline]
    pub fn update_slice(&mut self, data: &[u8]) {
        for &b in data {
            self.update(b);
        }
    }

    /// Update the digest with the four bytes of a word.
    #[inline]
    pub fn update_word(&mut self, word: u32) {
        self.update_slice(&word.to_le_bytes());
    }

    /// Finalize and return the check byte.
    #[inline]
    #[must_use]
    pub fn finalize(self) -> u8 {
        self.crc
    }
}
