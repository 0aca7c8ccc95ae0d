//! Frame encoding and validation.
//!
//! # Wire Format
//!
//! ```text
//! <frame word> <payload word 0> ... <payload word n-1> <crc>
//! ```
//!
//! - frame word: command (bits 31..24), recipient (23..16), sender (15..8),
//!   payload length in words (7..0)
//! - payload: 0..=255 words
//! - crc: XOR of every preceding byte
//!
//! Each word leaves the wire least significant byte first, so the frame word
//! goes out as length, sender, recipient, command. Bytes are serialized most
//! significant bit first by the line layer (see [`crate::waveform`]).

use crate::command::Command;
use crate::crc::CrcDigest;

/// Maximum number of payload words in a frame.
pub const MAX_PAYLOAD_WORDS: usize = 255;

/// Maximum number of words in a frame (frame word + payload).
pub const MAX_FRAME_WORDS: usize = MAX_PAYLOAD_WORDS + 1;

/// Maximum number of bytes in an encoded frame, check byte included.
pub const MAX_FRAME_BYTES: usize = MAX_FRAME_WORDS * 4 + 1;

/// Number of bytes an encoded frame with `payload_words` words occupies.
#[inline]
#[must_use]
pub const fn encoded_len(payload_words: usize) -> usize {
    (payload_words + 1) * 4 + 1
}

/// Error type for frame encoding and decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Fewer bytes than a frame word and check byte, or not word aligned.
    TooShort,
    /// Length field does not match the number of payload words.
    LengthMismatch,
    /// Check byte mismatch.
    Crc,
    /// More than [`MAX_PAYLOAD_WORDS`] payload words.
    PayloadTooLong,
    /// Output buffer too small.
    BufferTooSmall,
}

/// The first word of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameHeader {
    pub command: u8,
    pub recipient: u8,
    pub sender: u8,
    /// Payload length in words.
    pub length: u8,
}

impl FrameHeader {
    #[must_use]
    pub const fn new(command: u8, recipient: u8, sender: u8, length: u8) -> Self {
        Self {
            command,
            recipient,
            sender,
            length,
        }
    }

    /// Unpack a frame word.
    #[must_use]
    pub const fn from_word(word: u32) -> Self {
        Self {
            command: (word >> 24) as u8,
            recipient: (word >> 16) as u8,
            sender: (word >> 8) as u8,
            length: word as u8,
        }
    }

    /// Pack into a frame word.
    #[must_use]
    pub const fn to_word(self) -> u32 {
        (self.command as u32) << 24
            | (self.recipient as u32) << 16
            | (self.sender as u32) << 8
            | self.length as u32
    }

    /// The command, if it is one the bus defines.
    #[inline]
    #[must_use]
    pub const fn command(self) -> Option<Command> {
        Command::from_byte(self.command)
    }
}

/// Encode a frame with the given command and addresses.
///
/// The length field is taken from `payload.len()`.
/// Returns the number of bytes written to `out`.
pub fn encode_frame(
    command: u8,
    sender: u8,
    recipient: u8,
    payload: &[u32],
    out: &mut [u8],
) -> Result<usize, FrameError> {
    if payload.len() > MAX_PAYLOAD_WORDS {
        return Err(FrameError::PayloadTooLong);
    }
    let header = FrameHeader::new(command, recipient, sender, payload.len() as u8);
    encode_raw(header.to_word(), payload, out)
}

/// Encode a frame from a caller-built frame word.
///
/// The frame word is sent verbatim, but its length field must still match
/// the payload.
pub fn encode_raw(frame_word: u32, payload: &[u32], out: &mut [u8]) -> Result<usize, FrameError> {
    if payload.len() > MAX_PAYLOAD_WORDS {
        return Err(FrameError::PayloadTooLong);
    }
    if FrameHeader::from_word(frame_word).length as usize != payload.len() {
        return Err(FrameError::LengthMismatch);
    }
    let len = encoded_len(payload.len());
    if out.len() < len {
        return Err(FrameError::BufferTooSmall);
    }

    // Byte order swap and check byte in a single pass
    let mut crc = CrcDigest::new();
    let words = core::iter::once(&frame_word).chain(payload);
    for (chunk, &word) in out.chunks_exact_mut(4).zip(words) {
        let bytes = word.to_le_bytes();
        chunk.copy_from_slice(&bytes);
        crc.update_slice(&bytes);
    }
    out[len - 1] = crc.finalize();

    Ok(len)
}

/// True if `bytes` is a complete frame whose check byte and length field
/// agree with its contents.
#[must_use]
pub fn validate(bytes: &[u8]) -> bool {
    check(bytes).is_ok()
}

fn check(bytes: &[u8]) -> Result<FrameHeader, FrameError> {
    if bytes.len() < encoded_len(0) || (bytes.len() - 1) % 4 != 0 {
        return Err(FrameError::TooShort);
    }
    let (body, crc) = bytes.split_at(bytes.len() - 1);
    let mut digest = CrcDigest::new();
    digest.update_slice(body);
    if digest.finalize() != crc[0] {
        return Err(FrameError::Crc);
    }
    let header = FrameHeader::from_word(u32::from_le_bytes([body[0], body[1], body[2], body[3]]));
    if header.length as usize != body.len() / 4 - 1 {
        return Err(FrameError::LengthMismatch);
    }
    Ok(header)
}

/// Validate and unpack a received frame.
///
/// Payload words are written to `payload`; returns the header and the number
/// of payload words.
pub fn decode_frame(bytes: &[u8], payload: &mut [u32]) -> Result<(FrameHeader, usize), FrameError> {
    let header = check(bytes)?;
    let count = header.length as usize;
    if payload.len() < count {
        return Err(FrameError::BufferTooSmall);
    }
    for (word, chunk) in payload.iter_mut().zip(bytes[4..4 + count * 4].chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    Ok((header, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_word_layout() {
        let header = FrameHeader::new(0x09, 0x20, 0x00, 0x01);
        assert_eq!(header.to_word(), 0x0920_0001);
        assert_eq!(FrameHeader::from_word(0x0920_0001), header);
        assert_eq!(header.command(), Some(Command::GetCondition));
    }

    #[test]
    fn test_encode_get_condition() {
        let mut buf = [0u8; 16];
        let len = encode_frame(0x09, 0x00, 0x20, &[0x0000_0001], &mut buf).unwrap();
        assert_eq!(len, 9);
        // Length, sender, recipient, command; then the function code LSB first
        assert_eq!(&buf[..8], &[0x01, 0x00, 0x20, 0x09, 0x01, 0x00, 0x00, 0x00]);
        assert_eq!(buf[8], 0x01 ^ 0x20 ^ 0x09 ^ 0x01);
    }

    #[test]
    fn test_encode_empty_payload() {
        let mut buf = [0u8; 8];
        let len = encode_frame(0x01, 0x40, 0x60, &[], &mut buf).unwrap();
        assert_eq!(len, 5);
        assert_eq!(&buf[..5], &[0x00, 0x40, 0x60, 0x01, 0x40 ^ 0x60 ^ 0x01]);
    }

    #[test]
    fn test_validate_encoded_frames() {
        let payloads: [&[u32]; 3] = [&[], &[0xDEAD_BEEF], &[1, 2, 3, 0xFFFF_FFFF]];
        for payload in payloads {
            let mut buf = [0u8; 32];
            let len = encode_frame(0x08, 0x00, 0x20, payload, &mut buf).unwrap();
            assert!(validate(&buf[..len]));
        }
    }

    #[test]
    fn test_any_flipped_byte_fails_validation() {
        let mut buf = [0u8; 32];
        let len = encode_frame(0x08, 0x00, 0x20, &[0x1234_5678, 0x9ABC_DEF0], &mut buf).unwrap();
        for i in 0..len {
            let mut corrupt = buf;
            corrupt[i] ^= 0x10;
            assert!(!validate(&corrupt[..len]), "byte {} flip not detected", i);
        }
    }

    #[test]
    fn test_decode_round_trip() {
        let mut buf = [0u8; 32];
        let len = encode_frame(0x08, 0x20, 0x00, &[0x0000_0001, 0xAABB_CCDD], &mut buf).unwrap();
        let mut payload = [0u32; 4];
        let (header, count) = decode_frame(&buf[..len], &mut payload).unwrap();
        assert_eq!(header.command, 0x08);
        assert_eq!(header.sender, 0x20);
        assert_eq!(header.recipient, 0x00);
        assert_eq!(count, 2);
        assert_eq!(&payload[..2], &[0x0000_0001, 0xAABB_CCDD]);
    }

    #[test]
    fn test_decode_rejects_length_mismatch() {
        // Header claims 2 words but only one follows; check byte is consistent
        let mut bytes = [0x02, 0x20, 0x00, 0x08, 0x01, 0x00, 0x00, 0x00, 0x00];
        bytes[8] = bytes[..8].iter().fold(0, |c, b| c ^ b);
        let mut payload = [0u32; 4];
        assert_eq!(decode_frame(&bytes, &mut payload), Err(FrameError::LengthMismatch));
    }

    #[test]
    fn test_decode_rejects_short_and_unaligned() {
        let mut payload = [0u32; 1];
        assert_eq!(decode_frame(&[0x00, 0x00, 0x00], &mut payload), Err(FrameError::TooShort));
        assert_eq!(
            decode_frame(&[0x00, 0x00, 0x00, 0x05, 0x05, 0x00], &mut payload),
            Err(FrameError::TooShort)
        );
    }

    #[test]
    fn test_decode_buffer_too_small() {
        let mut buf = [0u8; 32];
        let len = encode_frame(0x08, 0x20, 0x00, &[1, 2], &mut buf).unwrap();
        let mut payload = [0u32; 1];
        assert_eq!(decode_frame(&buf[..len], &mut payload), Err(FrameError::BufferTooSmall));
    }

    #[test]
    fn test_raw_frame_word_must_match_payload() {
        let mut buf = [0u8; 16];
        assert_eq!(
            encode_raw(0x0920_0002, &[1], &mut buf),
            Err(FrameError::LengthMismatch)
        );
        assert_eq!(encode_raw(0x0920_0001, &[1], &mut buf), Ok(9));
    }

    #[test]
    fn test_encode_payload_too_long() {
        let payload = [0u32; MAX_PAYLOAD_WORDS + 1];
        let mut buf = [0u8; MAX_FRAME_BYTES + 4];
        assert_eq!(
            encode_frame(0x0C, 0x00, 0x01, &payload, &mut buf),
            Err(FrameError::PayloadTooLong)
        );
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let mut buf = [0u8; 8];
        assert_eq!(
            encode_frame(0x09, 0x00, 0x20, &[1], &mut buf),
            Err(FrameError::BufferTooSmall)
        );
    }
}
