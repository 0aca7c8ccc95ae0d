//! Device info response decoding.
//!
//! The payload of a device info response is 28 words. Viewed as bytes in
//! word order (each word most significant byte first):
//!
//! ```text
//! offset  size  field
//!      0     4  function codes
//!      4    12  function definitions (one word per reported function)
//!     16     1  region
//!     17     1  connector direction
//!     18    30  product name (ASCII, space padded)
//!     48    60  product license (ASCII, space padded)
//!    108     2  standby power (0.1 mW, little endian)
//!    110     2  maximum power (0.1 mW, little endian)
//! ```

use crate::function::FunctionCodes;

/// Number of payload words in a complete device info response.
pub const DEVICE_INFO_WORDS: usize = 28;

/// Fewest words needed to identify a peripheral.
pub const DEVICE_INFO_MIN_WORDS: usize = 5;

pub const PRODUCT_NAME_LEN: usize = 30;
pub const PRODUCT_LICENSE_LEN: usize = 60;

const NAME_OFFSET: usize = 18;
const LICENSE_OFFSET: usize = NAME_OFFSET + PRODUCT_NAME_LEN;
const POWER_OFFSET: usize = LICENSE_OFFSET + PRODUCT_LICENSE_LEN;

/// Decoded device info response.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceInfo {
    pub functions: FunctionCodes,
    pub function_definitions: [u32; 3],
    pub region: u8,
    pub connector_direction: u8,
    pub product_name: [u8; PRODUCT_NAME_LEN],
    pub product_license: [u8; PRODUCT_LICENSE_LEN],
    pub standby_power: u16,
    pub max_power: u16,
}

impl DeviceInfo {
    /// Decode a device info payload.
    ///
    /// Returns `None` if the payload is too short to carry the function codes
    /// and region word. Text and power fields missing from a short payload are
    /// left blank.
    #[must_use]
    pub fn decode(payload: &[u32]) -> Option<Self> {
        if payload.len() < DEVICE_INFO_MIN_WORDS {
            return None;
        }

        let mut bytes = [0u8; DEVICE_INFO_WORDS * 4];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(payload) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        let available = payload.len().min(DEVICE_INFO_WORDS) * 4;

        let mut product_name = [b' '; PRODUCT_NAME_LEN];
        copy_field(&mut product_name, &bytes, NAME_OFFSET, available);
        let mut product_license = [b' '; PRODUCT_LICENSE_LEN];
        copy_field(&mut product_license, &bytes, LICENSE_OFFSET, available);

        let (standby_power, max_power) = if available >= POWER_OFFSET + 4 {
            (
                u16::from_le_bytes([bytes[POWER_OFFSET], bytes[POWER_OFFSET + 1]]),
                u16::from_le_bytes([bytes[POWER_OFFSET + 2], bytes[POWER_OFFSET + 3]]),
            )
        } else {
            (0, 0)
        };

        Some(Self {
            functions: FunctionCodes(payload[0]),
            function_definitions: [payload[1], payload[2], payload[3]],
            region: (payload[4] >> 24) as u8,
            connector_direction: (payload[4] >> 16) as u8,
            product_name,
            product_license,
            standby_power,
            max_power,
        })
    }

    /// Product name without padding, or an empty string if it is not text.
    #[must_use]
    pub fn product_name(&self) -> &str {
        trimmed(&self.product_name)
    }

    /// Product license without padding, or an empty string if it is not text.
    #[must_use]
    pub fn product_license(&self) -> &str {
        trimmed(&self.product_license)
    }

    /// True if the peripheral can report controller condition.
    #[inline]
    #[must_use]
    pub const fn is_controller(&self) -> bool {
        self.functions.contains(FunctionCodes::CONTROLLER)
    }
}

/// Copy a field only if the payload carries all of it.
fn copy_field(dst: &mut [u8], src: &[u8], offset: usize, available: usize) {
    let end = offset + dst.len();
    if end <= available {
        dst.copy_from_slice(&src[offset..end]);
    }
}

fn trimmed(field: &[u8]) -> &str {
    let end = field
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |i| i + 1);
    core::str::from_utf8(&field[..end]).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack(bytes: &[u8; DEVICE_INFO_WORDS * 4]) -> [u32; DEVICE_INFO_WORDS] {
        let mut words = [0u32; DEVICE_INFO_WORDS];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        words
    }

    fn controller_bytes() -> [u8; DEVICE_INFO_WORDS * 4] {
        let mut bytes = [b' '; DEVICE_INFO_WORDS * 4];
        bytes[..4].copy_from_slice(&0x0000_0001u32.to_be_bytes());
        bytes[4..8].copy_from_slice(&0x000F_06FEu32.to_be_bytes());
        bytes[8..16].fill(0);
        bytes[16] = 0xFF;
        bytes[17] = 0x00;
        let name = b"Dreamcast Controller";
        bytes[NAME_OFFSET..NAME_OFFSET + name.len()].copy_from_slice(name);
        let license = b"Produced By or Under License From SEGA ENTERPRISES,LTD.";
        bytes[LICENSE_OFFSET..LICENSE_OFFSET + license.len()].copy_from_slice(license);
        bytes[POWER_OFFSET..POWER_OFFSET + 2].copy_from_slice(&430u16.to_le_bytes());
        bytes[POWER_OFFSET + 2..POWER_OFFSET + 4].copy_from_slice(&500u16.to_le_bytes());
        bytes
    }

    #[test]
    fn test_decode_controller() {
        let info = DeviceInfo::decode(&pack(&controller_bytes())).unwrap();
        assert!(info.is_controller());
        assert_eq!(info.function_definitions[0], 0x000F_06FE);
        assert_eq!(info.region, 0xFF);
        assert_eq!(info.connector_direction, 0);
        assert_eq!(info.product_name(), "Dreamcast Controller");
        assert!(info.product_license().starts_with("Produced By"));
        assert_eq!(info.standby_power, 430);
        assert_eq!(info.max_power, 500);
    }

    #[test]
    fn test_decode_short_payload() {
        let words = pack(&controller_bytes());
        let info = DeviceInfo::decode(&words[..DEVICE_INFO_MIN_WORDS]).unwrap();
        assert!(info.is_controller());
        assert_eq!(info.product_name(), "");
        assert_eq!(info.max_power, 0);
        assert!(DeviceInfo::decode(&words[..DEVICE_INFO_MIN_WORDS - 1]).is_none());
    }

    #[test]
    fn test_truncated_text_is_blank() {
        let words = pack(&controller_bytes());
        // Name complete, license cut off halfway
        let cut = (LICENSE_OFFSET + PRODUCT_LICENSE_LEN / 2) / 4;
        let info = DeviceInfo::decode(&words[..cut]).unwrap();
        assert_eq!(info.product_name(), "Dreamcast Controller");
        assert_eq!(info.product_license(), "");

        // Name cut off after two bytes
        let info = DeviceInfo::decode(&words[..DEVICE_INFO_MIN_WORDS]).unwrap();
        assert_eq!(info.product_name(), "");
    }

    #[test]
    fn test_non_text_name() {
        let mut bytes = controller_bytes();
        bytes[NAME_OFFSET] = 0xFF;
        let info = DeviceInfo::decode(&pack(&bytes)).unwrap();
        assert_eq!(info.product_name(), "");
    }
}
