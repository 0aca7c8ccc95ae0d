//! Controller condition decoding.
//!
//! A condition response to a controller function request carries the
//! function code followed by two condition words:
//!
//! ```text
//! word 0: bits 0..15  buttons, active low
//!         bits 16..23 right trigger
//!         bits 24..31 left trigger
//! word 1: bits 0..7   left stick X
//!         bits 8..15  left stick Y
//!         bits 16..23 right stick X
//!         bits 24..31 right stick Y
//! ```
//!
//! Analog values are unsigned with 128 at rest.

use crate::command::Command;
use crate::function::FunctionCodes;

/// Payload words in a controller condition response (function code + 2).
pub const CONDITION_PAYLOAD_WORDS: usize = 3;

/// Analog value reported at rest.
pub const ANALOG_CENTER: u8 = 128;

/// Digital inputs of the condition word, by bit position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ConditionButton {
    C = 0,
    B = 1,
    A = 2,
    Start = 3,
    Up = 4,
    Down = 5,
    Left = 6,
    Right = 7,
    Z = 8,
    Y = 9,
    X = 10,
    D = 11,
    Up2 = 12,
    Down2 = 13,
    Left2 = 14,
    Right2 = 15,
}

impl ConditionButton {
    pub const ALL: [Self; 16] = [
        Self::C,
        Self::B,
        Self::A,
        Self::Start,
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
        Self::Z,
        Self::Y,
        Self::X,
        Self::D,
        Self::Up2,
        Self::Down2,
        Self::Left2,
        Self::Right2,
    ];

    #[inline]
    #[must_use]
    pub const fn mask(self) -> u16 {
        1 << self as u8
    }
}

/// Center an analog byte around zero.
///
/// 0 maps to -128 and 255 maps to 127; no clamping or rescaling.
#[inline]
#[must_use]
pub const fn center(value: u8) -> i8 {
    (value as i16 - ANALOG_CENTER as i16) as i8
}

/// Decoded controller condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerCondition {
    /// Button bits as on the wire (0 = pressed).
    pub buttons: u16,
    pub left_trigger: u8,
    pub right_trigger: u8,
    pub left_x: u8,
    pub left_y: u8,
    pub right_x: u8,
    pub right_y: u8,
}

impl Default for ControllerCondition {
    fn default() -> Self {
        Self::neutral()
    }
}

impl ControllerCondition {
    /// All buttons released, triggers at rest, sticks centered.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            buttons: 0xFFFF,
            left_trigger: 0,
            right_trigger: 0,
            left_x: ANALOG_CENTER,
            left_y: ANALOG_CENTER,
            right_x: ANALOG_CENTER,
            right_y: ANALOG_CENTER,
        }
    }

    /// Decode the two condition words.
    #[must_use]
    pub const fn from_words(word0: u32, word1: u32) -> Self {
        Self {
            buttons: word0 as u16,
            right_trigger: (word0 >> 16) as u8,
            left_trigger: (word0 >> 24) as u8,
            left_x: word1 as u8,
            left_y: (word1 >> 8) as u8,
            right_x: (word1 >> 16) as u8,
            right_y: (word1 >> 24) as u8,
        }
    }

    /// Decode a response frame if it is controller condition data.
    ///
    /// Anything other than a data transfer response carrying the controller
    /// function code and both condition words is rejected.
    #[must_use]
    pub fn from_response(command: u8, payload: &[u32]) -> Option<Self> {
        if command != Command::ResponseDataXfer.byte()
            || payload.len() < CONDITION_PAYLOAD_WORDS
            || payload[0] != FunctionCodes::CONTROLLER.raw()
        {
            return None;
        }
        Some(Self::from_words(payload[1], payload[2]))
    }

    #[inline]
    #[must_use]
    pub const fn is_pressed(&self, button: ConditionButton) -> bool {
        self.buttons & button.mask() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_active_decode() {
        // Buttons all pressed, triggers and sticks at 128
        let cond = ControllerCondition::from_words(0x8080_0000, 0x8080_8080);
        for button in ConditionButton::ALL {
            assert!(cond.is_pressed(button));
        }
        assert_eq!(center(cond.left_trigger), 0);
        assert_eq!(center(cond.right_trigger), 0);
        assert_eq!(center(cond.left_x), 0);
        assert_eq!(center(cond.left_y), 0);
        assert_eq!(center(cond.right_x), 0);
        assert_eq!(center(cond.right_y), 0);
    }

    #[test]
    fn test_neutral_releases_everything() {
        let cond = ControllerCondition::neutral();
        for button in ConditionButton::ALL {
            assert!(!cond.is_pressed(button));
        }
        assert_eq!(ControllerCondition::default(), cond);
    }

    #[test]
    fn test_field_positions() {
        let cond = ControllerCondition::from_words(0x12_34_FFFB, 0x44_33_22_11);
        assert!(cond.is_pressed(ConditionButton::A));
        assert!(!cond.is_pressed(ConditionButton::B));
        assert_eq!(cond.left_trigger, 0x12);
        assert_eq!(cond.right_trigger, 0x34);
        assert_eq!(cond.left_x, 0x11);
        assert_eq!(cond.left_y, 0x22);
        assert_eq!(cond.right_x, 0x33);
        assert_eq!(cond.right_y, 0x44);
    }

    #[test]
    fn test_center_is_asymmetric() {
        assert_eq!(center(0), -128);
        assert_eq!(center(255), 127);
        assert_eq!(center(128), 0);
    }

    #[test]
    fn test_from_response_shape() {
        let payload = [0x0000_0001, 0x0000_FFFF, 0x8080_8080];
        assert!(ControllerCondition::from_response(0x08, &payload).is_some());
        // Wrong command
        assert!(ControllerCondition::from_response(0x05, &payload).is_none());
        // Wrong function
        assert!(ControllerCondition::from_response(0x08, &[0x0000_0002, 0, 0]).is_none());
        // Too short
        assert!(ControllerCondition::from_response(0x08, &payload[..2]).is_none());
    }
}
