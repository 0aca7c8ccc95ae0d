//! Peripheral function codes.

use core::ops::{BitAnd, BitOr, BitOrAssign};

/// Set of functions a peripheral reports in its device info.
///
/// The same codes select the function a condition request targets; a
/// condition response echoes the code in its first payload word.
///
/// # Example
///
/// ```
/// use maple_proto::FunctionCodes;
///
/// let puru_puru_pad = FunctionCodes::CONTROLLER | FunctionCodes::VIBRATION;
/// assert!(puru_puru_pad.contains(FunctionCodes::CONTROLLER));
/// assert!(!puru_puru_pad.contains(FunctionCodes::STORAGE));
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FunctionCodes(pub u32);

impl FunctionCodes {
    pub const CONTROLLER: Self = Self(0x001);
    pub const STORAGE: Self = Self(0x002);
    pub const SCREEN: Self = Self(0x004);
    pub const TIMER: Self = Self(0x008);
    pub const AUDIO_INPUT: Self = Self(0x010);
    pub const AR_GUN: Self = Self(0x020);
    pub const KEYBOARD: Self = Self(0x040);
    pub const GUN: Self = Self(0x080);
    pub const VIBRATION: Self = Self(0x100);
    pub const MOUSE: Self = Self(0x200);

    pub const NONE: Self = Self(0);

    /// Check if all the given function(s) are present.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: FunctionCodes) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Get the raw u32 value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for FunctionCodes {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FunctionCodes {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for FunctionCodes {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains() {
        let codes = FunctionCodes(0x0000_0101);
        assert!(codes.contains(FunctionCodes::CONTROLLER));
        assert!(codes.contains(FunctionCodes::VIBRATION));
        assert!(!codes.contains(FunctionCodes::CONTROLLER | FunctionCodes::STORAGE));
    }

    #[test]
    fn test_storage_and_screen() {
        // Visual memory unit
        let vmu = FunctionCodes(0x0000_000E);
        assert!(vmu.contains(FunctionCodes::STORAGE | FunctionCodes::SCREEN | FunctionCodes::TIMER));
        assert!(!vmu.contains(FunctionCodes::CONTROLLER));
        assert_eq!((vmu & FunctionCodes::CONTROLLER), FunctionCodes::NONE);
    }
}
