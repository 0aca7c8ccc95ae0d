//! Bus addressing.
//!
//! An address byte is laid out as:
//!
//! ```text
//!  7   6   5   4   3   2   1   0
//! [player][M ][    sub mask      ]
//! ```
//!
//! - bits 7..6: player (port) index, 0-3
//! - bit 5: set for the main peripheral plugged directly into the port
//! - bits 4..0: one-hot mask selecting one of up to 5 chained sub-peripherals
//!
//! The host itself uses an address with only the player bits set.

/// The maximum number of sub-peripherals a main peripheral can handle.
pub const MAX_SUB_PERIPHERALS: usize = 5;

/// Main peripheral address bit.
pub const MAIN_PERIPHERAL_ADDR_MASK: u8 = 0x20;

/// The first sub-peripheral address bit.
pub const SUB_PERIPHERAL_ADDR_START_MASK: u8 = 0x01;

/// All sub-peripheral address bits.
pub const SUB_PERIPHERAL_ADDR_MASK: u8 = 0x1F;

/// Number of player (port) indices an address can encode.
pub const MAX_PLAYERS: u8 = 4;

const PLAYER_SHIFT: u8 = 6;

/// Sub-peripheral mask for the given sub-peripheral index [0, 4].
#[inline]
#[must_use]
pub const fn sub_peripheral_mask(index: usize) -> u8 {
    SUB_PERIPHERAL_ADDR_START_MASK << index
}

/// Index of the first sub-peripheral bit set in `mask`, if any.
#[must_use]
pub const fn sub_peripheral_index(mask: u8) -> Option<usize> {
    let mut i = 0;
    while i < MAX_SUB_PERIPHERALS {
        if mask & sub_peripheral_mask(i) != 0 {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Recipient address of a peripheral with the given player index and
/// peripheral bit(s).
#[inline]
#[must_use]
pub const fn recipient_address(player: u8, addr: u8) -> u8 {
    (player << PLAYER_SHIFT) | addr
}

/// Address the host uses when talking on the given player's bus.
#[inline]
#[must_use]
pub const fn host_address(player: u8) -> u8 {
    player << PLAYER_SHIFT
}

/// Structured view of an address byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Address(pub u8);

impl Address {
    /// Address of the main peripheral on the given player's port.
    #[must_use]
    pub const fn main(player: u8) -> Self {
        Self(recipient_address(player, MAIN_PERIPHERAL_ADDR_MASK))
    }

    /// Address of a sub-peripheral on the given player's port.
    #[must_use]
    pub const fn sub(player: u8, index: usize) -> Self {
        Self(recipient_address(player, sub_peripheral_mask(index)))
    }

    /// Player (port) index.
    #[inline]
    #[must_use]
    pub const fn player(self) -> u8 {
        self.0 >> PLAYER_SHIFT
    }

    /// True if the main peripheral bit is set.
    #[inline]
    #[must_use]
    pub const fn is_main(self) -> bool {
        self.0 & MAIN_PERIPHERAL_ADDR_MASK != 0
    }

    /// Sub-peripheral bits.
    ///
    /// For a main peripheral's response this is the set of attached
    /// sub-peripherals; for a sub-peripheral it selects the slot.
    #[inline]
    #[must_use]
    pub const fn sub_peripherals(self) -> u8 {
        self.0 & SUB_PERIPHERAL_ADDR_MASK
    }

    /// Slot index of a sub-peripheral address.
    ///
    /// Returns `None` for main peripheral and host addresses.
    #[must_use]
    pub const fn sub_index(self) -> Option<usize> {
        if self.is_main() {
            None
        } else {
            sub_peripheral_index(self.sub_peripherals())
        }
    }

    /// The raw address byte.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_peripheral_round_trip() {
        for player in 0..MAX_PLAYERS {
            for index in 0..MAX_SUB_PERIPHERALS {
                let addr = recipient_address(player, sub_peripheral_mask(index));
                let view = Address(addr);
                assert_eq!(view.player(), player);
                assert_eq!(sub_peripheral_index(addr & SUB_PERIPHERAL_ADDR_MASK), Some(index));
                assert_eq!(view.sub_index(), Some(index));
                assert!(!view.is_main());
            }
        }
    }

    #[test]
    fn test_main_address() {
        let addr = Address::main(2);
        assert_eq!(addr.raw(), 0xA0);
        assert_eq!(addr.player(), 2);
        assert!(addr.is_main());
        assert_eq!(addr.sub_index(), None);
    }

    #[test]
    fn test_main_and_sub_never_overlap() {
        for player in 0..MAX_PLAYERS {
            let main = Address::main(player);
            for index in 0..MAX_SUB_PERIPHERALS {
                assert_ne!(main, Address::sub(player, index));
            }
        }
    }

    #[test]
    fn test_main_response_carries_sub_mask() {
        // Main peripheral on port 1 reporting sub-peripherals 0 and 1 attached
        let addr = Address(0x40 | 0x20 | 0x03);
        assert!(addr.is_main());
        assert_eq!(addr.sub_peripherals(), 0x03);
    }

    #[test]
    fn test_index_of_empty_mask() {
        assert_eq!(sub_peripheral_index(0), None);
        assert_eq!(Address(host_address(3)).sub_index(), None);
    }

    #[test]
    fn test_first_bit_wins() {
        assert_eq!(sub_peripheral_index(0b0_0110), Some(1));
    }
}
