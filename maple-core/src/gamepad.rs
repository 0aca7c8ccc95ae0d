//! Input-device collaborator: the trait the poller reports into, and the
//! staged state model used to build outgoing reports.

use core::ops::{BitOr, BitOrAssign};

/// Host-side button slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Button {
    A = 0,
    B = 1,
    C = 2,
    X = 3,
    Y = 4,
    Z = 5,
    Select = 10,
    Start = 11,
    /// Second directional pad, reported as plain buttons.
    Up2 = 12,
    Down2 = 13,
    Left2 = 14,
    Right2 = 15,
}

impl Button {
    /// Button index in the outgoing report.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DpadDirection {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    X,
    Y,
}

/// Receiver of decoded controller state.
///
/// Setters stage values; [`GamepadHost::send`] commits everything staged
/// as one report.
pub trait GamepadHost {
    /// A controller was attached to or removed from this player slot.
    fn update_controller_connected(&mut self, connected: bool);

    fn set_button(&mut self, button: Button, pressed: bool);

    fn set_digital_pad(&mut self, direction: DpadDirection, pressed: bool);

    /// Trigger value, centered on zero.
    fn set_analog_trigger(&mut self, side: Side, value: i8);

    /// Stick axis value, centered on zero.
    fn set_analog_thumb(&mut self, axis: Axis, side: Side, value: i8);

    /// Commit the staged state.
    fn send(&mut self);
}

/// Button state bitfield, one bit per report button index.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Buttons(pub u16);

impl Buttons {
    pub const NONE: Self = Self(0);

    #[inline]
    #[must_use]
    pub const fn of(button: Button) -> Self {
        Self(1 << button.index())
    }

    #[inline]
    #[must_use]
    pub const fn contains(self, other: Buttons) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    #[must_use]
    pub const fn is_pressed(self, button: Button) -> bool {
        self.contains(Self::of(button))
    }

    #[inline]
    pub fn set(&mut self, button: Button, pressed: bool) {
        let mask = Self::of(button).0;
        if pressed {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl BitOr for Buttons {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Buttons {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// D-pad state as four independent directions.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Dpad {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

/// Hat switch value for "no direction".
pub const HAT_CENTERED: u8 = 8;

impl Dpad {
    pub fn set(&mut self, direction: DpadDirection, pressed: bool) {
        match direction {
            DpadDirection::Up => self.up = pressed,
            DpadDirection::Down => self.down = pressed,
            DpadDirection::Left => self.left = pressed,
            DpadDirection::Right => self.right = pressed,
        }
    }

    /// Convert to an 8-way hat value (0 = up, clockwise, 8 = centered).
    ///
    /// Opposing directions cancel out.
    #[must_use]
    pub const fn hat(self) -> u8 {
        let vertical = self.up as i8 - self.down as i8;
        let horizontal = self.right as i8 - self.left as i8;
        match (vertical, horizontal) {
            (1, 0) => 0,
            (1, 1) => 1,
            (0, 1) => 2,
            (-1, 1) => 3,
            (-1, 0) => 4,
            (-1, -1) => 5,
            (0, -1) => 6,
            (1, -1) => 7,
            _ => HAT_CENTERED,
        }
    }
}

/// Complete staged gamepad state for one player.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GamepadState {
    pub connected: bool,
    pub buttons: Buttons,
    pub dpad: Dpad,
    pub left_x: i8,
    pub left_y: i8,
    pub right_x: i8,
    pub right_y: i8,
    pub left_trigger: i8,
    pub right_trigger: i8,
}

impl GamepadState {
    /// Nothing pressed, everything centered.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            connected: false,
            buttons: Buttons::NONE,
            dpad: Dpad {
                up: false,
                down: false,
                left: false,
                right: false,
            },
            left_x: 0,
            left_y: 0,
            right_x: 0,
            right_y: 0,
            left_trigger: 0,
            right_trigger: 0,
        }
    }

    pub fn set_trigger(&mut self, side: Side, value: i8) {
        match side {
            Side::Left => self.left_trigger = value,
            Side::Right => self.right_trigger = value,
        }
    }

    pub fn set_thumb(&mut self, axis: Axis, side: Side, value: i8) {
        match (side, axis) {
            (Side::Left, Axis::X) => self.left_x = value,
            (Side::Left, Axis::Y) => self.left_y = value,
            (Side::Right, Axis::X) => self.right_x = value,
            (Side::Right, Axis::Y) => self.right_y = value,
        }
    }
}
