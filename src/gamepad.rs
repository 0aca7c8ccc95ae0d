//! [`GamepadHost`] that publishes to a USB output task.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use maple_core::{Axis, Button, DpadDirection, GamepadHost, GamepadState, Side};

/// Latest committed state of one player.
///
/// Signal instead of Channel: the output only ever needs the newest report.
pub type StateSignal = Signal<CriticalSectionRawMutex, GamepadState>;

/// Stages controller input for one player and commits it on `send`.
pub struct UsbGamepad {
    state: GamepadState,
    signal: &'static StateSignal,
}

impl UsbGamepad {
    pub fn new(signal: &'static StateSignal) -> Self {
        Self {
            state: GamepadState::neutral(),
            signal,
        }
    }

    pub fn state(&self) -> &GamepadState {
        &self.state
    }
}

impl GamepadHost for UsbGamepad {
    fn update_controller_connected(&mut self, connected: bool) {
        // Whatever was held belongs to the previous controller
        self.state = GamepadState::neutral();
        self.state.connected = connected;
        self.signal.signal(self.state);
    }

    fn set_button(&mut self, button: Button, pressed: bool) {
        self.state.buttons.set(button, pressed);
    }

    fn set_digital_pad(&mut self, direction: DpadDirection, pressed: bool) {
        self.state.dpad.set(direction, pressed);
    }

    fn set_analog_trigger(&mut self, side: Side, value: i8) {
        self.state.set_trigger(side, value);
    }

    fn set_analog_thumb(&mut self, axis: Axis, side: Side, value: i8) {
        self.state.set_thumb(axis, side, value);
    }

    fn send(&mut self) {
        self.signal.signal(self.state);
    }
}
