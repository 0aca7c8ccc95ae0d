//! Controller poller.
//!
//! Requests condition data from a controller at a fixed interval, forwards
//! whatever changed to the [`GamepadHost`] and gives up on the controller
//! after [`NO_DATA_DISCONNECT_COUNT`](crate::config::NO_DATA_DISCONNECT_COUNT)
//! unanswered requests in a row.
//!
//! ```text
//!            write accepted
//!   Idle ───────────────────────▶ AwaitingResponse
//!    ▲  ◀─────────────────────────   │
//!    │      any new data             │ deadline passed:
//!    └───────────────────────────────┘ miss (+1), or disconnect at 3
//! ```

use maple_proto::condition::{center, ConditionButton, ControllerCondition};
use maple_proto::{Command, FunctionCodes};

use crate::bus::{BusDriver, MapleBus};
use crate::config::{CONTROLLER_POLL_INTERVAL_US, DEFAULT_READ_TIMEOUT_US};
use crate::gamepad::{Axis, Button, DpadDirection, GamepadHost, Side};
use crate::schedule::{PollAction, PollSchedule};

const BUTTON_MAP: [(ConditionButton, Button); 12] = [
    (ConditionButton::A, Button::A),
    (ConditionButton::B, Button::B),
    (ConditionButton::C, Button::C),
    (ConditionButton::X, Button::X),
    (ConditionButton::Y, Button::Y),
    (ConditionButton::Z, Button::Z),
    (ConditionButton::D, Button::Select),
    (ConditionButton::Start, Button::Start),
    (ConditionButton::Up2, Button::Up2),
    (ConditionButton::Down2, Button::Down2),
    (ConditionButton::Left2, Button::Left2),
    (ConditionButton::Right2, Button::Right2),
];

const DPAD_MAP: [(ConditionButton, DpadDirection); 4] = [
    (ConditionButton::Up, DpadDirection::Up),
    (ConditionButton::Down, DpadDirection::Down),
    (ConditionButton::Left, DpadDirection::Left),
    (ConditionButton::Right, DpadDirection::Right),
];

/// Polls one controller and reports its condition.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerPoller {
    recipient: u8,
    condition: ControllerCondition,
    reported: bool,
    schedule: PollSchedule,
}

impl ControllerPoller {
    /// Start polling the controller at `recipient` and announce it.
    pub fn new<G: GamepadHost>(recipient: u8, gamepad: &mut G) -> Self {
        gamepad.update_controller_connected(true);
        Self {
            recipient,
            condition: ControllerCondition::neutral(),
            reported: false,
            schedule: PollSchedule::new(CONTROLLER_POLL_INTERVAL_US),
        }
    }

    /// Handle a validated frame from this controller.
    ///
    /// Any frame counts as a sign of life. Returns `true` if it was
    /// condition data.
    pub fn handle_data<G: GamepadHost>(
        &mut self,
        command: u8,
        payload: &[u32],
        gamepad: &mut G,
    ) -> bool {
        self.schedule.data_received();
        match ControllerCondition::from_response(command, payload) {
            Some(condition) => {
                self.report(condition, gamepad);
                true
            }
            None => {
                trace!("ignored frame {} from controller", command);
                false
            }
        }
    }

    /// Per-tick work. Returns `false` once the controller is considered gone.
    pub fn task<D: BusDriver>(&mut self, now: u64, bus: &mut MapleBus<D>) -> bool {
        match self.schedule.tick(now) {
            PollAction::Wait => true,
            PollAction::Missed => {
                debug!("controller {} missed poll {}", self.recipient, self.schedule.no_data_count());
                true
            }
            PollAction::Disconnected => {
                self.condition = ControllerCondition::neutral();
                self.reported = false;
                false
            }
            PollAction::Poll => {
                let function = [FunctionCodes::CONTROLLER.raw()];
                if bus
                    .write(
                        Command::GetCondition,
                        self.recipient,
                        &function,
                        true,
                        DEFAULT_READ_TIMEOUT_US,
                    )
                    .is_ok()
                {
                    self.schedule.poll_sent(now);
                }
                true
            }
        }
    }

    /// Tell the host the controller is gone.
    pub fn disconnect<G: GamepadHost>(&mut self, gamepad: &mut G) {
        gamepad.update_controller_connected(false);
    }

    #[inline]
    pub fn condition(&self) -> &ControllerCondition {
        &self.condition
    }

    #[inline]
    pub fn recipient(&self) -> u8 {
        self.recipient
    }

    fn report<G: GamepadHost>(&mut self, new: ControllerCondition, gamepad: &mut G) {
        let old = self.condition;
        let full = !self.reported;
        let mut changed = full;

        for (bit, button) in BUTTON_MAP {
            if full || old.is_pressed(bit) != new.is_pressed(bit) {
                gamepad.set_button(button, new.is_pressed(bit));
                changed = true;
            }
        }
        for (bit, direction) in DPAD_MAP {
            if full || old.is_pressed(bit) != new.is_pressed(bit) {
                gamepad.set_digital_pad(direction, new.is_pressed(bit));
                changed = true;
            }
        }

        let analogs = [
            (old.left_trigger, new.left_trigger, None, Side::Left),
            (old.right_trigger, new.right_trigger, None, Side::Right),
            (old.left_x, new.left_x, Some(Axis::X), Side::Left),
            (old.left_y, new.left_y, Some(Axis::Y), Side::Left),
            (old.right_x, new.right_x, Some(Axis::X), Side::Right),
            (old.right_y, new.right_y, Some(Axis::Y), Side::Right),
        ];
        for (before, after, axis, side) in analogs {
            if !full && before == after {
                continue;
            }
            match axis {
                None => gamepad.set_analog_trigger(side, center(after)),
                Some(axis) => gamepad.set_analog_thumb(axis, side, center(after)),
            }
            changed = true;
        }

        self.condition = new;
        self.reported = true;
        if changed {
            gamepad.send();
        }
    }
}
