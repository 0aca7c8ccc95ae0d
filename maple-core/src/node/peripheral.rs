//! Behaviours a detected peripheral can have.

use maple_proto::{Address, Command, DeviceInfo, FunctionCodes};

use crate::bus::{BusDriver, MapleBus};
use crate::config::{DEFAULT_READ_TIMEOUT_US, DEVICE_INFO_PROBE_INTERVAL_US};
use crate::controller::ControllerPoller;
use crate::gamepad::GamepadHost;
use crate::schedule::{PollAction, PollSchedule};

/// A detected peripheral.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Peripheral {
    /// Reports condition data to the gamepad host.
    Controller(ControllerPoller),
    /// Anything else; only its presence is tracked.
    Passive(PassivePeripheral),
}

impl Peripheral {
    /// Pick a behaviour from the functions a peripheral reports.
    ///
    /// A port has one gamepad, owned by its main peripheral. Controllers
    /// answering on a sub-peripheral address are only tracked.
    pub fn from_device_info<G: GamepadHost>(
        recipient: u8,
        info: &DeviceInfo,
        gamepad: &mut G,
    ) -> Self {
        if info.is_controller() && Address(recipient).is_main() {
            info!("controller at {}: {}", recipient, info.product_name());
            Self::Controller(ControllerPoller::new(recipient, gamepad))
        } else {
            info!(
                "peripheral at {} with functions {:?}: {}",
                recipient,
                info.functions,
                info.product_name()
            );
            Self::Passive(PassivePeripheral::new(recipient, info.functions))
        }
    }

    pub fn handle_data<G: GamepadHost>(
        &mut self,
        command: u8,
        payload: &[u32],
        gamepad: &mut G,
    ) -> bool {
        match self {
            Self::Controller(controller) => controller.handle_data(command, payload, gamepad),
            Self::Passive(passive) => passive.handle_data(command),
        }
    }

    /// Returns `false` once the peripheral is considered gone.
    pub fn task<D: BusDriver>(&mut self, now: u64, bus: &mut MapleBus<D>) -> bool {
        match self {
            Self::Controller(controller) => controller.task(now, bus),
            Self::Passive(passive) => passive.task(now, bus),
        }
    }

    /// Release whatever the peripheral announced to the host.
    pub fn disconnect<G: GamepadHost>(&mut self, gamepad: &mut G) {
        if let Self::Controller(controller) = self {
            controller.disconnect(gamepad);
        }
    }

    pub fn is_controller(&self) -> bool {
        matches!(self, Self::Controller(_))
    }
}

/// Keeps track of a peripheral by re-requesting its device info.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PassivePeripheral {
    recipient: u8,
    functions: FunctionCodes,
    schedule: PollSchedule,
}

impl PassivePeripheral {
    pub fn new(recipient: u8, functions: FunctionCodes) -> Self {
        Self {
            recipient,
            functions,
            schedule: PollSchedule::new(DEVICE_INFO_PROBE_INTERVAL_US),
        }
    }

    pub fn handle_data(&mut self, command: u8) -> bool {
        self.schedule.data_received();
        command == Command::ResponseDeviceInfo.byte()
    }

    pub fn task<D: BusDriver>(&mut self, now: u64, bus: &mut MapleBus<D>) -> bool {
        match self.schedule.tick(now) {
            PollAction::Wait | PollAction::Missed => true,
            PollAction::Disconnected => false,
            PollAction::Poll => {
                if bus
                    .write(
                        Command::DeviceInfoRequest,
                        self.recipient,
                        &[],
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

    #[inline]
    pub fn functions(&self) -> FunctionCodes {
        self.functions
    }
}
