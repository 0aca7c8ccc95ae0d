//! Peripheral nodes: one per address slot, created once and kept for the
//! lifetime of the bus.
//!
//! A [`MainNode`] sits on the port address of a bus and owns the
//! [`SubNode`]s for the peripherals chained behind it. Each node probes its
//! address with device info requests until something answers, then hands
//! the per-tick work to the detected [`Peripheral`].

mod main_node;
mod peripheral;
mod sub_node;

pub use main_node::MainNode;
pub use peripheral::{PassivePeripheral, Peripheral};
pub use sub_node::SubNode;

use maple_proto::{Command, DeviceInfo};

use crate::bus::{BusDriver, MapleBus};
use crate::config::{DEFAULT_READ_TIMEOUT_US, DEVICE_INFO_PROBE_INTERVAL_US};
use crate::gamepad::GamepadHost;

/// State common to main and sub nodes.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
struct NodeSlot {
    recipient: u8,
    peripheral: Option<Peripheral>,
    next_probe_us: u64,
}

impl NodeSlot {
    const fn new(recipient: u8) -> Self {
        Self {
            recipient,
            peripheral: None,
            next_probe_us: 0,
        }
    }

    fn handle_data<G: GamepadHost>(&mut self, command: u8, payload: &[u32], gamepad: &mut G) -> bool {
        if let Some(peripheral) = &mut self.peripheral {
            return peripheral.handle_data(command, payload, gamepad);
        }
        if command != Command::ResponseDeviceInfo.byte() {
            return false;
        }
        match DeviceInfo::decode(payload) {
            Some(info) => {
                self.peripheral = Some(Peripheral::from_device_info(self.recipient, &info, gamepad));
                true
            }
            None => {
                warn!("short device info from {}: {} words", self.recipient, payload.len());
                false
            }
        }
    }

    fn task<D: BusDriver, G: GamepadHost>(&mut self, now: u64, bus: &mut MapleBus<D>, gamepad: &mut G) {
        match &mut self.peripheral {
            Some(peripheral) => {
                if !peripheral.task(now, bus) {
                    info!("peripheral at {} disconnected", self.recipient);
                    self.clear(gamepad);
                }
            }
            None => {
                if now > self.next_probe_us
                    && bus
                        .write(
                            Command::DeviceInfoRequest,
                            self.recipient,
                            &[],
                            true,
                            DEFAULT_READ_TIMEOUT_US,
                        )
                        .is_ok()
                {
                    self.next_probe_us = now + DEVICE_INFO_PROBE_INTERVAL_US;
                }
            }
        }
    }

    /// Drop the peripheral, if any, and probe again right away.
    fn clear<G: GamepadHost>(&mut self, gamepad: &mut G) {
        if let Some(mut peripheral) = self.peripheral.take() {
            peripheral.disconnect(gamepad);
        }
        self.next_probe_us = 0;
    }

    #[inline]
    fn is_detected(&self) -> bool {
        self.peripheral.is_some()
    }
}
