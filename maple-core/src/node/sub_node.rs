//! Node for a peripheral chained behind a main peripheral.

use maple_proto::Address;

use super::{NodeSlot, Peripheral};
use crate::bus::{BusDriver, MapleBus};
use crate::gamepad::GamepadHost;

/// One sub-peripheral slot of a main node.
///
/// Whether anything is plugged into the slot is decided by the main
/// peripheral, which reports its attached sub-peripherals in every response.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SubNode {
    slot: NodeSlot,
    connected: bool,
}

impl SubNode {
    pub const fn new(player: u8, index: usize) -> Self {
        Self {
            slot: NodeSlot::new(Address::sub(player, index).raw()),
            connected: false,
        }
    }

    /// Handle a validated frame from this slot's address.
    pub fn handle_data<G: GamepadHost>(
        &mut self,
        command: u8,
        payload: &[u32],
        gamepad: &mut G,
    ) -> bool {
        self.connected && self.slot.handle_data(command, payload, gamepad)
    }

    /// Per-tick work: probe while attached, else run the peripheral.
    pub fn task<D: BusDriver, G: GamepadHost>(
        &mut self,
        now: u64,
        bus: &mut MapleBus<D>,
        gamepad: &mut G,
    ) {
        if self.connected {
            self.slot.task(now, bus, gamepad);
        }
    }

    /// The main peripheral went away; nothing can stay attached to it.
    pub fn main_peripheral_disconnected<G: GamepadHost>(&mut self, gamepad: &mut G) {
        self.set_connected(false, gamepad);
    }

    /// Update presence as reported by the main peripheral.
    pub fn set_connected<G: GamepadHost>(&mut self, connected: bool, gamepad: &mut G) {
        if self.connected == connected {
            return;
        }
        debug!("sub-peripheral {} attached: {}", self.slot.recipient, connected);
        self.connected = connected;
        if !connected {
            self.slot.clear(gamepad);
        }
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    #[inline]
    pub fn recipient(&self) -> u8 {
        self.slot.recipient
    }

    #[inline]
    pub fn peripheral(&self) -> Option<&Peripheral> {
        self.slot.peripheral.as_ref()
    }
}
