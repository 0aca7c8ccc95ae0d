//! Node for the peripheral plugged directly into a port.

use maple_proto::frame::FrameHeader;
use maple_proto::{sub_peripheral_mask, Address, MAX_SUB_PERIPHERALS};

use super::{NodeSlot, Peripheral, SubNode};
use crate::bus::{BusDriver, MapleBus};
use crate::gamepad::GamepadHost;

/// The main node of one bus and its sub-nodes.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MainNode {
    player: u8,
    slot: NodeSlot,
    subs: [SubNode; MAX_SUB_PERIPHERALS],
}

impl MainNode {
    pub const fn new(player: u8) -> Self {
        Self {
            player,
            slot: NodeSlot::new(Address::main(player).raw()),
            subs: [
                SubNode::new(player, 0),
                SubNode::new(player, 1),
                SubNode::new(player, 2),
                SubNode::new(player, 3),
                SubNode::new(player, 4),
            ],
        }
    }

    /// Route a validated frame by its sender address.
    pub fn handle_data<G: GamepadHost>(
        &mut self,
        header: FrameHeader,
        payload: &[u32],
        gamepad: &mut G,
    ) -> bool {
        let sender = Address(header.sender);
        if sender.is_main() {
            let handled = self.slot.handle_data(header.command, payload, gamepad);
            if self.slot.is_detected() {
                let attached = sender.sub_peripherals();
                for (i, sub) in self.subs.iter_mut().enumerate() {
                    sub.set_connected(attached & sub_peripheral_mask(i) != 0, gamepad);
                }
            }
            handled
        } else if let Some(index) = sender.sub_index() {
            self.subs[index].handle_data(header.command, payload, gamepad)
        } else {
            trace!("frame from unexpected sender {}", header.sender);
            false
        }
    }

    /// One scheduling tick: dispatch new data, then run every node.
    pub fn task<D: BusDriver, G: GamepadHost>(
        &mut self,
        now: u64,
        bus: &mut MapleBus<D>,
        gamepad: &mut G,
    ) {
        let data = bus.read_data();
        if data.is_new {
            if let Some(header) = data.header() {
                self.handle_data(header, data.payload(), gamepad);
            }
        }

        let was_detected = self.slot.is_detected();
        self.slot.task(now, bus, gamepad);
        if was_detected && !self.slot.is_detected() {
            self.main_peripheral_disconnected(gamepad);
        }

        for sub in &mut self.subs {
            sub.task(now, bus, gamepad);
        }
    }

    fn main_peripheral_disconnected<G: GamepadHost>(&mut self, gamepad: &mut G) {
        for sub in &mut self.subs {
            sub.main_peripheral_disconnected(gamepad);
        }
    }

    #[inline]
    pub fn player(&self) -> u8 {
        self.player
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        self.slot.is_detected()
    }

    #[inline]
    pub fn peripheral(&self) -> Option<&Peripheral> {
        self.slot.peripheral.as_ref()
    }

    #[inline]
    pub fn sub_nodes(&self) -> &[SubNode; MAX_SUB_PERIPHERALS] {
        &self.subs
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::bus::tests::{new_bus, response, MockDriver};
    use crate::controller::tests::{Event, RecordingGamepad};
    use std::vec::Vec;

    const CONTROLLER_INFO: [u32; 5] = [0x0000_0001, 0x000F_06FE, 0, 0, 0xFF00_0000];
    const VMU_INFO: [u32; 5] = [0x0000_000E, 0x7E7E_3F40, 0x0004_1000, 0x0010_00FF, 0xFF00_0000];

    /// Complete the write in flight and answer it with `reply`.
    fn answer(bus: &mut MapleBus<MockDriver>, now: u64, reply: &[u8]) {
        assert!(!bus.tx_waveform().is_empty(), "nothing was sent");
        bus.write_complete(now);
        bus.read_started(now);
        assert!(bus.read_complete(reply));
    }

    /// Complete the write in flight, if any, and let it go unanswered.
    fn ignore(bus: &mut MapleBus<MockDriver>, now: u64) {
        if !bus.tx_waveform().is_empty() {
            bus.write_complete(now);
        }
        bus.process_events(now + 10_000);
    }

    fn detect_controller(
        node: &mut MainNode,
        bus: &mut MapleBus<MockDriver>,
        gamepad: &mut RecordingGamepad,
        sub_mask: u8,
    ) {
        node.task(1_000, bus, gamepad);
        answer(bus, 1_000, &response(0x05, 0x20 | sub_mask, &CONTROLLER_INFO));
        node.task(1_100, bus, gamepad);
    }

    #[test]
    fn test_probes_empty_port() {
        let mut node = MainNode::new(0);
        let mut bus = new_bus();
        let mut gamepad = RecordingGamepad::default();

        node.task(1_000, &mut bus, &mut gamepad);
        assert_eq!(bus.driver().writes.len(), 1);
        ignore(&mut bus, 1_000);

        // Next probe only after the probe interval
        node.task(12_000, &mut bus, &mut gamepad);
        assert_eq!(bus.driver().writes.len(), 1);
        node.task(17_001, &mut bus, &mut gamepad);
        assert_eq!(bus.driver().writes.len(), 2);
        assert!(!node.is_connected());
        assert!(gamepad.events.is_empty());
    }

    #[test]
    fn test_device_info_creates_controller() {
        let mut node = MainNode::new(0);
        let mut bus = new_bus();
        let mut gamepad = RecordingGamepad::default();

        detect_controller(&mut node, &mut bus, &mut gamepad, 0);
        assert!(node.is_connected());
        assert!(node.peripheral().is_some_and(Peripheral::is_controller));
        assert_eq!(gamepad.events, [Event::Connected(true)]);
        // The controller polls right away
        assert_eq!(bus.driver().writes.len(), 2);
    }

    #[test]
    fn test_non_controller_is_passive() {
        let mut node = MainNode::new(1);
        let mut bus = new_bus();
        let mut gamepad = RecordingGamepad::default();

        node.task(1_000, &mut bus, &mut gamepad);
        answer(&mut bus, 1_000, &response(0x05, 0x60, &VMU_INFO));
        node.task(1_100, &mut bus, &mut gamepad);
        match node.peripheral() {
            Some(Peripheral::Passive(passive)) => {
                assert!(passive.functions().contains(maple_proto::FunctionCodes::STORAGE));
            }
            other => panic!("unexpected peripheral {:?}", other),
        }
        assert!(gamepad.events.is_empty());
    }

    #[test]
    fn test_sub_mask_drives_sub_presence() {
        let mut node = MainNode::new(0);
        let mut bus = new_bus();
        let mut gamepad = RecordingGamepad::default();

        detect_controller(&mut node, &mut bus, &mut gamepad, 0b0_0011);
        let present: Vec<bool> = node.sub_nodes().iter().map(SubNode::is_connected).collect();
        assert_eq!(present, [true, true, false, false, false]);

        // Condition response without the second sub-peripheral
        answer(&mut bus, 1_100, &response(0x08, 0x21, &[1, 0xFFFF, 0x8080_8080]));
        node.task(1_200, &mut bus, &mut gamepad);
        let present: Vec<bool> = node.sub_nodes().iter().map(SubNode::is_connected).collect();
        assert_eq!(present, [true, false, false, false, false]);
    }

    #[test]
    fn test_sub_node_probes_its_own_address() {
        let mut node = MainNode::new(2);
        let mut bus = new_bus();
        let mut gamepad = RecordingGamepad::default();

        node.task(1_000, &mut bus, &mut gamepad);
        answer(&mut bus, 1_000, &response(0x05, 0xA0 | 0x01, &VMU_INFO));
        // Main node polls first; the sub-node gets the bus once it is free
        node.task(1_100, &mut bus, &mut gamepad);
        ignore(&mut bus, 1_100);
        node.task(20_000, &mut bus, &mut gamepad);

        let (last, _) = bus.driver().writes.last().unwrap().clone();
        let mut frame = [0u8; 8];
        let len = maple_proto::encode_frame(0x01, 0x00, 0x81, &[], &mut frame).unwrap();
        let mut expected = [0u32; 16];
        let words = maple_proto::encode_waveform(&frame[..len], &mut expected).unwrap();
        assert_eq!(last, &expected[..words]);

        answer(&mut bus, 20_000, &response(0x05, 0x81, &VMU_INFO));
        node.task(20_100, &mut bus, &mut gamepad);
        assert!(node.sub_nodes()[0].peripheral().is_some());
    }

    #[test]
    fn test_main_disconnect_cascades_to_subs() {
        let mut node = MainNode::new(0);
        let mut bus = new_bus();
        let mut gamepad = RecordingGamepad::default();

        detect_controller(&mut node, &mut bus, &mut gamepad, 0b1_0101);
        assert!(node.sub_nodes()[2].is_connected());

        let mut now = 1_100;
        while node.is_connected() {
            ignore(&mut bus, now);
            now += 1_000;
            node.task(now, &mut bus, &mut gamepad);
            assert!(now < 200_000, "controller never dropped");
        }

        assert!(node.sub_nodes().iter().all(|sub| !sub.is_connected()));
        assert!(node.sub_nodes().iter().all(|sub| sub.peripheral().is_none()));
        assert_eq!(gamepad.events.last(), Some(&Event::Connected(false)));
    }

    #[test]
    fn test_sub_controller_leaves_port_gamepad_alone() {
        let mut node = MainNode::new(0);
        let mut bus = new_bus();
        let mut gamepad = RecordingGamepad::default();
        let condition = [1, 0xFFFF, 0x8080_8080];

        detect_controller(&mut node, &mut bus, &mut gamepad, 0b0_0001);
        answer(&mut bus, 1_100, &response(0x08, 0x21, &condition));
        // Main controller waits for its next poll; the sub-node asks for device info
        node.task(2_000, &mut bus, &mut gamepad);
        answer(&mut bus, 2_000, &response(0x05, 0x01, &CONTROLLER_INFO));
        node.task(2_100, &mut bus, &mut gamepad);
        assert!(matches!(
            node.sub_nodes()[0].peripheral(),
            Some(Peripheral::Passive(_))
        ));

        // Sub-peripheral unplugged while the main controller stays
        let header = FrameHeader::new(0x08, 0x00, 0x20, condition.len() as u8);
        assert!(node.handle_data(header, &condition, &mut gamepad));
        assert!(!node.sub_nodes()[0].is_connected());
        assert!(node.is_connected());
        assert_eq!(
            gamepad.events.iter().filter(|e| matches!(e, Event::Connected(_))).count(),
            1
        );
        assert!(!gamepad.events.contains(&Event::Connected(false)));
    }

    #[test]
    fn test_sub_frames_ignored_while_detached() {
        let mut node = MainNode::new(0);
        let mut gamepad = RecordingGamepad::default();
        let header = FrameHeader::new(0x05, 0x00, 0x02, VMU_INFO.len() as u8);
        assert!(!node.handle_data(header, &VMU_INFO, &mut gamepad));
        assert!(node.sub_nodes()[1].peripheral().is_none());
    }
}
