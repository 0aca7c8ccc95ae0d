//! PIO programs that put frames on the lines and take them off again.
//!
//! Both programs of a bus run on the same PIO block and share its 32
//! instruction slots, so each block carries exactly one copy of each.

use embassy_rp::clocks::clk_sys_freq;
use embassy_rp::pio::{Common, Config, FifoJoin, Instance, LoadedProgram, Pin, ShiftDirection};
use fixed::traits::ToFixed;
use pio::pio_asm;

/// Generator clock. Two phases of six cycles each make one 480 ns slot.
pub const GENERATOR_CLOCK_HZ: u32 = 25_000_000;

/// Programs loaded into one PIO block.
pub struct BusPrograms<'d, P: Instance> {
    generator: LoadedProgram<'d, P>,
    capture: LoadedProgram<'d, P>,
}

impl<'d, P: Instance> BusPrograms<'d, P> {
    /// Load both programs into `common`.
    pub fn load(common: &mut Common<'d, P>) -> Self {
        // Input: slot count - 1, then packed slots (autopull, MSB first).
        // The output latch is left high after every frame so taking the
        // lines never glitches them low.
        let generator = pio_asm!(
            ".wrap_target",
            "pull block",
            "out x, 32",
            "set pindirs, 3",
            "slot:",
            "out pins, 2 [5]",
            "out pins, 2 [3]",
            "jmp x-- slot [1]",
            "set pindirs, 0",
            "irq 0 rel",
            ".wrap"
        );

        // Pin 0 is A, pin 1 is B. Bits are autopushed in bytes; the
        // end sequence (A rising while B is low) raises the IRQ flag.
        let capture = pio_asm!(
            ".wrap_target",
            "start:",
            "mov isr, null",
            "wait 1 pin 0",
            "wait 1 pin 1",
            "wait 0 pin 0",
            "set y, 3",
            "start_pulse:",
            "wait 0 pin 1",
            "wait 1 pin 1",
            "jmp y-- start_pulse",
            "wait 1 pin 0",
            "bit_a:",
            "wait 0 pin 0",
            "mov osr, pins",
            "out null, 1",
            "in osr, 1",
            "a_low:",
            "mov osr, pins",
            "out y, 1",
            "out x, 1",
            "jmp x-- bit_b",
            "jmp !y a_low",
            "irq 0 rel",
            "jmp start",
            "bit_b:",
            "wait 0 pin 1",
            "in pins, 1",
            "wait 1 pin 0",
            "jmp bit_a",
            ".wrap"
        );

        Self {
            generator: common.load_program(&generator.program),
            capture: common.load_program(&capture.program),
        }
    }

    /// Generator config driving `a` and `b`; `b` must be the pin after `a`.
    pub fn generator_config(&self, a: &Pin<'d, P>, b: &Pin<'d, P>) -> Config<'d, P> {
        let mut cfg = Config::default();
        cfg.use_program(&self.generator, &[]);
        cfg.set_out_pins(&[a, b]);
        cfg.set_set_pins(&[a, b]);
        cfg.clock_divider = (clk_sys_freq() / GENERATOR_CLOCK_HZ).to_fixed();
        cfg.shift_out.auto_fill = true;
        cfg.shift_out.threshold = 32;
        cfg.shift_out.direction = ShiftDirection::Left;
        cfg.fifo_join = FifoJoin::TxOnly;
        cfg
    }

    /// Capture config sampling from `a` (and the pin after it).
    pub fn capture_config(&self, a: &Pin<'d, P>) -> Config<'d, P> {
        let mut cfg = Config::default();
        cfg.use_program(&self.capture, &[]);
        cfg.set_in_pins(&[a]);
        cfg.clock_divider = 1u16.to_fixed();
        cfg.shift_in.auto_fill = true;
        cfg.shift_in.threshold = 8;
        cfg.shift_in.direction = ShiftDirection::Left;
        // `out` is only used to split a pin sample, A first
        cfg.shift_out.direction = ShiftDirection::Right;
        cfg.fifo_join = FifoJoin::RxOnly;
        cfg
    }
}
