//! PIO, DMA and IRQ plumbing of one bus.

use embassy_futures::poll_once;
use embassy_futures::select::{select, Either};
use embassy_rp::dma::Channel;
use embassy_rp::gpio::{Level, Pull};
use embassy_rp::pio::{Common, Config, Direction, Instance, Irq, Pin, PioPin, StateMachine};
use embassy_rp::Peri;
use embassy_time::Instant;
use maple_proto::frame::MAX_FRAME_BYTES;
use maple_proto::waveform::MAX_WAVEFORM_WORDS;

use super::{BusLink, BusPrograms, SharedBus};

/// Generator and capture state machines of one bus.
///
/// `G` and `C` are the state machine indices; each program raises the IRQ
/// flag of its own state machine.
pub struct BusHardware<'d, P: Instance, D: Channel, const G: usize, const C: usize> {
    generator: StateMachine<'d, P, G>,
    capture: StateMachine<'d, P, C>,
    tx_done: Irq<'d, P, G>,
    rx_done: Irq<'d, P, C>,
    dma: Peri<'d, D>,
    line_a: Pin<'d, P>,
    line_b: Pin<'d, P>,
    generator_config: Config<'d, P>,
    capture_config: Config<'d, P>,
}

impl<'d, P: Instance, D: Channel, const G: usize, const C: usize> BusHardware<'d, P, D, G, C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        common: &mut Common<'d, P>,
        programs: &BusPrograms<'d, P>,
        generator: StateMachine<'d, P, G>,
        capture: StateMachine<'d, P, C>,
        tx_done: Irq<'d, P, G>,
        rx_done: Irq<'d, P, C>,
        a: Peri<'d, impl PioPin + 'd>,
        b: Peri<'d, impl PioPin + 'd>,
        dma: Peri<'d, D>,
    ) -> Self {
        let mut line_a = common.make_pio_pin(a);
        let mut line_b = common.make_pio_pin(b);
        line_a.set_pull(Pull::Up);
        line_b.set_pull(Pull::Up);
        debug_assert_eq!(line_b.pin(), line_a.pin() + 1, "B must follow A");

        let generator_config = programs.generator_config(&line_a, &line_b);
        let capture_config = programs.capture_config(&line_a);

        let mut hardware = Self {
            generator,
            capture,
            tx_done,
            rx_done,
            dma,
            line_a,
            line_b,
            generator_config,
            capture_config,
        };
        hardware.generator.set_config(&hardware.generator_config);
        hardware.capture.set_config(&hardware.capture_config);
        hardware.release_lines();
        hardware
    }

    /// GPIO bits of both lines.
    pub fn line_mask(&self) -> u32 {
        (1 << self.line_a.pin()) | (1 << self.line_b.pin())
    }

    /// Serve transfers requested through `link` until the end of time.
    pub async fn run(&mut self, bus: &SharedBus, link: &BusLink) -> ! {
        let mut tx = [0u32; MAX_WAVEFORM_WORDS];
        let mut rx = [0u8; MAX_FRAME_BYTES];

        loop {
            let request = link.request.wait().await;

            let words = bus.lock(|cell| {
                // Anything cancelled so far belonged to an older transfer
                link.cancel.reset();
                let bus = cell.borrow();
                let waveform = bus.tx_waveform();
                tx[..waveform.len()].copy_from_slice(waveform);
                waveform.len()
            });
            if words == 0 {
                continue;
            }

            if !self.transmit(&tx[..words], link).await {
                continue;
            }
            if request.expect_response {
                restart(&mut self.capture, &self.capture_config);
            }

            let completed = bus.lock(|cell| {
                if link.cancel.try_take().is_some() {
                    return false;
                }
                cell.borrow_mut().write_complete(Instant::now().as_micros());
                true
            });
            if !completed || !request.expect_response {
                self.capture.set_enable(false);
                continue;
            }

            let received = select(self.receive(&mut rx, bus), link.cancel.wait()).await;
            self.capture.set_enable(false);
            if let Either::First(len) = received {
                bus.lock(|cell| {
                    if link.cancel.try_take().is_none() {
                        cell.borrow_mut().read_complete(&rx[..len]);
                    }
                });
            }
        }
    }

    /// Play `words` onto the lines. Returns `false` if cancelled.
    async fn transmit(&mut self, words: &[u32], link: &BusLink) -> bool {
        // Drop a flag left behind by a cancelled transfer
        let _ = poll_once(self.tx_done.wait());
        restart(&mut self.generator, &self.generator_config);

        let sent = select(
            async {
                self.generator
                    .tx()
                    .dma_push(self.dma.reborrow(), words, false)
                    .await;
                self.tx_done.wait().await;
            },
            link.cancel.wait(),
        )
        .await;

        match sent {
            Either::First(()) => true,
            Either::Second(()) => {
                self.generator.set_enable(false);
                self.release_lines();
                false
            }
        }
    }

    /// Collect bytes until the end sequence. Returns the byte count, or 0
    /// if the frame did not fit.
    async fn receive(&mut self, rx: &mut [u8], bus: &SharedBus) -> usize {
        let _ = poll_once(self.rx_done.wait());
        let mut len = 0;
        loop {
            match select(self.capture.rx().wait_pull(), self.rx_done.wait()).await {
                Either::First(word) => {
                    if len == 0 {
                        bus.lock(|cell| cell.borrow_mut().read_started(Instant::now().as_micros()));
                    }
                    push_byte(rx, &mut len, word);
                }
                Either::Second(()) => {
                    while let Some(word) = self.capture.rx().try_pull() {
                        push_byte(rx, &mut len, word);
                    }
                    if len > rx.len() {
                        defmt::warn!("oversized frame: {} bytes", len);
                        return 0;
                    }
                    return len;
                }
            }
        }
    }

    fn release_lines(&mut self) {
        self.generator
            .set_pins(Level::High, &[&self.line_a, &self.line_b]);
        self.generator
            .set_pin_dirs(Direction::In, &[&self.line_a, &self.line_b]);
    }
}

fn push_byte(rx: &mut [u8], len: &mut usize, word: u32) {
    if let Some(byte) = rx.get_mut(*len) {
        *byte = word as u8;
    }
    *len += 1;
}

/// Start `sm` from the top of its program with empty FIFOs.
fn restart<'d, P: Instance, const N: usize>(sm: &mut StateMachine<'d, P, N>, config: &Config<'d, P>) {
    sm.set_enable(false);
    sm.clear_fifos();
    sm.restart();
    sm.set_config(config);
    sm.set_enable(true);
}
