//! [`BusDriver`] for the transport side of a bus.

use embassy_rp::pac;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant};
use maple_core::BusDriver;

/// A write handed to the hardware task.
#[derive(Clone, Copy, Debug, defmt::Format)]
pub struct TxRequest {
    pub expect_response: bool,
}

/// Hand-off between a [`SignalDriver`] and its hardware task.
pub struct BusLink {
    pub(crate) request: Signal<CriticalSectionRawMutex, TxRequest>,
    pub(crate) cancel: Signal<CriticalSectionRawMutex, ()>,
}

impl BusLink {
    pub const fn new() -> Self {
        Self {
            request: Signal::new(),
            cancel: Signal::new(),
        }
    }
}

impl Default for BusLink {
    fn default() -> Self {
        Self::new()
    }
}

/// Driver that forwards transfers to a hardware task.
///
/// The waveform itself stays in the transport; the hardware task copies it
/// out of [`MapleBus::tx_waveform`](maple_core::MapleBus::tx_waveform) while
/// holding the bus lock.
pub struct SignalDriver {
    link: &'static BusLink,
    line_mask: u32,
}

impl SignalDriver {
    /// `line_mask` has the bits of both bus GPIOs set.
    pub fn new(link: &'static BusLink, line_mask: u32) -> Self {
        Self { link, line_mask }
    }
}

impl BusDriver for SignalDriver {
    fn now_us(&self) -> u64 {
        Instant::now().as_micros()
    }

    fn line_is_open(&mut self, window_us: u32) -> bool {
        let start = Instant::now();
        let window = Duration::from_micros(u64::from(window_us));
        loop {
            if pac::SIO.gpio_in(0).read() & self.line_mask != self.line_mask {
                return false;
            }
            if start.elapsed() >= window {
                return true;
            }
        }
    }

    fn begin_write(&mut self, _waveform: &[u32], expect_response: bool) {
        self.link.request.signal(TxRequest { expect_response });
    }

    fn cancel(&mut self) {
        self.link.cancel.signal(());
    }
}
