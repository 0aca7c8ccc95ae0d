//! Compile-time timing constants.

use maple_proto::waveform::{slot_count, SLOT_NS};

/// Microseconds between condition requests to a connected controller.
pub const CONTROLLER_POLL_INTERVAL_US: u64 = 16_000;

/// Microseconds between device info requests to an empty address.
pub const DEVICE_INFO_PROBE_INTERVAL_US: u64 = 16_000;

/// Consecutive unanswered polls after which a peripheral is dropped.
pub const NO_DATA_DISCONNECT_COUNT: u8 = 3;

/// Read timeout used once a response has started arriving.
pub const DEFAULT_READ_TIMEOUT_US: u32 = 4_000;

/// Bus transport timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusTimings {
    /// Duration of one bit on the wire.
    pub bit_period_ns: u32,
    /// How long both lines must read high before a write may start.
    pub open_line_check_us: u32,
    /// Extra time granted on top of the computed write duration, in percent.
    pub write_timeout_extra_percent: u32,
    /// Fixed allowance for a completion to travel from the hardware task to
    /// the cooperative loop.
    pub completion_slack_us: u32,
    /// How long after a write completes a response must begin.
    pub response_start_timeout_us: u32,
}

impl BusTimings {
    pub const DEFAULT: Self = Self {
        bit_period_ns: SLOT_NS,
        open_line_check_us: 10,
        write_timeout_extra_percent: 20,
        completion_slack_us: 100,
        response_start_timeout_us: 500,
    };

    /// Deadline, relative to the start of the write, for a frame of
    /// `frame_bytes` bytes to leave the wire.
    #[must_use]
    pub const fn write_timeout_us(&self, frame_bytes: usize) -> u64 {
        let ns = slot_count(frame_bytes) as u64 * self.bit_period_ns as u64;
        let ns = ns * (100 + self.write_timeout_extra_percent as u64) / 100;
        ns.div_ceil(1_000) + self.completion_slack_us as u64
    }
}

impl Default for BusTimings {
    fn default() -> Self {
        Self::DEFAULT
    }
}
