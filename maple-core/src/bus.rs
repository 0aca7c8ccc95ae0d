//! Bus transport: one physical bus, one transfer at a time.
//!
//! [`MapleBus`] owns the transfer state of a bus and is driven from two
//! sides:
//!
//! - the cooperative loop calls [`MapleBus::write`], [`MapleBus::read_data`]
//!   and [`MapleBus::process_events`];
//! - the hardware side reports progress through [`MapleBus::write_complete`],
//!   [`MapleBus::read_started`] and [`MapleBus::read_complete`].
//!
//! Both sides must be serialized by the owner (the firmware keeps each bus
//! behind a mutex). The phase is the single source of truth for "busy".

use heapless::Vec;
use maple_proto::frame::{encode_raw, validate, FrameError, FrameHeader, MAX_FRAME_BYTES};
use maple_proto::waveform::{encode_waveform, MAX_WAVEFORM_WORDS};
use maple_proto::{Command, MAX_FRAME_WORDS, MAX_PAYLOAD_WORDS};

use crate::config::BusTimings;

/// Hardware signaling boundary for one bus.
pub trait BusDriver {
    /// Monotonic time in microseconds.
    fn now_us(&self) -> u64;

    /// Sample both lines for `window_us` microseconds.
    ///
    /// Returns `true` if neither line was seen low.
    fn line_is_open(&mut self, window_us: u32) -> bool;

    /// Start playing `waveform` onto the lines.
    ///
    /// If `expect_response` is set, capture must be armed as soon as the
    /// generator releases the lines. Must not block.
    fn begin_write(&mut self, waveform: &[u32], expect_response: bool);

    /// Abandon the transfer in flight, if any.
    fn cancel(&mut self);
}

/// Reasons a write is refused. Nothing is sent when any of these is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteError {
    /// A write or read is still in progress.
    Busy,
    /// Another device is driving the line.
    LineNotOpen,
    /// More than 255 payload words.
    PayloadTooLong,
    /// Caller-built frame word disagrees with the payload length.
    LengthMismatch,
}

impl From<FrameError> for WriteError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::LengthMismatch => WriteError::LengthMismatch,
            _ => WriteError::PayloadTooLong,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Phase {
    Idle,
    Writing,
    AwaitingResponse,
    Reading,
}

/// Last validated frame, as returned by [`MapleBus::read_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadData<'a> {
    /// Frame word followed by the payload words. Empty before the first
    /// valid frame.
    pub words: &'a [u32],
    /// Set only on the first read after a new frame was accepted.
    pub is_new: bool,
}

impl<'a> ReadData<'a> {
    #[must_use]
    pub fn header(&self) -> Option<FrameHeader> {
        self.words.first().map(|&w| FrameHeader::from_word(w))
    }

    #[must_use]
    pub fn payload(&self) -> &'a [u32] {
        self.words.get(1..).unwrap_or(&[])
    }
}

/// Transport for one bus.
pub struct MapleBus<D> {
    driver: D,
    sender: u8,
    timings: BusTimings,
    phase: Phase,
    deadline_us: u64,
    expect_response: bool,
    read_timeout_us: u32,
    frame: [u8; MAX_FRAME_BYTES],
    waveform: [u32; MAX_WAVEFORM_WORDS],
    waveform_len: usize,
    last_valid: Vec<u32, MAX_FRAME_WORDS>,
    new_data: bool,
}

impl<D: BusDriver> MapleBus<D> {
    /// Create a transport that sends as `sender`.
    pub fn new(driver: D, sender: u8, timings: BusTimings) -> Self {
        Self {
            driver,
            sender,
            timings,
            phase: Phase::Idle,
            deadline_us: 0,
            expect_response: false,
            read_timeout_us: 0,
            frame: [0; MAX_FRAME_BYTES],
            waveform: [0; MAX_WAVEFORM_WORDS],
            waveform_len: 0,
            last_valid: Vec::new(),
            new_data: false,
        }
    }

    /// Send a command from this bus's sender address.
    ///
    /// With `expect_response`, receive starts right after the write and the
    /// response must begin within the response start timeout; once it has,
    /// it has `read_timeout_us` to finish.
    pub fn write(
        &mut self,
        command: Command,
        recipient: u8,
        payload: &[u32],
        expect_response: bool,
        read_timeout_us: u32,
    ) -> Result<(), WriteError> {
        if payload.len() > MAX_PAYLOAD_WORDS {
            return Err(WriteError::PayloadTooLong);
        }
        let header = FrameHeader::new(command.byte(), recipient, self.sender, payload.len() as u8);
        self.write_frame(header.to_word(), payload, expect_response, read_timeout_us)
    }

    /// Send a caller-built frame word verbatim, ignoring the sender address.
    pub fn write_frame(
        &mut self,
        frame_word: u32,
        payload: &[u32],
        expect_response: bool,
        read_timeout_us: u32,
    ) -> Result<(), WriteError> {
        if self.is_busy() {
            return Err(WriteError::Busy);
        }

        let frame_len = encode_raw(frame_word, payload, &mut self.frame)?;
        let words = encode_waveform(&self.frame[..frame_len], &mut self.waveform)?;

        if !self.driver.line_is_open(self.timings.open_line_check_us) {
            trace!("line not open");
            return Err(WriteError::LineNotOpen);
        }

        let now = self.driver.now_us();
        self.waveform_len = words;
        self.expect_response = expect_response;
        self.read_timeout_us = read_timeout_us;
        self.deadline_us = now + self.timings.write_timeout_us(frame_len);
        self.phase = Phase::Writing;
        self.driver
            .begin_write(&self.waveform[..words], expect_response);
        Ok(())
    }

    /// The last validated frame and whether it is new since the last call.
    pub fn read_data(&mut self) -> ReadData<'_> {
        let is_new = core::mem::take(&mut self.new_data);
        ReadData {
            words: &self.last_valid,
            is_new,
        }
    }

    /// Enforce the deadline of the transfer in flight.
    pub fn process_events(&mut self, now: u64) {
        if self.phase == Phase::Idle || now < self.deadline_us {
            return;
        }
        match self.phase {
            Phase::Writing => warn!("write timed out"),
            Phase::Reading => debug!("read timed out"),
            // Nothing answered; the normal case for an empty port
            _ => trace!("no response"),
        }
        self.driver.cancel();
        self.phase = Phase::Idle;
    }

    /// The generator released the lines.
    pub fn write_complete(&mut self, now: u64) {
        if self.phase != Phase::Writing {
            return;
        }
        if self.expect_response {
            self.phase = Phase::AwaitingResponse;
            self.deadline_us = now + u64::from(self.timings.response_start_timeout_us);
        } else {
            self.phase = Phase::Idle;
        }
    }

    /// The first byte of a response arrived.
    pub fn read_started(&mut self, now: u64) {
        if self.phase == Phase::AwaitingResponse {
            self.phase = Phase::Reading;
            self.deadline_us = now + u64::from(self.read_timeout_us);
        }
    }

    /// Capture saw the end sequence; `raw` holds every byte received.
    ///
    /// Returns `true` if the frame was valid and is now the last valid read.
    pub fn read_complete(&mut self, raw: &[u8]) -> bool {
        if !matches!(self.phase, Phase::AwaitingResponse | Phase::Reading) {
            return false;
        }
        self.phase = Phase::Idle;

        if !validate(raw) {
            debug!("dropped invalid frame of {} bytes", raw.len());
            return false;
        }

        self.last_valid.clear();
        for chunk in raw[..raw.len() - 1].chunks_exact(4) {
            // Word count was checked against the length field, which caps it
            let _ = self
                .last_valid
                .push(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }
        self.new_data = true;
        true
    }

    /// True while a write or read is in progress.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Generator words of the write in flight, empty otherwise.
    pub fn tx_waveform(&self) -> &[u32] {
        if self.phase == Phase::Writing {
            &self.waveform[..self.waveform_len]
        } else {
            &[]
        }
    }

    #[inline]
    pub fn sender(&self) -> u8 {
        self.sender
    }

    #[inline]
    pub fn timings(&self) -> &BusTimings {
        &self.timings
    }

    #[inline]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    #[inline]
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}
