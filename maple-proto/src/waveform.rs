//! Line waveform encoding for the signal generator.
//!
//! The bus is two lines, A and B. A frame is sent as a sequence of slots;
//! each slot holds two phases and each phase is the level of both lines:
//!
//! ```text
//! phase: bit 0 = A, bit 1 = B
//! slot:  (first phase << 2) | second phase
//! ```
//!
//! Slots are packed eight to a word, first slot in the most significant
//! nibble. The generator input is the slot count minus one followed by the
//! packed slots.
//!
//! Data bits alternate clock lines. Even bits (counted from the first bit
//! of the frame) are clocked by a falling edge on A with B holding the bit;
//! odd bits are clocked by a falling edge on B with A holding the bit.
//! Bytes are sent most significant bit first.

use crate::frame::{FrameError, MAX_FRAME_BYTES};

/// Duration of one slot in nanoseconds.
pub const SLOT_NS: u32 = 480;

pub const LINE_A: u8 = 0b01;
pub const LINE_B: u8 = 0b10;
const BOTH: u8 = LINE_A | LINE_B;

const fn slot(first: u8, second: u8) -> u8 {
    (first << 2) | second
}

/// A falls, B pulses four times, both return high.
pub const START_SLOTS: [u8; 6] = [
    slot(BOTH, LINE_B),
    slot(0, LINE_B),
    slot(0, LINE_B),
    slot(0, LINE_B),
    slot(0, LINE_B),
    slot(BOTH, BOTH),
];

/// A pulses twice while B is held low, then both return high.
pub const END_SLOTS: [u8; 3] = [slot(LINE_A, 0), slot(LINE_A, 0), slot(LINE_A, BOTH)];

const SLOTS_PER_WORD: usize = 8;

/// Number of slots needed for a frame of `frame_bytes` bytes.
#[inline]
#[must_use]
pub const fn slot_count(frame_bytes: usize) -> usize {
    START_SLOTS.len() + frame_bytes * 8 + END_SLOTS.len()
}

/// Number of generator words (count word included) for `frame_bytes` bytes.
#[inline]
#[must_use]
pub const fn waveform_words(frame_bytes: usize) -> usize {
    1 + slot_count(frame_bytes).div_ceil(SLOTS_PER_WORD)
}

/// Generator words needed for the largest frame.
pub const MAX_WAVEFORM_WORDS: usize = waveform_words(MAX_FRAME_BYTES);

/// Time the generator needs to play a frame of `frame_bytes` bytes.
#[inline]
#[must_use]
pub const fn waveform_duration_ns(frame_bytes: usize) -> u64 {
    slot_count(frame_bytes) as u64 * SLOT_NS as u64
}

/// Slot for data bit number `index` with value `bit`.
#[inline]
#[must_use]
pub const fn data_slot(index: usize, bit: bool) -> u8 {
    let b = bit as u8;
    if index % 2 == 0 {
        slot((b << 1) | LINE_A, b << 1)
    } else {
        slot(LINE_B | b, b)
    }
}

struct SlotWriter<'a> {
    words: &'a mut [u32],
    index: usize,
}

impl SlotWriter<'_> {
    fn push(&mut self, slot: u8) {
        let word = self.index / SLOTS_PER_WORD;
        let shift = 28 - 4 * (self.index % SLOTS_PER_WORD);
        self.words[word] |= u32::from(slot & 0xF) << shift;
        self.index += 1;
    }
}

/// Expand encoded frame bytes into generator words.
///
/// Returns the number of words written to `out`.
pub fn encode_waveform(frame: &[u8], out: &mut [u32]) -> Result<usize, FrameError> {
    if frame.len() > MAX_FRAME_BYTES {
        return Err(FrameError::PayloadTooLong);
    }
    let len = waveform_words(frame.len());
    if out.len() < len {
        return Err(FrameError::BufferTooSmall);
    }

    out[0] = (slot_count(frame.len()) - 1) as u32;
    let slots = &mut out[1..len];
    slots.fill(0);

    let mut writer = SlotWriter {
        words: slots,
        index: 0,
    };
    for &s in &START_SLOTS {
        writer.push(s);
    }
    let mut bit_index = 0;
    for &byte in frame {
        for shift in (0..8).rev() {
            writer.push(data_slot(bit_index, (byte >> shift) & 1 != 0));
            bit_index += 1;
        }
    }
    for &s in &END_SLOTS {
        writer.push(s);
    }

    Ok(len)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::frame::encode_frame;
    use std::vec::Vec;

    fn phases(words: &[u32]) -> Vec<(bool, bool)> {
        let count = words[0] as usize + 1;
        let mut out = Vec::new();
        for i in 0..count {
            let nibble = (words[1 + i / 8] >> (28 - 4 * (i % 8))) & 0xF;
            for phase in [nibble >> 2, nibble & 0b11] {
                out.push((phase & 1 != 0, phase & 2 != 0));
            }
        }
        out
    }

    /// Edge-driven receiver: samples the data line on each clock fall and
    /// stops when A rises while B is low after an A-clocked bit.
    fn receive(phases: &[(bool, bool)]) -> Option<Vec<bool>> {
        enum Rx {
            WaitAFall,
            APoll,
            WaitBFall,
            WaitARise,
        }
        let mut state = Rx::WaitAFall;
        let mut bits = Vec::new();
        for &(a, b) in phases {
            state = match state {
                Rx::WaitAFall if !a => {
                    bits.push(b);
                    Rx::APoll
                }
                Rx::APoll if b => Rx::WaitBFall,
                Rx::APoll if a => return Some(bits),
                Rx::WaitBFall if !b => {
                    bits.push(a);
                    Rx::WaitARise
                }
                Rx::WaitARise if a => Rx::WaitAFall,
                s => s,
            };
        }
        None
    }

    fn bytes_from_bits(bits: &[bool]) -> Vec<u8> {
        bits.chunks_exact(8)
            .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | b as u8))
            .collect()
    }

    #[test]
    fn test_count_word_and_length() {
        let mut out = [0u32; 16];
        let len = encode_waveform(&[0xAA], &mut out).unwrap();
        assert_eq!(out[0], (6 + 8 + 3 - 1) as u32);
        assert_eq!(len, 1 + 3);
    }

    #[test]
    fn test_start_sequence_first() {
        let mut out = [0u32; 16];
        encode_waveform(&[0x00], &mut out).unwrap();
        // (A1B1 A0B1) (A0B0 A0B1) x4 (A1B1 A1B1) then the first data slot
        assert_eq!(out[1] >> 8, 0x00E2_222F);
    }

    #[test]
    fn test_data_slots_alternate_clock_line() {
        assert_eq!(data_slot(0, true), slot(0b11, 0b10));
        assert_eq!(data_slot(0, false), slot(0b01, 0b00));
        assert_eq!(data_slot(1, true), slot(0b11, 0b01));
        assert_eq!(data_slot(1, false), slot(0b10, 0b00));
    }

    #[test]
    fn test_receiver_recovers_frame() {
        let mut frame = [0u8; 32];
        let frame_len =
            encode_frame(0x09, 0x00, 0x20, &[0x0000_0001, 0x5A5A_0FF0], &mut frame).unwrap();
        let mut words = [0u32; 64];
        let len = encode_waveform(&frame[..frame_len], &mut words).unwrap();

        let stream = phases(&words[..len]);
        let bits = receive(&stream[START_SLOTS.len() * 2..]).unwrap();
        // The end sequence leaves one extra sample behind the last byte
        assert_eq!(bits.len(), frame_len * 8 + 1);
        assert_eq!(bytes_from_bits(&bits), &frame[..frame_len]);
    }

    #[test]
    fn test_lines_released_high_at_end() {
        let mut words = [0u32; 16];
        let len = encode_waveform(&[0xFF, 0x00, 0x81, 0x7E, 0x18], &mut words).unwrap();
        let stream = phases(&words[..len]);
        assert_eq!(stream.last(), Some(&(true, true)));
    }

    #[test]
    fn test_duration() {
        // 5-byte frame: 6 + 40 + 3 slots
        assert_eq!(waveform_duration_ns(5), 49 * 480);
    }

    #[test]
    fn test_buffer_too_small() {
        let mut out = [0u32; 2];
        assert_eq!(encode_waveform(&[0; 5], &mut out), Err(FrameError::BufferTooSmall));
    }

    #[test]
    fn test_max_frame_fits() {
        assert_eq!(MAX_WAVEFORM_WORDS, 1 + (6 + MAX_FRAME_BYTES * 8 + 3 + 7) / 8);
    }
}
