//! Maple Bus wire format: frames, addressing, CRC and payload decoding.
//!
//! This crate holds everything about the bus that is bit-exact and
//! independent of the chip driving it:
//!
//! - **Framing**
//!   - [`FrameHeader`] - The frame word (command, recipient, sender, length)
//!   - [`encode_frame()`] / [`decode_frame()`] / [`validate()`]
//!   - [`calculate_crc()`] / [`CrcDigest`] - XOR check byte
//!
//! - **Addressing**: [`Address`], [`recipient_address()`], [`sub_peripheral_mask()`]
//!
//! - **Payloads**
//!   - [`Command`] - Command byte table
//!   - [`FunctionCodes`] - Peripheral function bitfield
//!   - [`DeviceInfo`] - Device info response
//!   - [`ControllerCondition`] - Controller condition response
//!
//! - **Signaling**: [`encode_waveform()`] - Phase stream for the line generator
//!
//! # Wire Format
//!
//! ```text
//! <frame word> <payload word 0> ... <payload word n-1> <crc>
//! ```
//!
//! Each word is sent least significant byte first, each byte most
//! significant bit first. The check byte is the XOR of every other byte.
//!
//! # Example
//!
//! ```
//! use maple_proto::{decode_frame, encode_frame, Address, Command, host_address};
//!
//! // Ask the controller on port A for its condition
//! let mut buf = [0u8; 16];
//! let len = encode_frame(
//!     Command::GetCondition.byte(),
//!     host_address(0),
//!     Address::main(0).raw(),
//!     &[0x0000_0001],
//!     &mut buf,
//! )
//! .unwrap();
//!
//! let mut payload = [0u32; 1];
//! let (header, count) = decode_frame(&buf[..len], &mut payload).unwrap();
//! assert_eq!(header.command(), Some(Command::GetCondition));
//! assert_eq!(count, 1);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod address;
pub mod command;
pub mod condition;
pub mod crc;
pub mod device_info;
pub mod frame;
pub mod function;
pub mod waveform;

// Re-export types at crate root for convenience
pub use address::{
    host_address, recipient_address, sub_peripheral_index, sub_peripheral_mask, Address,
    MAX_PLAYERS, MAX_SUB_PERIPHERALS,
};
pub use command::Command;
pub use condition::{center, ConditionButton, ControllerCondition};
pub use crc::{calculate_crc, CrcDigest};
pub use device_info::DeviceInfo;
pub use frame::{
    decode_frame, encode_frame, encode_raw, encoded_len, validate, FrameError, FrameHeader,
    MAX_FRAME_BYTES, MAX_FRAME_WORDS, MAX_PAYLOAD_WORDS,
};
pub use function::FunctionCodes;
pub use waveform::{encode_waveform, waveform_duration_ns, waveform_words, MAX_WAVEFORM_WORDS};
