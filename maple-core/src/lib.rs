//! Platform-agnostic Maple Bus host: transport, peripheral tracking and
//! controller polling.
//!
//! This crate provides the state machines of the bridge without any
//! chip-specific dependencies. It runs in embedded `no_std` environments and
//! on the host for testing.
//!
//! # Overview
//!
//! - [`bus`]: Bus transport ([`MapleBus`]) over a hardware boundary ([`BusDriver`])
//! - [`node`]: Address slots ([`MainNode`], [`SubNode`]) and detected [`Peripheral`]s
//! - [`controller`]: Condition polling ([`ControllerPoller`])
//! - [`gamepad`]: Input-device collaborator ([`GamepadHost`]) and report state
//! - [`output`]: Output sink trait ([`OutputSink`])
//! - [`config`]: Timing constants
//!
//! # Scheduling
//!
//! Everything here is driven from a cooperative loop. Per bus and per tick:
//!
//! ```text
//! bus.process_events(now);
//! main_node.task(now, &mut bus, &mut gamepad);
//! ```
//!
//! The hardware side reports into the same [`MapleBus`] through
//! [`MapleBus::write_complete`], [`MapleBus::read_started`] and
//! [`MapleBus::read_complete`]; the owner serializes both sides.
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting and logging (for embedded targets)
//! - **`log`**: Log through the `log` facade

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

#[macro_use]
mod fmt;

pub mod bus;
pub mod config;
pub mod controller;
pub mod gamepad;
pub mod node;
pub mod output;
pub mod schedule;

// Re-export main types at crate root
pub use bus::{BusDriver, MapleBus, ReadData, WriteError};
pub use config::BusTimings;
pub use controller::ControllerPoller;
pub use gamepad::{Axis, Button, Buttons, Dpad, DpadDirection, GamepadHost, GamepadState, Side};
pub use node::{MainNode, PassivePeripheral, Peripheral, SubNode};
pub use output::{OutputError, OutputSink};
