//! Maple Bus signaling on the RP2040 PIO blocks.
//!
//! Each bus is split in two halves that share a [`SharedBus`]:
//!
//! - the scheduler owns the transport state ([`MapleBus`]) and starts
//!   transfers through a [`SignalDriver`];
//! - a hardware task ([`BusHardware::run`]) plays the waveform, arms
//!   capture and reports progress back into the transport.
//!
//! Hardware tasks run on an interrupt executor above the scheduler, so the
//! lock is a critical section.

mod driver;
mod hardware;
mod program;

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use maple_core::MapleBus;

pub use driver::{BusLink, SignalDriver, TxRequest};
pub use hardware::BusHardware;
pub use program::{BusPrograms, GENERATOR_CLOCK_HZ};

/// Transport state of one bus, shared between scheduler and hardware task.
pub type SharedBus = Mutex<CriticalSectionRawMutex, RefCell<MapleBus<SignalDriver>>>;
