//! Maple Bus to USB gamepad bridge for RP2040.
//!
//! The firmware runs on a Raspberry Pi Pico (RP2040) and:
//! 1. Drives up to four Maple Bus ports through the PIO blocks
//! 2. Detects the peripherals on each port and polls controllers
//! 3. Reports each port as its own USB HID gamepad
//!
//! # Hardware Configuration
//!
//! | Function | GPIO    | PIO / state machines |
//! |----------|---------|----------------------|
//! | Port A   | 10, 11  | PIO0, SM 0 and 1     |
//! | Port B   | 12, 13  | PIO0, SM 2 and 3     |
//! | Port C   | 14, 15  | PIO1, SM 0 and 1     |
//! | Port D   | 16, 17  | PIO1, SM 2 and 3     |
//!
//! The first GPIO of each pair is line A, the second line B. Both lines
//! need pull-ups; the internal ones are enabled.
//!
//! # Architecture
//!
//! - **USB Task**: Manages the USB device stack
//! - **Bus Tasks**: One per port, moves waveforms in and out of the PIO.
//!   They run on an interrupt executor so a response is captured no matter
//!   what the thread-mode tasks are doing
//! - **Maple Task**: Runs the transport deadlines and the peripheral nodes
//!   of every port, staging controller input into a [`UsbGamepad`]
//! - **Output Tasks**: One per port, forwards committed states as HID
//!   reports
//!
//! Gamepad states travel to the output tasks through a
//! [`Signal`](embassy_sync::signal::Signal) per port with "latest value
//! wins" semantics.
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)

#![no_std]

#[cfg(all(feature = "dev-panic", feature = "prod-panic"))]
compile_error!("Cannot enable both `dev-panic` and `prod-panic` features");

pub use maple_core::{
    BusDriver, BusTimings, GamepadHost, GamepadState, MainNode, MapleBus, OutputError, OutputSink,
};

pub mod bus;
pub mod gamepad;
pub mod usb_output;

pub use bus::{BusHardware, BusLink, BusPrograms, SharedBus, SignalDriver};
pub use gamepad::{StateSignal, UsbGamepad};
pub use usb_output::{configure_usb_hid, GamepadReport, UsbHidOutput};
