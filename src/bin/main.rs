#![no_std]
#![no_main]

use core::cell::RefCell;

use defmt::{error, info};
use defmt_rtt as _;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_futures::yield_now;
use embassy_rp::bind_interrupts;
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::{DMA_CH0, DMA_CH1, DMA_CH2, DMA_CH3, PIO0, PIO1, USB};
use embassy_rp::pio::{InterruptHandler as PioInterruptHandler, Pio};
use embassy_rp::usb::Driver;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::Instant;
use embassy_usb::class::hid::State;
use embassy_usb::{Builder, Config as UsbConfig};
use maple_core::output::forward;
use maple_proto::{host_address, MAX_PLAYERS};
use maple_to_usb::{
    configure_usb_hid, BusHardware, BusLink, BusPrograms, BusTimings, MainNode, MapleBus,
    SharedBus, SignalDriver, StateSignal, UsbGamepad, UsbHidOutput,
};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
    PIO0_IRQ_0 => PioInterruptHandler<PIO0>;
    PIO1_IRQ_0 => PioInterruptHandler<PIO1>;
});

const PORTS: usize = MAX_PLAYERS as usize;

/// Runs the bus tasks ahead of the thread-mode tasks, so capture is armed
/// as soon as the generator releases the lines.
static BUS_EXECUTOR: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_0() {
    BUS_EXECUTOR.on_interrupt()
}

/// Hand-off between each transport and its bus task.
static LINKS: [BusLink; PORTS] = [const { BusLink::new() }; PORTS];

/// Transport state of every port.
static BUSES: StaticCell<[SharedBus; PORTS]> = StaticCell::new();

/// Latest gamepad state of every port, from the maple task to the output tasks.
static STATE_SIGNALS: [StateSignal; PORTS] = [const { Signal::new() }; PORTS];

/// USB device configuration buffer.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// HID state, one per port.
static HID_STATES: StaticCell<[State<'static>; PORTS]> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Maple-to-USB starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- Maple Bus Setup ---
    let Pio {
        common: mut pio0,
        irq0,
        irq1,
        irq2,
        irq3,
        sm0,
        sm1,
        sm2,
        sm3,
        ..
    } = Pio::new(p.PIO0, Irqs);
    let programs = BusPrograms::load(&mut pio0);
    let port_a = BusHardware::new(
        &mut pio0, &programs, sm0, sm1, irq0, irq1, p.PIN_10, p.PIN_11, p.DMA_CH0,
    );
    let port_b = BusHardware::new(
        &mut pio0, &programs, sm2, sm3, irq2, irq3, p.PIN_12, p.PIN_13, p.DMA_CH1,
    );

    let Pio {
        common: mut pio1,
        irq0,
        irq1,
        irq2,
        irq3,
        sm0,
        sm1,
        sm2,
        sm3,
        ..
    } = Pio::new(p.PIO1, Irqs);
    let programs = BusPrograms::load(&mut pio1);
    let port_c = BusHardware::new(
        &mut pio1, &programs, sm0, sm1, irq0, irq1, p.PIN_14, p.PIN_15, p.DMA_CH2,
    );
    let port_d = BusHardware::new(
        &mut pio1, &programs, sm2, sm3, irq2, irq3, p.PIN_16, p.PIN_17, p.DMA_CH3,
    );

    let masks = [
        port_a.line_mask(),
        port_b.line_mask(),
        port_c.line_mask(),
        port_d.line_mask(),
    ];
    let buses: &'static [SharedBus; PORTS] = BUSES.init_with(|| {
        core::array::from_fn(|i| {
            let driver = SignalDriver::new(&LINKS[i], masks[i]);
            Mutex::new(RefCell::new(MapleBus::new(
                driver,
                host_address(i as u8),
                BusTimings::DEFAULT,
            )))
        })
    });

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = UsbConfig::new(0x1209, 0x0001); // pid.codes test VID/PID
    usb_config.manufacturer = Some("Rust Gamepad");
    usb_config.product = Some("Maple-to-USB Bridge");
    usb_config.serial_number = Some("001");
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );

    // One HID gamepad interface per port
    let hid_states = HID_STATES.init([State::new(), State::new(), State::new(), State::new()]);
    for (state, signal) in hid_states.iter_mut().zip(&STATE_SIGNALS) {
        let hid_writer = configure_usb_hid(&mut builder, state);
        spawner.spawn(output_task(UsbHidOutput::new(hid_writer), signal).unwrap());
    }

    // Build the USB device
    let usb_device = builder.build();

    // Spawn tasks (unwrap the SpawnToken, then spawn)
    spawner.spawn(usb_task(usb_device).unwrap());
    spawner.spawn(maple_task(buses).unwrap());

    // Bus tasks preempt the maple task but stay below the PIO and USB handlers
    interrupt::SWI_IRQ_0.set_priority(Priority::P2);
    let bus_spawner = BUS_EXECUTOR.start(interrupt::SWI_IRQ_0);
    bus_spawner.spawn(port_a_task(port_a, &buses[0], &LINKS[0]).unwrap());
    bus_spawner.spawn(port_b_task(port_b, &buses[1], &LINKS[1]).unwrap());
    bus_spawner.spawn(port_c_task(port_c, &buses[2], &LINKS[2]).unwrap());
    bus_spawner.spawn(port_d_task(port_d, &buses[3], &LINKS[3]).unwrap());

    info!("Maple-to-USB initialized, probing ports...");
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, Driver<'static, USB>>) {
    device.run().await;
}

macro_rules! port_task {
    ($name:ident, $pio:ty, $dma:ty, $generator:literal, $capture:literal) => {
        /// Bus task - moves waveforms through the PIO for one port.
        #[embassy_executor::task]
        async fn $name(
            mut hardware: BusHardware<'static, $pio, $dma, $generator, $capture>,
            bus: &'static SharedBus,
            link: &'static BusLink,
        ) {
            hardware.run(bus, link).await
        }
    };
}

port_task!(port_a_task, PIO0, DMA_CH0, 0, 1);
port_task!(port_b_task, PIO0, DMA_CH1, 2, 3);
port_task!(port_c_task, PIO1, DMA_CH2, 0, 1);
port_task!(port_d_task, PIO1, DMA_CH3, 2, 3);

/// Maple task - runs every port's transport deadlines and nodes.
#[embassy_executor::task]
async fn maple_task(buses: &'static [SharedBus; PORTS]) {
    let mut nodes: [MainNode; PORTS] = core::array::from_fn(|i| MainNode::new(i as u8));
    let mut gamepads: [UsbGamepad; PORTS] =
        core::array::from_fn(|i| UsbGamepad::new(&STATE_SIGNALS[i]));

    loop {
        for ((bus, node), gamepad) in buses.iter().zip(&mut nodes).zip(&mut gamepads) {
            bus.lock(|cell| {
                let mut bus = cell.borrow_mut();
                let now = Instant::now().as_micros();
                bus.process_events(now);
                node.task(now, &mut *bus, gamepad);
            });
        }
        yield_now().await;
    }
}

/// Output task - waits for gamepad state signals and sends to USB HID.
#[embassy_executor::task(pool_size = 4)]
async fn output_task(mut output: UsbHidOutput<'static>, signal: &'static StateSignal) {
    // Wait for USB to be ready
    output.wait_ready().await;
    info!("USB HID ready, forwarding gamepad state...");

    loop {
        // Wait for the next gamepad state (blocks until signaled)
        let state = signal.wait().await;
        if let Err(e) = forward(&mut output, &state).await {
            error!("Output error: {:?}", e);
        }
    }
}
