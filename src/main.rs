//! keybridge firmware - BLE keyboard bridge + idle mouse mover.
//!
//! Task layout:
//!
//! - `softdevice_task` - SoftDevice event pump, USB power events
//! - `ble_task`        - advertise, serve the GATT service, post link edges
//! - `usb_device_task` - USB enumeration and endpoint servicing
//! - `hid_writer_task` - HID report channel → USB endpoints
//! - main              - the dispatcher polling loop
//!
//! Everything the user sees happens in the dispatcher tick; the other
//! tasks only move bytes in and out.

#![no_std]
#![no_main]

mod ble;
mod ui;
mod usb;

use defmt::{info, unwrap, warn};
use embassy_executor::Spawner;
use embassy_nrf::interrupt::{self, InterruptExt, Priority};
use embassy_nrf::usb::vbus_detect::SoftwareVbusDetect;
use embassy_nrf::{bind_interrupts, peripherals, twim};
use embassy_time::{Instant, Timer};
use keybridge::config::{LOOP_YIELD_MS, TEXT_QUEUE_CAPACITY};
use keybridge::counters::Counters;
use keybridge::dispatch::{Dispatcher, ObservableState, StatusDisplay, Timing};
use keybridge::hid::ReportOutput;
use keybridge::queue::TextQueue;
use nrf_softdevice::Softdevice;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use crate::ble::server::{self, Server};
use crate::ui::display::StatusScreen;
use crate::usb::ChannelSink;

bind_interrupts!(struct Irqs {
    SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

static COUNTERS: Counters = Counters::new();
static TEXT_QUEUE: StaticCell<TextQueue<TEXT_QUEUE_CAPACITY>> = StaticCell::new();
static SERVER: StaticCell<Server> = StaticCell::new();
static VBUS: StaticCell<SoftwareVbusDetect> = StaticCell::new();

/// Stand-in when the panel did not answer at boot.
struct NoDisplay;

impl StatusDisplay for NoDisplay {
    fn render(&mut self, _state: &ObservableState) {}
}

fn now_ms() -> u32 {
    // Truncation is the wrap; all arithmetic on it goes through `clock`.
    Instant::now().as_millis() as u32
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("keybridge starting");

    // SoftDevice reserves interrupt priorities 0, 1 and 4.
    let mut nrf_config = embassy_nrf::config::Config::default();
    nrf_config.gpiote_interrupt_priority = Priority::P2;
    nrf_config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(nrf_config);
    interrupt::USBD.set_priority(Priority::P2);
    interrupt::SPIM0_SPIS0_TWIM0_TWIS0_SPI0_TWI0.set_priority(Priority::P2);

    // - BLE ---------------------------------------------------------
    let sd = Softdevice::enable(&ble::softdevice_config());
    let server = SERVER.init(unwrap!(server::register(sd)));
    let sd: &'static Softdevice = sd;

    let mut seed = [0u8; 8];
    if let Err(e) = nrf_softdevice::random_bytes(sd, &mut seed) {
        warn!("No hardware entropy ({}) - delays will repeat across boots", e);
    }
    let rng = SmallRng::seed_from_u64(u64::from_le_bytes(seed));

    let vbus: &'static SoftwareVbusDetect = VBUS.init(SoftwareVbusDetect::new(false, false));
    unwrap!(spawner.spawn(ble::softdevice_task(sd, vbus)));

    // - Text queue --------------------------------------------------
    let (writer, reader) = TEXT_QUEUE.init(TextQueue::new()).split();
    unwrap!(spawner.spawn(server::ble_task(sd, server, writer, &COUNTERS)));

    // - USB ---------------------------------------------------------
    let usb = usb::hid_device::init(p.USBD, vbus);
    unwrap!(spawner.spawn(usb::hid_device::usb_device_task(usb.device)));
    unwrap!(spawner.spawn(usb::hid_device::hid_writer_task(
        usb.keyboard_writer,
        usb.mouse_writer
    )));

    // - Display (SDA = P0.26, SCL = P0.27) --------------------------
    let mut i2c_config = twim::Config::default();
    i2c_config.frequency = twim::Frequency::K400;
    let i2c = twim::Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, i2c_config);

    let mut output = ReportOutput::new(ChannelSink::new());
    let mut dispatcher = Dispatcher::new(reader, &COUNTERS, rng, Timing::DEFAULT, now_ms());

    match StatusScreen::new(i2c) {
        Ok(mut screen) => run(&mut dispatcher, &mut output, &mut screen).await,
        Err(e) => {
            warn!("Display unavailable: {} - running headless", e);
            run(&mut dispatcher, &mut output, &mut NoDisplay).await
        }
    }
}

async fn run<D: StatusDisplay>(
    dispatcher: &mut Dispatcher<'static, SmallRng, TEXT_QUEUE_CAPACITY>,
    output: &mut ReportOutput<ChannelSink>,
    display: &mut D,
) -> ! {
    info!("Dispatcher running");
    loop {
        let link = ble::LINK_EVENTS.try_receive().ok();
        dispatcher.tick(now_ms(), link, output, display);
        Timer::after_millis(LOOP_YIELD_MS).await;
    }
}
