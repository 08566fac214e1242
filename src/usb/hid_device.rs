//! USB HID composite device - keyboard + mouse.
//!
//! Initialises the Embassy USB stack on the nRF52840 hardware USB
//! peripheral and exposes two HID endpoints.

use defmt::{info, warn};
use embassy_nrf::usb::vbus_detect::SoftwareVbusDetect;
use embassy_nrf::usb::Driver;
use embassy_nrf::{self, bind_interrupts, peripherals};
use embassy_usb::class::hid::{Config as HidConfig, HidWriter, State};
use embassy_usb::{Builder, Config, UsbDevice};
use keybridge::config;
use keybridge::hid::keyboard::KEYBOARD_REPORT_DESCRIPTOR;
use keybridge::hid::mouse::MOUSE_REPORT_DESCRIPTOR;
use keybridge::hid::HidReport;
use static_cell::StaticCell;

use super::HID_REPORTS;

bind_interrupts!(struct Irqs {
    USBD => embassy_nrf::usb::InterruptHandler<peripherals::USBD>;
});

pub type UsbDriver = Driver<'static, peripherals::USBD, &'static SoftwareVbusDetect>;
pub type HidEndpoint = HidWriter<'static, UsbDriver, 8>;

static KB_STATE: StaticCell<State> = StaticCell::new();
static MOUSE_STATE: StaticCell<State> = StaticCell::new();
static USB_CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_MSOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_CTRL_BUF: StaticCell<[u8; 128]> = StaticCell::new();
static USB_STATE_HANDLER: StaticCell<UsbStateHandler> = StaticCell::new();

struct UsbStateHandler;

impl embassy_usb::Handler for UsbStateHandler {
    fn configured(&mut self, configured: bool) {
        if configured {
            info!("USB configured by host");
        } else {
            info!("USB unconfigured");
        }
    }

    fn suspended(&mut self, suspended: bool) {
        info!("USB bus {}", if suspended { "suspended" } else { "resumed" });
    }
}

/// Build result containing the USB device runner and the two HID writers.
pub struct UsbHidDevice {
    pub device: UsbDevice<'static, UsbDriver>,
    pub keyboard_writer: HidEndpoint,
    pub mouse_writer: HidEndpoint,
}

fn hid_config(report_descriptor: &'static [u8]) -> HidConfig<'static> {
    HidConfig {
        report_descriptor,
        request_handler: None,
        poll_ms: config::USB_HID_POLL_MS,
        max_packet_size: 8,
    }
}

/// Initialise the USB stack and create the composite HID device.
///
/// Must be called exactly once. All static buffers are consumed here.
pub fn init(usbd: peripherals::USBD, vbus: &'static SoftwareVbusDetect) -> UsbHidDevice {
    let driver = Driver::new(usbd, Irqs, vbus);

    let mut usb_config = Config::new(config::USB_VID, config::USB_PID);
    usb_config.manufacturer = Some(config::USB_MANUFACTURER);
    usb_config.product = Some(config::USB_PRODUCT);
    usb_config.serial_number = Some(config::USB_SERIAL_NUMBER);
    usb_config.max_power = 100; // mA
    usb_config.max_packet_size_0 = 64;

    let mut builder = Builder::new(
        driver,
        usb_config,
        USB_CONFIG_DESC.init([0u8; 256]),
        USB_BOS_DESC.init([0u8; 256]),
        USB_MSOS_DESC.init([0u8; 256]),
        USB_CTRL_BUF.init([0u8; 128]),
    );
    builder.handler(USB_STATE_HANDLER.init(UsbStateHandler));

    let keyboard_writer = HidWriter::new(
        &mut builder,
        KB_STATE.init(State::new()),
        hid_config(KEYBOARD_REPORT_DESCRIPTOR),
    );
    let mouse_writer = HidWriter::new(
        &mut builder,
        MOUSE_STATE.init(State::new()),
        hid_config(MOUSE_REPORT_DESCRIPTOR),
    );

    let device = builder.build();

    info!("USB HID composite device initialised (keyboard + mouse)");

    UsbHidDevice {
        device,
        keyboard_writer,
        mouse_writer,
    }
}

/// Run the USB device stack: enumeration, suspend/resume, endpoints.
#[embassy_executor::task]
pub async fn usb_device_task(mut device: UsbDevice<'static, UsbDriver>) -> ! {
    info!("USB device task started");
    device.run().await
}

/// Drain [`HID_REPORTS`] onto the matching HID endpoint.
#[embassy_executor::task]
pub async fn hid_writer_task(mut keyboard: HidEndpoint, mut mouse: HidEndpoint) -> ! {
    info!("HID writer task started - waiting for reports");

    let mut buf = [0u8; 8];

    loop {
        let report = HID_REPORTS.receive().await;
        let n = report.serialize(&mut buf);

        let result = match report {
            HidReport::Keyboard(_) => keyboard.write(&buf[..n]).await,
            HidReport::Mouse(_) => mouse.write(&buf[..n]).await,
        };
        if let Err(e) = result {
            warn!("USB HID write failed: {}", e);
        }
    }
}
