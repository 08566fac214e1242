//! USB Device subsystem - presents a composite HID device to the host.
//!
//! The nRF52840's built-in USB 2.0 Full-Speed controller is driven by
//! `embassy-usb`. We create a **composite device** with two HID
//! interfaces:
//!
//! - Interface 0: Keyboard (boot protocol)
//! - Interface 1: Mouse    (boot protocol)
//!
//! Both relay paths push finished reports into [`HID_REPORTS`]; the
//! writer task drains it onto the matching endpoint. VBUS is reported by
//! the SoftDevice (it owns the POWER peripheral), see `ble::softdevice_task`.

pub mod hid_device;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Sender};
use keybridge::config::HID_REPORT_QUEUE_DEPTH;
use keybridge::hid::{HidReport, ReportSink};

pub type ReportChannel = Channel<CriticalSectionRawMutex, HidReport, HID_REPORT_QUEUE_DEPTH>;

/// Reports waiting for the USB writer.
pub static HID_REPORTS: ReportChannel = Channel::new();

/// [`ReportSink`] feeding [`HID_REPORTS`] without blocking.
///
/// Every output's press/release pulse is a synchronous call on the one
/// executor, so pulses from the BLE task and the dispatcher never
/// interleave inside the channel.
#[derive(Clone, Copy)]
pub struct ChannelSink {
    tx: Sender<'static, CriticalSectionRawMutex, HidReport, HID_REPORT_QUEUE_DEPTH>,
}

impl ChannelSink {
    pub fn new() -> Self {
        Self {
            tx: HID_REPORTS.sender(),
        }
    }
}

impl Default for ChannelSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportSink for ChannelSink {
    fn send(&mut self, report: HidReport) {
        if self.tx.try_send(report).is_err() {
            defmt::warn!("HID report channel full - dropped {}", report);
        }
    }

    fn free_capacity(&self) -> usize {
        HID_REPORTS.free_capacity()
    }
}
