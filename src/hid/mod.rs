//! HID report types and the key/pointer → report translation layer.
//!
//! [`ReportOutput`] turns the relay's press / release / move calls into
//! boot-protocol reports and hands them to a [`ReportSink`]. On target
//! the sink is the channel feeding the USB writer task; in tests it is a
//! plain vector.

pub mod keyboard;
pub mod mouse;


use crate::keymap::Key;
use crate::relay::HidOutput;
use keyboard::KeyboardReport;
use mouse::MouseReport;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidReport {
    Keyboard(KeyboardReport),
    Mouse(MouseReport),
}

impl HidReport {
    /// Serialise into `buf`. Returns the number of bytes written, or 0 if
    /// `buf` is too small.
    pub fn serialize(&self, buf: &mut [u8]) -> usize {
        match self {
            HidReport::Keyboard(kb) => kb.serialize(buf),
            HidReport::Mouse(m) => m.serialize(buf),
        }
    }
}

/// Destination of finished reports.
pub trait ReportSink {
    fn send(&mut self, report: HidReport);

    /// Reports that can still be accepted without dropping one.
    fn free_capacity(&self) -> usize {
        usize::MAX
    }
}

/// [`HidOutput`] backed by boot-protocol reports.
///
/// Keeps the current keyboard state so that a modifier press followed by
/// a key press produces a single combined report, as a real keyboard would.
///
/// A press is only sent while the sink still has room for the release
/// that follows it, so a bounded sink never leaves a key held on the host.
pub struct ReportOutput<S> {
    keyboard: KeyboardReport,
    sink: S,
}

impl<S: ReportSink> ReportOutput<S> {
    pub const fn new(sink: S) -> Self {
        Self {
            keyboard: KeyboardReport::empty(),
            sink,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: ReportSink> HidOutput for ReportOutput<S> {
    fn press(&mut self, key: Key) {
        if self.sink.free_capacity() < 2 {
            #[cfg(feature = "defmt")]
            defmt::warn!("HID sink nearly full - skipped key {}", key);
            return;
        }
        if self.keyboard.press(key) {
            self.sink.send(HidReport::Keyboard(self.keyboard));
        } else {
            #[cfg(feature = "defmt")]
            defmt::debug!("No report for key {}", key);
        }
    }

    fn release_all(&mut self) {
        self.keyboard.release_all();
        self.sink.send(HidReport::Keyboard(self.keyboard));
    }

    fn move_pointer(&mut self, dx: i8, dy: i8) {
        self.sink.send(HidReport::Mouse(MouseReport::movement(dx, dy)));
    }
}
