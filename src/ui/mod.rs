//! User interface subsystem - SSD1306 status display.
//!
//! The dispatcher calls [`display::StatusScreen`] through the
//! `StatusDisplay` seam on its refresh interval. The latest text preview
//! is written from the GATT callback and read at render time, so it sits
//! behind a critical-section mutex.

pub mod display;

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::String;
use keybridge::config::TEXT_PREVIEW_LEN;

pub type Preview = String<TEXT_PREVIEW_LEN>;

static LAST_TEXT: Mutex<CriticalSectionRawMutex, RefCell<Preview>> =
    Mutex::new(RefCell::new(String::new()));

pub fn set_last_text(preview: Preview) {
    LAST_TEXT.lock(|cell| *cell.borrow_mut() = preview);
}

pub fn last_text() -> Preview {
    LAST_TEXT.lock(|cell| cell.borrow().clone())
}
