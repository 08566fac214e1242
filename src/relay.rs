//! Host-visible key output: the raw key path and single-character typing.
//!
//! Both paths end every event with a full release, so each call is one
//! "press, then release-all" pulse on the host.

use crate::counters::Counters;
use crate::error::Error;
use crate::keymap::{translate, Key, KeyAction, RawKeyEvent};

/// Output transport towards the USB host.
///
/// Calls are synchronous and assumed to succeed; implementations that
/// can back up (e.g. a report channel) drop and log instead of blocking,
/// but never drop the release that ends a pulse.
pub trait HidOutput {
    fn press(&mut self, key: Key);
    fn release_all(&mut self);
    fn move_pointer(&mut self, dx: i8, dy: i8);
}

/// Relay one decoded raw key event.
///
/// Modifiers are held in Ctrl, Alt, Gui, Shift order. The usage is sent
/// as a special key when it is one, otherwise as its *unshifted* ASCII
/// character: case and shifted symbols come only from the Shift bit in
/// the modifier byte. Unmapped usages still produce the modifier pulse.
pub fn relay_raw_key<O: HidOutput>(out: &mut O, event: RawKeyEvent, counters: &Counters) {
    for modifier in event.modifiers.held() {
        out.press(Key::Modifier(modifier));
    }

    match translate(event.usage, false) {
        KeyAction::Special(key) => out.press(Key::Special(key)),
        KeyAction::Char(c) => out.press(Key::Char(c)),
        KeyAction::Unmapped => {
            #[cfg(feature = "defmt")]
            defmt::debug!("Raw key usage {=u8:#x} is unmapped", event.usage);
        }
    }

    out.release_all();
    counters.record_key();
}

/// Decode and relay a raw key characteristic write.
///
/// Writes shorter than two bytes are rejected without touching the host.
pub fn relay_raw_write<O: HidOutput>(
    out: &mut O,
    data: &[u8],
    counters: &Counters,
) -> Result<(), Error> {
    let event = RawKeyEvent::parse(data)?;
    relay_raw_key(out, event, counters);
    Ok(())
}

/// Type one character from the text queue.
pub fn type_char<O: HidOutput>(out: &mut O, c: u8) {
    out.press(Key::Char(c));
    out.release_all();
}
