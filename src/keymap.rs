//! HID keyboard usage codes ⇄ key actions.
//!
//! Two directions are needed:
//!
//! - **Inbound** (`translate`): a raw key write from the wireless peer
//!   carries a USB HID usage code plus a modifier bitmask. The usage is
//!   mapped to an ASCII character, a control character, or a named
//!   special key. Unknown codes map to [`KeyAction::Unmapped`].
//! - **Outbound** (`ascii_to_usage`): typing a character on the host
//!   means finding the usage code (and whether Shift must be held) that
//!   produces it on a US layout.
//!
//! Modifier bitmask (byte 0 of a raw key write, same as a boot keyboard report):
//! ```text
//! Bit 0 = Left Ctrl,  Bit 1 = Left Shift,
//! Bit 2 = Left Alt,   Bit 3 = Left GUI,
//! Bit 4 = Right Ctrl, Bit 5 = Right Shift,
//! Bit 6 = Right Alt,  Bit 7 = Right GUI
//! ```

use crate::error::Error;

/// Usage code of the first letter key (`a`).
const USAGE_A: u8 = 0x04;
const USAGE_Z: u8 = 0x1D;
/// Usage code of the `1` key; `2`..`9` follow, then `0` at 0x27.
const USAGE_1: u8 = 0x1E;
const USAGE_9: u8 = 0x26;
const USAGE_0: u8 = 0x27;
const USAGE_ENTER: u8 = 0x28;
const USAGE_BACKSPACE: u8 = 0x2A;
const USAGE_TAB: u8 = 0x2B;
const USAGE_SPACE: u8 = 0x2C;
const USAGE_F1: u8 = 0x3A;

/// ASCII backspace.
const BACKSPACE: u8 = 0x08;

/// Shifted digit row, `1` through `9`.
const SHIFTED_DIGITS: [u8; 9] = *b"!@#$%^&*(";

/// Punctuation keys: `(usage, unshifted, shifted)`.
const PUNCTUATION: [(u8, u8, u8); 11] = [
    (0x2D, b'-', b'_'),
    (0x2E, b'=', b'+'),
    (0x2F, b'[', b'{'),
    (0x30, b']', b'}'),
    (0x31, b'\\', b'|'),
    (0x33, b';', b':'),
    (0x34, b'\'', b'"'),
    (0x35, b'`', b'~'),
    (0x36, b',', b'<'),
    (0x37, b'.', b'>'),
    (0x38, b'/', b'?'),
];

// Modifiers

/// Modifier bitmask as sent by the wireless peer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Modifiers(pub u8);

impl Modifiers {
    pub const LEFT_CTRL: u8 = 0x01;
    pub const LEFT_SHIFT: u8 = 0x02;
    pub const LEFT_ALT: u8 = 0x04;
    pub const LEFT_GUI: u8 = 0x08;
    pub const RIGHT_CTRL: u8 = 0x10;
    pub const RIGHT_SHIFT: u8 = 0x20;
    pub const RIGHT_ALT: u8 = 0x40;
    pub const RIGHT_GUI: u8 = 0x80;

    pub const fn ctrl(self) -> bool {
        self.0 & (Self::LEFT_CTRL | Self::RIGHT_CTRL) != 0
    }

    pub const fn shift(self) -> bool {
        self.0 & (Self::LEFT_SHIFT | Self::RIGHT_SHIFT) != 0
    }

    pub const fn alt(self) -> bool {
        self.0 & (Self::LEFT_ALT | Self::RIGHT_ALT) != 0
    }

    pub const fn gui(self) -> bool {
        self.0 & (Self::LEFT_GUI | Self::RIGHT_GUI) != 0
    }

    /// Logical modifiers held, left/right collapsed, in press order.
    pub fn held(self) -> impl Iterator<Item = Modifier> {
        [
            (self.ctrl(), Modifier::Ctrl),
            (self.alt(), Modifier::Alt),
            (self.gui(), Modifier::Gui),
            (self.shift(), Modifier::Shift),
        ]
        .into_iter()
        .filter_map(|(held, m)| held.then_some(m))
    }
}

/// One logical modifier key. Always pressed as its left-hand variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Modifier {
    Ctrl,
    Alt,
    Gui,
    Shift,
}

impl Modifier {
    /// Bit of this modifier in a keyboard report.
    pub const fn bit(self) -> u8 {
        match self {
            Modifier::Ctrl => Modifiers::LEFT_CTRL,
            Modifier::Alt => Modifiers::LEFT_ALT,
            Modifier::Gui => Modifiers::LEFT_GUI,
            Modifier::Shift => Modifiers::LEFT_SHIFT,
        }
    }
}

// Key actions

/// Named non-printing keys reachable over the raw key path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpecialKey {
    Right,
    Left,
    Down,
    Up,
    Insert,
    Home,
    PageUp,
    Delete,
    End,
    PageDown,
    /// F1..=F12.
    Function(u8),
    Escape,
    CapsLock,
}

impl SpecialKey {
    /// Look up the special key for a usage code.
    pub const fn from_usage(usage: u8) -> Option<Self> {
        let key = match usage {
            0x4F => SpecialKey::Right,
            0x50 => SpecialKey::Left,
            0x51 => SpecialKey::Down,
            0x52 => SpecialKey::Up,
            0x49 => SpecialKey::Insert,
            0x4A => SpecialKey::Home,
            0x4B => SpecialKey::PageUp,
            0x4C => SpecialKey::Delete,
            0x4D => SpecialKey::End,
            0x4E => SpecialKey::PageDown,
            0x3A..=0x45 => SpecialKey::Function(usage - USAGE_F1 + 1),
            0x29 => SpecialKey::Escape,
            0x39 => SpecialKey::CapsLock,
            _ => return None,
        };
        Some(key)
    }

    /// USB HID usage code that produces this key.
    pub const fn usage(self) -> u8 {
        match self {
            SpecialKey::Right => 0x4F,
            SpecialKey::Left => 0x50,
            SpecialKey::Down => 0x51,
            SpecialKey::Up => 0x52,
            SpecialKey::Insert => 0x49,
            SpecialKey::Home => 0x4A,
            SpecialKey::PageUp => 0x4B,
            SpecialKey::Delete => 0x4C,
            SpecialKey::End => 0x4D,
            SpecialKey::PageDown => 0x4E,
            SpecialKey::Function(n) => USAGE_F1 + n - 1,
            SpecialKey::Escape => 0x29,
            SpecialKey::CapsLock => 0x39,
        }
    }
}

/// Result of translating a usage code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyAction {
    /// Printable ASCII or one of `\n`, `\t`, backspace, space.
    Char(u8),
    Special(SpecialKey),
    /// No output for this code.
    Unmapped,
}

/// Something that can be pressed on the host keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Key {
    Char(u8),
    Special(SpecialKey),
    Modifier(Modifier),
}

/// Translate a usage code into a key action. Total: unknown codes are
/// [`KeyAction::Unmapped`], never an error.
pub fn translate(usage: u8, shift: bool) -> KeyAction {
    if let Some(key) = SpecialKey::from_usage(usage) {
        return KeyAction::Special(key);
    }
    match usage_to_ascii(usage, shift) {
        Some(c) => KeyAction::Char(c),
        None => KeyAction::Unmapped,
    }
}

fn usage_to_ascii(usage: u8, shift: bool) -> Option<u8> {
    match usage {
        USAGE_A..=USAGE_Z => {
            let c = b'a' + (usage - USAGE_A);
            Some(if shift { c.to_ascii_uppercase() } else { c })
        }
        USAGE_1..=USAGE_9 => {
            let idx = usage - USAGE_1;
            Some(if shift {
                SHIFTED_DIGITS[idx as usize]
            } else {
                b'1' + idx
            })
        }
        USAGE_0 => Some(if shift { b')' } else { b'0' }),
        USAGE_ENTER => Some(b'\n'),
        USAGE_BACKSPACE => Some(BACKSPACE),
        USAGE_TAB => Some(b'\t'),
        USAGE_SPACE => Some(b' '),
        _ => PUNCTUATION
            .iter()
            .find(|(u, _, _)| *u == usage)
            .map(|&(_, plain, shifted)| if shift { shifted } else { plain }),
    }
}

/// Usage code and Shift requirement that type `c` on a US layout.
pub fn ascii_to_usage(c: u8) -> Option<(u8, bool)> {
    match c {
        b'a'..=b'z' => Some((USAGE_A + (c - b'a'), false)),
        b'A'..=b'Z' => Some((USAGE_A + (c - b'A'), true)),
        b'1'..=b'9' => Some((USAGE_1 + (c - b'1'), false)),
        b'0' => Some((USAGE_0, false)),
        b')' => Some((USAGE_0, true)),
        b'\n' => Some((USAGE_ENTER, false)),
        BACKSPACE => Some((USAGE_BACKSPACE, false)),
        b'\t' => Some((USAGE_TAB, false)),
        b' ' => Some((USAGE_SPACE, false)),
        _ => {
            if let Some(idx) = SHIFTED_DIGITS.iter().position(|&s| s == c) {
                return Some((USAGE_1 + idx as u8, true));
            }
            PUNCTUATION.iter().find_map(|&(usage, plain, shifted)| {
                if c == plain {
                    Some((usage, false))
                } else if c == shifted {
                    Some((usage, true))
                } else {
                    None
                }
            })
        }
    }
}

// Raw key writes

/// A decoded raw key write: `[modifiers, usage, ..]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawKeyEvent {
    pub modifiers: Modifiers,
    pub usage: u8,
}

impl RawKeyEvent {
    /// Decode a raw key write. Bytes past the second are ignored.
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        match data {
            [modifiers, usage, ..] => Ok(Self {
                modifiers: Modifiers(*modifiers),
                usage: *usage,
            }),
            _ => Err(Error::RawKeyTooShort(data.len())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ════════════════════════════════════════════════════════════════════════
    // translate
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn translate_letters() {
        assert_eq!(translate(0x04, false), KeyAction::Char(b'a'));
        assert_eq!(translate(0x04, true), KeyAction::Char(b'A'));
        assert_eq!(translate(0x1D, false), KeyAction::Char(b'z'));
        assert_eq!(translate(0x1D, true), KeyAction::Char(b'Z'));
    }

    #[test]
    fn translate_digit_row() {
        assert_eq!(translate(0x1E, false), KeyAction::Char(b'1'));
        assert_eq!(translate(0x1E, true), KeyAction::Char(b'!'));
        assert_eq!(translate(0x26, true), KeyAction::Char(b'('));
        assert_eq!(translate(0x27, false), KeyAction::Char(b'0'));
        assert_eq!(translate(0x27, true), KeyAction::Char(b')'));
    }

    #[test]
    fn translate_control_characters() {
        assert_eq!(translate(0x28, false), KeyAction::Char(b'\n'));
        assert_eq!(translate(0x2A, false), KeyAction::Char(0x08));
        assert_eq!(translate(0x2B, true), KeyAction::Char(b'\t'));
        assert_eq!(translate(0x2C, false), KeyAction::Char(b' '));
    }

    #[test]
    fn translate_punctuation_pairs() {
        assert_eq!(translate(0x2D, false), KeyAction::Char(b'-'));
        assert_eq!(translate(0x2D, true), KeyAction::Char(b'_'));
        assert_eq!(translate(0x31, true), KeyAction::Char(b'|'));
        assert_eq!(translate(0x34, true), KeyAction::Char(b'"'));
        assert_eq!(translate(0x38, false), KeyAction::Char(b'/'));
        // 0x32 (non-US #) has no mapping.
        assert_eq!(translate(0x32, false), KeyAction::Unmapped);
    }

    #[test]
    fn translate_special_keys() {
        assert_eq!(translate(0x4F, false), KeyAction::Special(SpecialKey::Right));
        assert_eq!(translate(0x52, true), KeyAction::Special(SpecialKey::Up));
        assert_eq!(translate(0x4C, false), KeyAction::Special(SpecialKey::Delete));
        assert_eq!(translate(0x3A, false), KeyAction::Special(SpecialKey::Function(1)));
        assert_eq!(translate(0x45, false), KeyAction::Special(SpecialKey::Function(12)));
        assert_eq!(translate(0x29, false), KeyAction::Special(SpecialKey::Escape));
        assert_eq!(translate(0x39, false), KeyAction::Special(SpecialKey::CapsLock));
    }

    #[test]
    fn translate_unknown_is_unmapped() {
        assert_eq!(translate(0xFF, false), KeyAction::Unmapped);
        assert_eq!(translate(0x00, true), KeyAction::Unmapped);
        assert_eq!(translate(0xE0, false), KeyAction::Unmapped);
    }

    #[test]
    fn special_key_usage_is_inverse_of_lookup() {
        for usage in 0..=u8::MAX {
            if let Some(key) = SpecialKey::from_usage(usage) {
                assert_eq!(key.usage(), usage);
            }
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // ascii_to_usage
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn ascii_to_usage_letters_and_case() {
        assert_eq!(ascii_to_usage(b'a'), Some((0x04, false)));
        assert_eq!(ascii_to_usage(b'Q'), Some((0x14, true)));
    }

    #[test]
    fn ascii_to_usage_symbols() {
        assert_eq!(ascii_to_usage(b'!'), Some((0x1E, true)));
        assert_eq!(ascii_to_usage(b')'), Some((0x27, true)));
        assert_eq!(ascii_to_usage(b'~'), Some((0x35, true)));
        assert_eq!(ascii_to_usage(b'\\'), Some((0x31, false)));
        assert_eq!(ascii_to_usage(b'\n'), Some((0x28, false)));
        assert_eq!(ascii_to_usage(b'\t'), Some((0x2B, false)));
    }

    #[test]
    fn ascii_to_usage_rejects_non_printing() {
        assert_eq!(ascii_to_usage(b'\r'), None);
        assert_eq!(ascii_to_usage(0x7F), None);
        assert_eq!(ascii_to_usage(0xC2), None);
    }

    #[test]
    fn every_printable_ascii_round_trips_through_translate() {
        for c in 0x20u8..=0x7E {
            let (usage, shift) = ascii_to_usage(c).unwrap();
            assert_eq!(translate(usage, shift), KeyAction::Char(c), "char {:#x}", c);
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Modifiers / raw key writes
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn modifiers_collapse_left_and_right() {
        let m = Modifiers(Modifiers::RIGHT_CTRL | Modifiers::LEFT_SHIFT);
        assert!(m.ctrl());
        assert!(m.shift());
        assert!(!m.alt());
        assert!(!m.gui());
    }

    #[test]
    fn modifiers_held_in_press_order() {
        let all: heapless::Vec<Modifier, 4> = Modifiers(0xFF).held().collect();
        assert_eq!(
            all.as_slice(),
            &[Modifier::Ctrl, Modifier::Alt, Modifier::Gui, Modifier::Shift]
        );
        assert_eq!(Modifiers(0).held().count(), 0);
    }

    #[test]
    fn raw_key_event_parse() {
        let ev = RawKeyEvent::parse(&[0x01, 0x06]).unwrap();
        assert!(ev.modifiers.ctrl());
        assert_eq!(ev.usage, 0x06);

        // Extra bytes are ignored.
        let ev = RawKeyEvent::parse(&[0x00, 0x04, 0xFF, 0xFF]).unwrap();
        assert_eq!(ev.usage, 0x04);
    }

    #[test]
    fn raw_key_event_too_short() {
        assert_eq!(RawKeyEvent::parse(&[]), Err(Error::RawKeyTooShort(0)));
        assert_eq!(RawKeyEvent::parse(&[0x02]), Err(Error::RawKeyTooShort(1)));
    }
}
