//! Host-testable core of keybridge.
//!
//! Everything that decides *what* the device does lives here: the
//! wrapping clock, the key maps, the text queue, the mode machine and
//! the dispatcher. None of it touches hardware; time comes in as a
//! millisecond counter, randomness through `rand_core::RngCore`, and
//! output goes through the [`relay::HidOutput`] and
//! [`dispatch::StatusDisplay`] traits.
//!
//! Usage: `cargo test --lib` (host) or `cargo test` for the integration
//! scenarios as well.
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main],
//! built with `--features embedded` for the nRF52840 target.

#![cfg_attr(not(test), no_std)]

// ═══════════════════════════════════════════════════════════════════════════
// Foundations
// ═══════════════════════════════════════════════════════════════════════════

pub mod clock;
pub mod config;
pub mod error;

// ═══════════════════════════════════════════════════════════════════════════
// Input side: key maps, text queue
// ═══════════════════════════════════════════════════════════════════════════

pub mod keymap;
pub mod queue;

// ═══════════════════════════════════════════════════════════════════════════
// Output side: relay paths, HID reports
// ═══════════════════════════════════════════════════════════════════════════

pub mod counters;
pub mod hid;
pub mod relay;

// ═══════════════════════════════════════════════════════════════════════════
// Scheduling: mode machine, dispatcher
// ═══════════════════════════════════════════════════════════════════════════

pub mod dispatch;
pub mod mode;

pub use error::{BleError, Error};
