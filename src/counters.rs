//! Run-time counters shown on the status display.
//!
//! Incremented from both the wireless write path (raw keys) and the
//! dispatcher (queued text, pointer nudges), so they are atomics. They
//! only ever grow and start at zero on every boot.

use core::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug, Default)]
pub struct Counters {
    keys_sent: AtomicU32,
    motions_performed: AtomicU32,
}

impl Counters {
    pub const fn new() -> Self {
        Self {
            keys_sent: AtomicU32::new(0),
            motions_performed: AtomicU32::new(0),
        }
    }

    pub fn record_key(&self) {
        self.keys_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_motion(&self) {
        self.motions_performed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn keys_sent(&self) -> u32 {
        self.keys_sent.load(Ordering::Relaxed)
    }

    pub fn motions_performed(&self) -> u32 {
        self.motions_performed.load(Ordering::Relaxed)
    }
}
