//! Wrapping millisecond clock arithmetic.
//!
//! All scheduling runs off a free-running `u32` millisecond counter that
//! wraps roughly every 49.7 days. Every periodic action is expressed as
//! "due when `elapsed(last, now) >= interval`", so nothing here ever
//! sleeps and tests can drive time by hand.

/// Raw reading of the monotonic millisecond counter.
pub type Millis = u32;

/// Milliseconds from `start` to `now`, correct across one counter wrap.
///
/// Callers must not span more than one wrap period; at millisecond
/// resolution that is ~49 days between two observations.
pub const fn elapsed(start: Millis, now: Millis) -> Millis {
    if now >= start {
        now - start
    } else {
        (Millis::MAX - start) + now + 1
    }
}

/// Returns `true` once at least `interval` ms have passed since `last`.
pub const fn is_due(last: Millis, now: Millis, interval: Millis) -> bool {
    elapsed(last, now) >= interval
}

/// Split a duration in milliseconds into `(hours, minutes, seconds)`.
pub const fn hms(ms: Millis) -> (u32, u32, u32) {
    let secs = ms / 1000;
    (secs / 3600, (secs % 3600) / 60, secs % 60)
}
