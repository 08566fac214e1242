//! Operating mode state machine.
//!
//! ```text
//!                  peer connected
//!   AutonomousMotion ───────────────▶ BridgeActive
//!          ▲                               │
//!          └───────────────────────────────┘
//!                 peer disconnected
//! ```
//!
//! The machine owns the idle countdown. Connecting freezes it (the time
//! left is captured once, at the edge); disconnecting resumes it from the
//! disconnect timestamp with whatever was left, or with a fresh random
//! delay when nothing was left. Transitions are edge-triggered: a repeated
//! connect or disconnect for the state we are already in is ignored.

use rand_core::RngCore;

use crate::clock::{self, elapsed, Millis};
use crate::config::{MOTION_DELAY_MAX_MS, MOTION_DELAY_MIN_MS};

/// Current operating mode. Starts in [`OperatingMode::AutonomousMotion`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatingMode {
    /// No peer: nudge the pointer on a randomised countdown.
    AutonomousMotion,
    /// Peer connected: relay queued text and raw keys.
    BridgeActive,
}

/// Inclusive range for the randomised delay between pointer nudges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: Millis,
    pub max_ms: Millis,
}

impl DelayRange {
    pub const DEFAULT: Self = Self {
        min_ms: MOTION_DELAY_MIN_MS,
        max_ms: MOTION_DELAY_MAX_MS,
    };

    /// Draw a delay uniformly-ish from `[min_ms, max_ms]`.
    pub fn draw<R: RngCore>(&self, rng: &mut R) -> Millis {
        let raw = rng.next_u32();
        let delay = match (self.max_ms - self.min_ms).checked_add(1) {
            Some(span) => self.min_ms + raw % span,
            None => raw,
        };
        #[cfg(feature = "defmt")]
        defmt::debug!("Next pointer nudge in {} ms ({} s)", delay, delay / 1000);
        delay
    }
}

/// Idle countdown bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Countdown {
    /// Start of the current countdown (last nudge, boot, or disconnect).
    pub last_action: Millis,
    /// Length of the current countdown.
    pub next_delay: Millis,
    /// Time that was left when the countdown was frozen by a connect.
    pub paused_remaining: Millis,
}

impl Countdown {
    /// Time left before the next nudge, zero once due.
    pub fn remaining(&self, now: Millis) -> Millis {
        self.next_delay.saturating_sub(elapsed(self.last_action, now))
    }

    pub fn is_due(&self, now: Millis) -> bool {
        clock::is_due(self.last_action, now, self.next_delay)
    }
}

/// Mode + countdown, mutated only through its transition methods.
#[derive(Clone, Debug)]
pub struct ModeMachine {
    mode: OperatingMode,
    countdown: Countdown,
}

impl ModeMachine {
    /// Start in autonomous mode with a countdown of `first_delay` from `now`.
    pub const fn new(now: Millis, first_delay: Millis) -> Self {
        Self {
            mode: OperatingMode::AutonomousMotion,
            countdown: Countdown {
                last_action: now,
                next_delay: first_delay,
                paused_remaining: 0,
            },
        }
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    /// Peer connected: freeze the countdown and switch to bridge mode.
    ///
    /// Returns `false` (and changes nothing) if already in bridge mode.
    pub fn on_peer_connected(&mut self, now: Millis) -> bool {
        if self.mode == OperatingMode::BridgeActive {
            #[cfg(feature = "defmt")]
            defmt::warn!("Ignoring connect edge: bridge already active");
            return false;
        }

        self.countdown.paused_remaining = self.countdown.remaining(now);
        self.mode = OperatingMode::BridgeActive;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "Peer connected - bridge mode (countdown paused, {} ms left)",
            self.countdown.paused_remaining
        );
        true
    }

    /// Peer disconnected: resume the countdown from `now`.
    ///
    /// `fresh_delay` is only called when the frozen countdown had already
    /// run out. Returns `false` (and changes nothing) if already autonomous.
    pub fn on_peer_disconnected(
        &mut self,
        now: Millis,
        fresh_delay: impl FnOnce() -> Millis,
    ) -> bool {
        if self.mode == OperatingMode::AutonomousMotion {
            #[cfg(feature = "defmt")]
            defmt::warn!("Ignoring disconnect edge: already autonomous");
            return false;
        }

        self.countdown.last_action = now;
        self.countdown.next_delay = if self.countdown.paused_remaining > 0 {
            self.countdown.paused_remaining
        } else {
            fresh_delay()
        };
        self.mode = OperatingMode::AutonomousMotion;

        #[cfg(feature = "defmt")]
        defmt::info!(
            "Peer disconnected - autonomous mode (next nudge in {} ms)",
            self.countdown.next_delay
        );
        true
    }

    /// Arbitration: a nudge may fire only in autonomous mode, with no text
    /// pending, once the countdown has elapsed.
    pub fn motion_permitted(&self, now: Millis, queue_empty: bool) -> bool {
        self.mode == OperatingMode::AutonomousMotion && queue_empty && self.countdown.is_due(now)
    }

    /// A nudge was performed at `now`; start the next countdown.
    pub fn record_motion(&mut self, now: Millis, next_delay: Millis) {
        self.countdown.last_action = now;
        self.countdown.next_delay = next_delay;
    }

    /// Countdown time left as the user sees it: frozen while bridged.
    pub fn remaining(&self, now: Millis) -> Millis {
        match self.mode {
            OperatingMode::AutonomousMotion => self.countdown.remaining(now),
            OperatingMode::BridgeActive => self.countdown.paused_remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// RNG that returns a fixed sequence of `next_u32` values.
    struct Script<'a>(&'a [u32]);

    impl RngCore for Script<'_> {
        fn next_u32(&mut self) -> u32 {
            let (first, rest) = self.0.split_first().expect("script exhausted");
            self.0 = rest;
            *first
        }
        fn next_u64(&mut self) -> u64 {
            u64::from(self.next_u32())
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // DelayRange
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn delay_stays_in_range() {
        let range = DelayRange::DEFAULT;
        let mut rng = Script(&[0, 53_000, 53_001, u32::MAX, 12_345_678]);
        for _ in 0..5 {
            let d = range.draw(&mut rng);
            assert!((7_000..=60_000).contains(&d), "{}", d);
        }
    }

    #[test]
    fn delay_hits_both_ends() {
        let range = DelayRange::DEFAULT;
        assert_eq!(range.draw(&mut Script(&[0])), 7_000);
        assert_eq!(range.draw(&mut Script(&[53_000])), 60_000);
        assert_eq!(range.draw(&mut Script(&[53_001])), 7_000);
    }

    #[test]
    fn delay_full_range_does_not_overflow() {
        let range = DelayRange {
            min_ms: 0,
            max_ms: u32::MAX,
        };
        assert_eq!(range.draw(&mut Script(&[u32::MAX])), u32::MAX);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Transitions
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn starts_autonomous() {
        let m = ModeMachine::new(100, 7_000);
        assert_eq!(m.mode(), OperatingMode::AutonomousMotion);
        assert_eq!(m.countdown().last_action, 100);
        assert_eq!(m.countdown().next_delay, 7_000);
        assert_eq!(m.remaining(100), 7_000);
    }

    #[test]
    fn pause_and_resume_keeps_remaining_time() {
        let mut m = ModeMachine::new(0, 10_000);
        assert!(m.on_peer_connected(4_000));
        assert_eq!(m.mode(), OperatingMode::BridgeActive);
        assert_eq!(m.countdown().paused_remaining, 6_000);

        assert!(m.on_peer_disconnected(4_001, || panic!("no fresh delay needed")));
        assert_eq!(m.mode(), OperatingMode::AutonomousMotion);
        assert_eq!(m.countdown().next_delay, 6_000);
        assert_eq!(m.countdown().last_action, 4_001);
        assert_eq!(m.remaining(4_001), 6_000);
    }

    #[test]
    fn countdown_is_frozen_while_bridged() {
        let mut m = ModeMachine::new(0, 10_000);
        m.on_peer_connected(3_000);
        assert_eq!(m.remaining(3_000), 7_000);
        assert_eq!(m.remaining(500_000), 7_000);
        assert!(!m.motion_permitted(500_000, true));
        assert_eq!(m.countdown().paused_remaining, 7_000);
    }

    #[test]
    fn expired_countdown_draws_fresh_delay_on_resume() {
        let mut m = ModeMachine::new(0, 5_000);
        m.on_peer_connected(9_000);
        assert_eq!(m.countdown().paused_remaining, 0);

        m.on_peer_disconnected(20_000, || 33_000);
        assert_eq!(m.countdown().next_delay, 33_000);
        assert_eq!(m.countdown().last_action, 20_000);
    }

    #[test]
    fn duplicate_edges_are_ignored() {
        let mut m = ModeMachine::new(0, 10_000);
        assert!(!m.on_peer_disconnected(1_000, || 1));
        assert_eq!(m.countdown().next_delay, 10_000);

        assert!(m.on_peer_connected(2_000));
        // A second connect must not recompute the frozen remainder.
        assert!(!m.on_peer_connected(9_000));
        assert_eq!(m.countdown().paused_remaining, 8_000);
    }

    #[test]
    fn connect_across_clock_wrap() {
        let start = Millis::MAX - 999;
        let mut m = ModeMachine::new(start, 10_000);
        // 3000 ms after start, the counter has wrapped.
        m.on_peer_connected(2_000);
        assert_eq!(m.countdown().paused_remaining, 7_000);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Arbitration
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn motion_requires_empty_queue_and_elapsed_countdown() {
        let mut m = ModeMachine::new(0, 7_000);
        assert!(!m.motion_permitted(6_999, true));
        assert!(m.motion_permitted(7_000, true));
        assert!(!m.motion_permitted(7_000, false));

        m.record_motion(7_000, 20_000);
        assert!(!m.motion_permitted(7_001, true));
        assert!(m.motion_permitted(27_000, true));
    }
}
