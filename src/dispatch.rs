//! Polling dispatcher - one non-blocking step per tick.
//!
//! Each [`Dispatcher::tick`] runs, in order:
//!
//! 1. the link edge reported since the previous tick, if any;
//! 2. one character from the text queue, if the pacing interval allows;
//! 3. otherwise the pointer nudge, if the mode machine permits it;
//! 4. a display refresh, if the refresh interval has elapsed.
//!
//! Time is injected by the caller, so the whole schedule can be driven
//! from tests with a fake clock.

use rand_core::RngCore;

use crate::clock::{elapsed, is_due, Millis};
use crate::config::{CHAR_PACING_MS, DISPLAY_REFRESH_MS, MOTION_FLASH_MS, MOTION_STEP_PX};
use crate::counters::Counters;
use crate::mode::{DelayRange, ModeMachine, OperatingMode};
use crate::queue::TextReader;
use crate::relay::{self, HidOutput};

/// Wireless link edge, posted by the BLE stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    Connected,
    Disconnected,
}

/// Scheduling thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    pub char_pacing_ms: Millis,
    pub refresh_ms: Millis,
    pub motion_flash_ms: Millis,
    pub motion_delay: DelayRange,
    pub motion_step: i8,
}

impl Timing {
    pub const DEFAULT: Self = Self {
        char_pacing_ms: CHAR_PACING_MS,
        refresh_ms: DISPLAY_REFRESH_MS,
        motion_flash_ms: MOTION_FLASH_MS,
        motion_delay: DelayRange::DEFAULT,
        motion_step: MOTION_STEP_PX,
    };
}

impl Default for Timing {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Which status screen should be up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Screen {
    /// Idle mouse-mover view.
    Motion,
    /// Keyboard-bridge view; also shown while queued text is still typing.
    Bridge,
}

/// Everything the status display may show.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ObservableState {
    pub mode: OperatingMode,
    pub screen: Screen,
    pub uptime_ms: Millis,
    pub countdown_remaining_ms: Millis,
    pub countdown_total_ms: Millis,
    pub keys_sent: u32,
    pub motions_performed: u32,
    pub queue_len: usize,
    pub queue_capacity: usize,
    /// A nudge happened within the last `motion_flash_ms`.
    pub motion_flash: bool,
    /// Something host-visible happened since the previous render.
    pub dirty: bool,
}

/// Display collaborator. Formatting and drawing are its business.
pub trait StatusDisplay {
    fn render(&mut self, state: &ObservableState);
}

pub struct Dispatcher<'a, R, const N: usize> {
    machine: ModeMachine,
    reader: TextReader<'a, N>,
    counters: &'a Counters,
    rng: R,
    timing: Timing,
    started_at: Millis,
    last_char_at: Option<Millis>,
    last_refresh_at: Option<Millis>,
    last_motion_at: Option<Millis>,
    dirty: bool,
}

impl<'a, R: RngCore, const N: usize> Dispatcher<'a, R, N> {
    /// Start in autonomous mode at `now` with a freshly drawn countdown.
    pub fn new(
        reader: TextReader<'a, N>,
        counters: &'a Counters,
        mut rng: R,
        timing: Timing,
        now: Millis,
    ) -> Self {
        let first_delay = timing.motion_delay.draw(&mut rng);
        Self {
            machine: ModeMachine::new(now, first_delay),
            reader,
            counters,
            rng,
            timing,
            started_at: now,
            last_char_at: None,
            last_refresh_at: None,
            last_motion_at: None,
            dirty: true,
        }
    }

    pub fn mode(&self) -> OperatingMode {
        self.machine.mode()
    }

    pub fn machine(&self) -> &ModeMachine {
        &self.machine
    }

    pub fn queue_len(&self) -> usize {
        self.reader.len()
    }

    /// Run one scheduler step. Never blocks.
    pub fn tick<O, D>(
        &mut self,
        now: Millis,
        link: Option<LinkEvent>,
        out: &mut O,
        display: &mut D,
    ) where
        O: HidOutput,
        D: StatusDisplay,
    {
        if let Some(event) = link {
            self.on_link_event(event, now);
        }

        let queue_empty = self.reader.is_empty();
        if !queue_empty {
            self.type_next(now, out);
        } else if self.machine.motion_permitted(now, queue_empty) {
            self.nudge_pointer(now, out);
        }

        let refresh_due = self
            .last_refresh_at
            .map_or(true, |last| is_due(last, now, self.timing.refresh_ms));
        if refresh_due {
            display.render(&self.snapshot(now));
            self.last_refresh_at = Some(now);
            self.dirty = false;
        }
    }

    fn on_link_event(&mut self, event: LinkEvent, now: Millis) {
        let changed = match event {
            LinkEvent::Connected => self.machine.on_peer_connected(now),
            LinkEvent::Disconnected => {
                let range = self.timing.motion_delay;
                let rng = &mut self.rng;
                self.machine.on_peer_disconnected(now, || range.draw(rng))
            }
        };
        self.dirty |= changed;
    }

    fn type_next<O: HidOutput>(&mut self, now: Millis, out: &mut O) {
        let pacing_ok = self
            .last_char_at
            .map_or(true, |last| is_due(last, now, self.timing.char_pacing_ms));
        if !pacing_ok {
            return;
        }

        if let Some(c) = self.reader.dequeue_one() {
            relay::type_char(out, c);
            self.counters.record_key();
            self.last_char_at = Some(now);
            self.dirty = true;
        }
    }

    fn nudge_pointer<O: HidOutput>(&mut self, now: Millis, out: &mut O) {
        let step = self.timing.motion_step;
        out.move_pointer(step, 0);
        out.move_pointer(-step, 0);
        self.counters.record_motion();

        #[cfg(feature = "defmt")]
        defmt::info!("Pointer nudged (count: {})", self.counters.motions_performed());

        let next_delay = self.timing.motion_delay.draw(&mut self.rng);
        self.machine.record_motion(now, next_delay);
        self.last_motion_at = Some(now);
        self.dirty = true;
    }

    /// Current observable state.
    pub fn snapshot(&self, now: Millis) -> ObservableState {
        let mode = self.machine.mode();
        let queue_len = self.reader.len();
        let screen = if queue_len > 0 || mode == OperatingMode::BridgeActive {
            Screen::Bridge
        } else {
            Screen::Motion
        };

        ObservableState {
            mode,
            screen,
            uptime_ms: elapsed(self.started_at, now),
            countdown_remaining_ms: self.machine.remaining(now),
            countdown_total_ms: self.machine.countdown().next_delay,
            keys_sent: self.counters.keys_sent(),
            motions_performed: self.counters.motions_performed(),
            queue_len,
            queue_capacity: self.reader.capacity(),
            motion_flash: self
                .last_motion_at
                .is_some_and(|at| elapsed(at, now) < self.timing.motion_flash_ms),
            dirty: self.dirty,
        }
    }
}
