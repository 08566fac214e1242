//! Integration tests for keybridge host-testable logic.
//!
//! These drive the dispatcher with a fake clock, a scripted RNG and the
//! real report builder, and check what the USB host would receive.

use keybridge::clock::Millis;
use keybridge::counters::Counters;
use keybridge::dispatch::{
    Dispatcher, LinkEvent, ObservableState, Screen, StatusDisplay, Timing,
};
use keybridge::hid::mouse::MouseReport;
use keybridge::hid::{HidReport, ReportOutput, ReportSink};
use keybridge::mode::OperatingMode;
use keybridge::queue::TextQueue;
use keybridge::relay;
use rand_core::RngCore;

struct ScriptedRng {
    values: Vec<u32>,
}

impl ScriptedRng {
    /// Yields values that make the default range draw exactly `delays`.
    fn drawing(delays: &[u32]) -> Self {
        Self {
            values: delays.iter().rev().map(|d| d - 7_000).collect(),
        }
    }
}

impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        self.values.pop().expect("RNG script exhausted")
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

#[derive(Default)]
struct HostLog {
    reports: Vec<HidReport>,
}

impl ReportSink for HostLog {
    fn send(&mut self, report: HidReport) {
        self.reports.push(report);
    }
}

impl HostLog {
    /// Usage codes of every keyboard report that had a key down.
    fn typed_usages(&self) -> Vec<u8> {
        self.reports
            .iter()
            .filter_map(|r| match r {
                HidReport::Keyboard(kb) if kb.keycodes[0] != 0 => Some(kb.keycodes[0]),
                _ => None,
            })
            .collect()
    }

    fn mouse_moves(&self) -> Vec<MouseReport> {
        self.reports
            .iter()
            .filter_map(|r| match r {
                HidReport::Mouse(m) => Some(*m),
                _ => None,
            })
            .collect()
    }
}

#[derive(Default)]
struct Frames(Vec<ObservableState>);

impl StatusDisplay for Frames {
    fn render(&mut self, state: &ObservableState) {
        self.0.push(*state);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// End-to-end scenario
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn motion_then_bridge_session_then_resume() {
    let counters = Counters::new();
    let mut queue: TextQueue<4096> = TextQueue::new();
    let (mut writer, reader) = queue.split();
    let rng = ScriptedRng::drawing(&[7_000, 20_000]);
    let mut d = Dispatcher::new(reader, &counters, rng, Timing::DEFAULT, 0);
    let mut out = ReportOutput::new(HostLog::default());
    let mut frames = Frames::default();

    assert_eq!(d.mode(), OperatingMode::AutonomousMotion);
    assert_eq!(d.machine().countdown().next_delay, 7_000);

    // Motion fires at t=7000 and a new delay is drawn.
    d.tick(7_000, None, &mut out, &mut frames);
    assert_eq!(counters.motions_performed(), 1);
    assert_eq!(
        out.sink().mouse_moves(),
        vec![MouseReport::movement(1, 0), MouseReport::movement(-1, 0)]
    );
    assert_eq!(d.machine().countdown().next_delay, 20_000);

    // Connect handled at the motion timestamp: nothing has elapsed yet.
    d.tick(7_000, Some(LinkEvent::Connected), &mut out, &mut frames);
    assert_eq!(d.mode(), OperatingMode::BridgeActive);
    assert_eq!(d.machine().countdown().paused_remaining, 20_000);

    // Text arrives from the peer.
    assert_eq!(writer.enqueue_text(b"hi"), 2);
    assert_eq!(d.queue_len(), 2);

    d.tick(7_010, None, &mut out, &mut frames);
    d.tick(7_012, None, &mut out, &mut frames);
    assert_eq!(d.queue_len(), 0);
    assert_eq!(counters.keys_sent(), 2);
    assert_eq!(out.sink().typed_usages(), vec![0x0B, 0x0C]); // h, i

    // Long bridge session: countdown stays frozen, no motion.
    d.tick(90_000, None, &mut out, &mut frames);
    assert_eq!(d.snapshot(90_000).countdown_remaining_ms, 20_000);
    assert_eq!(counters.motions_performed(), 1);

    // Disconnect: resume with the frozen remainder from the disconnect time.
    d.tick(100_000, Some(LinkEvent::Disconnected), &mut out, &mut frames);
    assert_eq!(d.mode(), OperatingMode::AutonomousMotion);
    assert_eq!(d.machine().countdown().next_delay, 20_000);
    assert_eq!(d.machine().countdown().last_action, 100_000);
    assert!(!d.machine().motion_permitted(119_999, true));
    assert!(d.machine().motion_permitted(120_000, true));
}

#[test]
fn connect_after_motion_freezes_what_is_left() {
    let counters = Counters::new();
    let mut queue: TextQueue<64> = TextQueue::new();
    let (_writer, reader) = queue.split();
    let rng = ScriptedRng::drawing(&[7_000, 20_000]);
    let mut d = Dispatcher::new(reader, &counters, rng, Timing::DEFAULT, 0);
    let mut out = ReportOutput::new(HostLog::default());
    let mut frames = Frames::default();

    d.tick(7_000, None, &mut out, &mut frames);
    d.tick(7_500, Some(LinkEvent::Connected), &mut out, &mut frames);
    assert_eq!(d.machine().countdown().paused_remaining, 19_500);
}

// ═══════════════════════════════════════════════════════════════════════════
// Raw keys alongside queued text
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn raw_key_relay_works_in_any_mode() {
    let counters = Counters::new();
    let mut out = ReportOutput::new(HostLog::default());

    // Shift + '1' → '!' on the host, via the modifier bit only.
    relay::relay_raw_write(&mut out, &[0x02, 0x1E], &counters).unwrap();
    let last_down = out
        .sink()
        .reports
        .iter()
        .rev()
        .find_map(|r| match r {
            HidReport::Keyboard(kb) if kb.keycodes[0] != 0 => Some(*kb),
            _ => None,
        })
        .unwrap();
    assert_eq!(last_down.modifier, 0x02);
    assert_eq!(last_down.keycodes[0], 0x1E);
    assert!(matches!(out.sink().reports.last(), Some(HidReport::Keyboard(kb)) if kb.is_empty()));
    assert_eq!(counters.keys_sent(), 1);

    assert!(relay::relay_raw_write(&mut out, &[0x02], &counters).is_err());
    assert_eq!(counters.keys_sent(), 1);
}

#[test]
fn queued_text_holds_off_motion_until_drained() {
    let counters = Counters::new();
    let mut queue: TextQueue<64> = TextQueue::new();
    let (mut writer, reader) = queue.split();
    let rng = ScriptedRng::drawing(&[7_000, 30_000]);
    let mut d = Dispatcher::new(reader, &counters, rng, Timing::DEFAULT, 0);
    let mut out = ReportOutput::new(HostLog::default());
    let mut frames = Frames::default();

    // Text written without a connect edge (e.g. edge not yet observed).
    writer.enqueue_text("Ok\u{00e9}!".as_bytes());
    let mut now: Millis = 6_999;
    while d.queue_len() > 0 {
        now += 1;
        d.tick(now, None, &mut out, &mut frames);
        assert!(out.sink().mouse_moves().is_empty());
    }
    assert_eq!(counters.keys_sent(), 3);

    d.tick(now + 1, None, &mut out, &mut frames);
    assert_eq!(out.sink().mouse_moves().len(), 2);
    assert_eq!(counters.motions_performed(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// Display collaborator
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn display_sees_bridge_screen_while_connected() {
    let counters = Counters::new();
    let mut queue: TextQueue<64> = TextQueue::new();
    let (_writer, reader) = queue.split();
    let rng = ScriptedRng::drawing(&[45_000]);
    let mut d = Dispatcher::new(reader, &counters, rng, Timing::DEFAULT, 0);
    let mut out = ReportOutput::new(HostLog::default());
    let mut frames = Frames::default();

    d.tick(0, None, &mut out, &mut frames);
    assert_eq!(frames.0.last().unwrap().screen, Screen::Motion);

    d.tick(1_000, Some(LinkEvent::Connected), &mut out, &mut frames);
    let frame = frames.0.last().unwrap();
    assert_eq!(frame.screen, Screen::Bridge);
    assert_eq!(frame.mode, OperatingMode::BridgeActive);
    assert_eq!(frame.countdown_remaining_ms, 44_000);
    assert_eq!(frame.queue_capacity, 63);
    assert!(frame.dirty);
}
