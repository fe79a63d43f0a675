//! Merit engine: the tap/session state machine.
//!
//! Like a wall-clock timer engine, it has no internal threads. Every method
//! takes the caller's monotonic clock in milliseconds, and `tick()` must be
//! called periodically (or at [`MeritEngine::next_deadline`]) so due timers
//! run. Each call applies its whole mutation before returning, so callers
//! that serialise calls never observe a half-applied tap or outcome.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = MeritEngine::new(settings, MeritState::load(db), rng, signals);
//! engine.process_tap(Point::new(120.0, 300.0), false, now_ms);
//! // In a loop:
//! for event in engine.tick(now_ms) { /* render, or spawn oracle requests */ }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::auto_tap::AutoTapDriver;
use super::controller::{Outcome, OutcomeId, SessionController, SessionEnd, SessionPhase};
use super::feedback::{FeedbackItem, FeedbackRegistry};
use super::gate::{DrawDecision, FortuneDrawGate};
use super::watchdog::{InactivityWatchdog, WatchdogState};
use super::{EngineSettings, Point};
use crate::events::Event;
use crate::fortune::FortuneRecord;
use crate::random::RandomSource;
use crate::signals::TapSignals;
use crate::storage::MeritState;

pub const DEFAULT_QUOTE: &str = "心中无事，即是功德。";

/// Tag for an outstanding quote request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteTicket(u64);

impl QuoteTicket {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
struct QuoteState {
    text: String,
    loading: Option<QuoteTicket>,
    next_ticket: u64,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineView {
    pub lifetime_count: u64,
    pub is_golden: bool,
    pub session_count: u64,
    pub session_active: bool,
    pub phase: SessionPhase,
    pub watchdog: WatchdogState,
    pub auto_tap: bool,
    pub sound_enabled: bool,
    pub feedback: Vec<FeedbackItem>,
    pub outcome: Option<Outcome>,
    pub can_view_fortune: bool,
    pub quote: String,
    pub quote_loading: bool,
}

pub struct MeritEngine {
    settings: EngineSettings,
    merit: MeritState,
    session: SessionController,
    feedback: FeedbackRegistry,
    watchdog: InactivityWatchdog,
    auto_tap: AutoTapDriver,
    gate: FortuneDrawGate,
    rng: Box<dyn RandomSource>,
    signals: Box<dyn TapSignals>,
    sound_enabled: bool,
    quote: QuoteState,
}

impl MeritEngine {
    pub fn new(
        settings: EngineSettings,
        merit: MeritState,
        rng: impl RandomSource + 'static,
        signals: impl TapSignals + 'static,
    ) -> Self {
        let mut signals: Box<dyn TapSignals> = Box::new(signals);
        signals.set_sound_enabled(settings.sound_enabled);
        Self {
            session: SessionController::new(settings.significance_threshold),
            feedback: FeedbackRegistry::new(settings.feedback_lifetime_ms),
            watchdog: InactivityWatchdog::new(settings.quiet_interval_ms),
            auto_tap: AutoTapDriver::new(settings.auto_tap_cadence_ms),
            gate: FortuneDrawGate::new(settings.draw),
            sound_enabled: settings.sound_enabled,
            quote: QuoteState {
                text: DEFAULT_QUOTE.to_string(),
                loading: None,
                next_ticket: 0,
            },
            settings,
            merit,
            rng: Box::new(rng),
            signals,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn merit(&self) -> &MeritState {
        &self.merit
    }

    pub fn session(&self) -> &SessionController {
        &self.session
    }

    pub fn feedback(&self) -> &FeedbackRegistry {
        &self.feedback
    }

    pub fn watchdog(&self) -> &InactivityWatchdog {
        &self.watchdog
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.session.outcome()
    }

    pub fn is_auto_tapping(&self) -> bool {
        self.auto_tap.is_enabled()
    }

    pub fn sound_enabled(&self) -> bool {
        self.sound_enabled
    }

    pub fn quote(&self) -> &str {
        &self.quote.text
    }

    /// A last fortune exists and nothing is covering it.
    pub fn can_view_fortune(&self) -> bool {
        self.merit.last_fortune().is_some() && !self.session.is_outcome_open()
    }

    /// Earliest instant at which `tick()` has work to do.
    pub fn next_deadline(&self) -> Option<u64> {
        [
            self.watchdog.due_at(),
            self.auto_tap.due_at(),
            self.feedback.next_expiry(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    pub fn view(&self) -> EngineView {
        let state = self.session.state();
        EngineView {
            lifetime_count: self.merit.lifetime_count(),
            is_golden: self.merit.is_golden(),
            session_count: state.session_count,
            session_active: state.is_active,
            phase: self.session.phase(),
            watchdog: self.watchdog.state(),
            auto_tap: self.auto_tap.is_enabled(),
            sound_enabled: self.sound_enabled,
            feedback: self.feedback.live().cloned().collect(),
            outcome: self.session.outcome().cloned(),
            can_view_fortune: self.can_view_fortune(),
            quote: self.quote.text.clone(),
            quote_loading: self.quote.loading.is_some(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Apply one tap. Manual taps float their marker just above `origin`;
    /// automatic taps ignore `origin` and float above the viewport centre.
    ///
    /// Returns `None` (and changes nothing) while an outcome is open.
    pub fn process_tap(&mut self, origin: Point, is_automatic: bool, now_ms: u64) -> Option<Event> {
        if self.session.is_outcome_open() {
            return None;
        }
        let lifetime_count = self.merit.increment();
        let session_count = self.session.record_tap()?;

        let position = if is_automatic {
            let center = self.settings.viewport_center();
            Point::new(
                center.x + self.rng.offset(self.settings.auto_jitter),
                center.y - self.settings.auto_lift,
            )
        } else {
            Point::new(
                origin.x + self.rng.offset(self.settings.manual_jitter),
                origin.y - self.settings.manual_lift,
            )
        };
        let id = self
            .feedback
            .allocate(position, self.settings.feedback_label.clone(), now_ms);

        if self.sound_enabled {
            self.signals.play_tap_cue();
        }
        let pulse = if is_automatic {
            self.settings.auto_pulse
        } else {
            self.settings.manual_pulse
        };
        if !pulse.is_zero() {
            self.signals.haptic_pulse(pulse);
        }

        self.watchdog.rearm(now_ms);

        let feedback = self.feedback.get(id).cloned()?;
        Some(Event::Tapped {
            automatic: is_automatic,
            lifetime_count,
            session_count,
            feedback,
            at: Utc::now(),
        })
    }

    /// Run every timer due at or before `now_ms`, each at its own deadline.
    pub fn tick(&mut self, now_ms: u64) -> Vec<Event> {
        let mut events = Vec::new();

        loop {
            let watchdog_due = self.watchdog.due_at().filter(|&d| d <= now_ms);
            let auto_due = self.auto_tap.due_at().filter(|&d| d <= now_ms);
            match (watchdog_due, auto_due) {
                (Some(w), a) if a.map_or(true, |a| w <= a) => match self.watchdog.poll(w) {
                    Some(fired_at) => events.extend(self.end_session(fired_at)),
                    None => break,
                },
                (_, Some(a)) => match self.auto_tap.poll(a) {
                    Some(due) => {
                        let center = self.settings.viewport_center();
                        events.extend(self.process_tap(center, true, due));
                    }
                    None => break,
                },
                _ => break,
            }
        }

        for id in self.feedback.expire_due(now_ms) {
            events.push(Event::FeedbackExpired { id, at: Utc::now() });
        }
        events
    }

    /// Dismiss the open outcome.
    pub fn dismiss(&mut self, now_ms: u64) -> Option<Event> {
        let outcome = self.session.dismiss()?;
        if outcome.mode.ends_session() {
            self.watchdog.cancel();
        } else {
            self.auto_tap.resume(now_ms);
        }
        debug!(outcome = outcome.id.get(), mode = ?outcome.mode, "outcome dismissed");
        Some(Event::OutcomeDismissed {
            outcome_id: outcome.id,
            mode: outcome.mode,
            at: Utc::now(),
        })
    }

    /// Re-open the last drawn fortune. `None` when there is none or an
    /// outcome is already open.
    pub fn view_last_fortune(&mut self) -> Option<Event> {
        let outcome = self.session.view_fortune(self.merit.last_fortune())?.clone();
        self.auto_tap.suspend();
        Some(Event::OutcomeRaised {
            outcome,
            at: Utc::now(),
        })
    }

    /// Apply a fortune from the oracle. Results for an outcome that was
    /// dismissed, superseded or already resolved are dropped unapplied.
    pub fn complete_fortune(&mut self, outcome_id: OutcomeId, fortune: FortuneRecord) -> Option<Event> {
        if !self.session.attach_fortune(outcome_id, &fortune) {
            debug!(outcome = outcome_id.get(), "discarding stale fortune");
            return None;
        }
        info!(outcome = outcome_id.get(), fortune_id = fortune.id, luck = %fortune.luck, "fortune revealed");
        let golden_unlocked = self.merit.record_fortune(fortune.clone());
        Some(Event::FortuneRevealed {
            outcome_id,
            fortune,
            golden_unlocked,
            at: Utc::now(),
        })
    }

    /// Flip auto-tap. Rejected while an outcome is open.
    pub fn toggle_auto_tap(&mut self, now_ms: u64) -> Option<Event> {
        if self.session.is_outcome_open() {
            return None;
        }
        if self.auto_tap.is_enabled() {
            self.auto_tap.disable();
        } else {
            self.auto_tap.enable(now_ms);
        }
        if self.session.state().is_active {
            self.watchdog.rearm(now_ms);
        }
        Some(Event::AutoTapToggled {
            enabled: self.auto_tap.is_enabled(),
            at: Utc::now(),
        })
    }

    pub fn toggle_sound(&mut self) -> Event {
        self.sound_enabled = !self.sound_enabled;
        self.signals.set_sound_enabled(self.sound_enabled);
        Event::SoundToggled {
            enabled: self.sound_enabled,
            at: Utc::now(),
        }
    }

    /// Ask for a fresh quote. Rejected while one is loading or an outcome is open.
    pub fn request_quote(&mut self) -> Option<Event> {
        if self.quote.loading.is_some() || self.session.is_outcome_open() {
            return None;
        }
        let ticket = QuoteTicket(self.quote.next_ticket);
        self.quote.next_ticket += 1;
        self.quote.loading = Some(ticket);
        Some(Event::QuoteRequested {
            ticket,
            at: Utc::now(),
        })
    }

    pub fn complete_quote(&mut self, ticket: QuoteTicket, text: String) -> Option<Event> {
        if self.quote.loading != Some(ticket) {
            debug!(ticket = ticket.get(), "discarding stale quote");
            return None;
        }
        self.quote.loading = None;
        self.quote.text = text.clone();
        Some(Event::QuoteUpdated {
            text,
            at: Utc::now(),
        })
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.settings.viewport = (width, height);
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn end_session(&mut self, now_ms: u64) -> Vec<Event> {
        match self.session.evaluate_end() {
            SessionEnd::NotOpen => Vec::new(),
            SessionEnd::Silent { session_count } => vec![Event::SessionEnded {
                session_count,
                at: Utc::now(),
            }],
            SessionEnd::Significant { session_merit } => {
                self.auto_tap.disable();
                let decision = self.gate.decide(session_merit, self.rng.as_mut());
                debug!(session_merit, ?decision, at_ms = now_ms, "session significant");
                let draw = decision == DrawDecision::Draw;
                let outcome = self.session.raise_session_outcome(draw).clone();
                let mut events = vec![Event::OutcomeRaised {
                    outcome: outcome.clone(),
                    at: Utc::now(),
                }];
                if draw {
                    events.push(Event::FortuneRequested {
                        outcome_id: outcome.id,
                        at: Utc::now(),
                    });
                }
                events
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fortune::Luck;
    use crate::random::ScriptedSource;
    use crate::session::OutcomeMode;
    use crate::signals::{RecordingSignals, Signal, SilentSignals};
    use crate::storage::MemoryStore;
    use std::time::Duration;

    fn engine_with(rolls: impl IntoIterator<Item = f64>) -> MeritEngine {
        MeritEngine::new(
            EngineSettings::default(),
            MeritState::load(MemoryStore::new()),
            ScriptedSource::new(rolls),
            SilentSignals,
        )
    }

    fn tap_n(engine: &mut MeritEngine, n: u64, start_ms: u64, gap_ms: u64) -> u64 {
        let mut t = start_ms;
        for _ in 0..n {
            engine.tick(t);
            engine.process_tap(Point::new(100.0, 400.0), false, t).unwrap();
            t += gap_ms;
        }
        t - gap_ms
    }

    fn outcome_events(events: &[Event]) -> Vec<&Outcome> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::OutcomeRaised { outcome, .. } => Some(outcome),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn manual_tap_updates_counters_and_marker() {
        let mut engine = engine_with([]);
        let event = engine.process_tap(Point::new(100.0, 400.0), false, 0).unwrap();
        match event {
            Event::Tapped {
                lifetime_count,
                session_count,
                feedback,
                automatic,
                ..
            } => {
                assert_eq!(lifetime_count, 1);
                assert_eq!(session_count, 1);
                assert!(!automatic);
                assert_eq!(feedback.position, Point::new(100.0, 340.0));
                assert_eq!(feedback.label, "功德 +1");
                assert_eq!(feedback.expires_at_ms, 800);
            }
            other => panic!("expected Tapped, got {other:?}"),
        }
        assert_eq!(engine.watchdog().state(), WatchdogState::Armed);
        assert_eq!(engine.session().phase(), SessionPhase::SessionOpen);
    }

    #[test]
    fn tap_signals_follow_origin_and_sound() {
        let signals = RecordingSignals::new();
        let mut engine = MeritEngine::new(
            EngineSettings::default(),
            MeritState::load(MemoryStore::new()),
            ScriptedSource::new([]),
            signals.clone(),
        );
        engine.process_tap(Point::default(), false, 0);
        engine.toggle_sound();
        engine.process_tap(Point::default(), true, 10);
        assert_eq!(
            signals.signals(),
            vec![
                Signal::Sound(true),
                Signal::TapCue,
                Signal::Haptic(Duration::from_millis(15)),
                Signal::Sound(false),
                Signal::Haptic(Duration::from_millis(10)),
            ]
        );
    }

    #[test]
    fn automatic_tap_floats_above_center() {
        let mut engine = engine_with([]);
        engine.set_viewport(400.0, 800.0);
        match engine.process_tap(Point::new(5.0, 5.0), true, 0).unwrap() {
            Event::Tapped { feedback, .. } => assert_eq!(feedback.position, Point::new(200.0, 320.0)),
            other => panic!("expected Tapped, got {other:?}"),
        }
    }

    #[test]
    fn four_taps_end_silently_and_keep_count() {
        let mut engine = engine_with([]);
        let last = tap_n(&mut engine, 4, 0, 900);
        assert!(engine.tick(last + 4_999).iter().all(|e| !matches!(e, Event::SessionEnded { .. })));
        let events = engine.tick(last + 5_000);
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::SessionEnded { session_count: 4, .. })));
        assert!(engine.outcome().is_none());
        assert_eq!(engine.session().state().session_count, 4);
        assert!(!engine.session().state().is_active);
        assert_eq!(engine.watchdog().state(), WatchdogState::Idle);
    }

    #[test]
    fn low_roll_draws_and_dismissal_resets() {
        let mut engine = engine_with([38.0]);
        let last = tap_n(&mut engine, 6, 0, 500);
        let events = engine.tick(last + 5_000);
        let outcomes = outcome_events(&events);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].mode, OutcomeMode::FortuneDraw);
        assert_eq!(outcomes[0].session_merit, 6);
        assert!(events.iter().any(|e| matches!(e, Event::FortuneRequested { .. })));

        assert!(engine.process_tap(Point::default(), false, last + 5_001).is_none());
        assert_eq!(engine.merit().lifetime_count(), 6);

        engine.dismiss(last + 6_000).unwrap();
        assert_eq!(engine.session().state().session_count, 0);
        assert_eq!(engine.session().phase(), SessionPhase::NoSession);
    }

    #[test]
    fn high_roll_gives_summary_only() {
        let mut engine = engine_with([39.0]);
        let last = tap_n(&mut engine, 6, 0, 500);
        let events = engine.tick(last + 5_000);
        assert_eq!(outcome_events(&events)[0].mode, OutcomeMode::SessionSummary);
        assert!(!events.iter().any(|e| matches!(e, Event::FortuneRequested { .. })));
    }

    #[test]
    fn significant_session_stops_auto_tap() {
        let mut engine = engine_with([99.0]);
        tap_n(&mut engine, 1, 0, 0);
        engine.toggle_auto_tap(0).unwrap();
        // Auto taps at 1s..=4s make five session taps, then the user stops auto-tap.
        engine.tick(4_000);
        assert_eq!(engine.session().state().session_count, 5);
        engine.toggle_auto_tap(4_500).unwrap();
        let events = engine.tick(9_500);
        assert_eq!(outcome_events(&events).len(), 1);
        assert!(!engine.is_auto_tapping());
    }

    #[test]
    fn disabling_auto_tap_rearms_watchdog() {
        let mut engine = engine_with([99.0]);
        tap_n(&mut engine, 1, 0, 0);
        engine.toggle_auto_tap(0).unwrap();
        engine.tick(3_000);
        assert_eq!(engine.watchdog().due_at(), Some(8_000));

        engine.toggle_auto_tap(3_500).unwrap();
        assert_eq!(engine.watchdog().due_at(), Some(8_500));
        assert!(engine.tick(8_499).iter().all(|e| !matches!(e, Event::SessionEnded { .. })));
        let events = engine.tick(8_500);
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::SessionEnded { session_count: 4, .. })));
    }

    #[test]
    fn enabling_auto_tap_rearms_watchdog() {
        let mut engine = engine_with([99.0]);
        tap_n(&mut engine, 1, 0, 0);
        assert_eq!(engine.watchdog().due_at(), Some(5_000));

        engine.toggle_auto_tap(2_500).unwrap();
        assert_eq!(engine.watchdog().due_at(), Some(7_500));
        engine.tick(4_999);
        assert_eq!(engine.watchdog().due_at(), Some(9_500));
    }

    #[test]
    fn auto_tap_toggle_without_session_leaves_watchdog_idle() {
        let mut engine = engine_with([]);
        engine.toggle_auto_tap(1_000).unwrap();
        assert_eq!(engine.watchdog().due_at(), None);
        engine.toggle_auto_tap(1_500).unwrap();
        assert_eq!(engine.watchdog().due_at(), None);
    }

    #[test]
    fn rejected_tap_leaves_counters_untouched() {
        let store = MemoryStore::new();
        let mut engine = MeritEngine::new(
            EngineSettings::default(),
            MeritState::load(store.clone()),
            ScriptedSource::new([99.0]),
            SilentSignals,
        );
        let last = tap_n(&mut engine, 5, 0, 100);
        engine.tick(last + 5_000);
        assert!(engine.outcome().is_some());

        assert!(engine.process_tap(Point::new(0.0, 0.0), false, last + 5_100).is_none());
        assert_eq!(engine.merit().lifetime_count(), 5);
        assert_eq!(engine.session().state().session_count, 5);
        assert_eq!(store.snapshot().get("zen-merit-count").map(String::as_str), Some("5"));
    }

    #[test]
    fn auto_tap_keeps_session_alive() {
        let mut engine = engine_with([]);
        engine.toggle_auto_tap(0).unwrap();
        let events = engine.tick(60_000);
        let taps = events.iter().filter(|e| matches!(e, Event::Tapped { .. })).count();
        assert_eq!(taps, 60);
        assert!(outcome_events(&events).is_empty());
        assert_eq!(engine.merit().lifetime_count(), 60);
    }

    #[test]
    fn auto_tap_forced_off_when_outcome_opens() {
        let settings = EngineSettings {
            auto_tap_cadence_ms: 6_000,
            ..EngineSettings::default()
        };
        let mut engine = MeritEngine::new(
            settings,
            MeritState::load(MemoryStore::new()),
            ScriptedSource::new([0.0]),
            SilentSignals,
        );
        let last = tap_n(&mut engine, 5, 0, 100);
        engine.toggle_auto_tap(last).unwrap();
        // The watchdog (due at last + 5s) beats the first auto tap (last + 6s).
        let events = engine.tick(last + 5_000);
        assert_eq!(outcome_events(&events).len(), 1);
        assert!(!engine.is_auto_tapping());
        assert!(engine.toggle_auto_tap(last + 5_000).is_none());
        assert!(engine.tick(last + 60_000).iter().all(|e| !matches!(e, Event::Tapped { .. })));
    }

    #[test]
    fn view_fortune_suspends_auto_tap() {
        let store = MemoryStore::new();
        let mut merit = MeritState::load(store);
        merit.record_fortune(FortuneRecord::fallback());
        let mut engine = MeritEngine::new(EngineSettings::default(), merit, ScriptedSource::new([]), SilentSignals);
        engine.toggle_auto_tap(0).unwrap();
        engine.tick(1_000);
        engine.view_last_fortune().unwrap();
        let events = engine.tick(3_000);
        assert!(events.iter().all(|e| !matches!(e, Event::Tapped { .. })));
        engine.dismiss(3_000).unwrap();
        assert!(engine.tick(3_999).iter().all(|e| !matches!(e, Event::Tapped { .. })));
        assert!(engine.tick(4_000).iter().any(|e| matches!(e, Event::Tapped { .. })));
        assert_eq!(engine.session().state().session_count, 2);
    }

    #[test]
    fn fortune_completion_persists_and_unlocks_golden() {
        let store = MemoryStore::new();
        let mut engine = MeritEngine::new(
            EngineSettings::default(),
            MeritState::load(store.clone()),
            ScriptedSource::new([0.0]),
            SilentSignals,
        );
        let last = tap_n(&mut engine, 5, 0, 100);
        let events = engine.tick(last + 5_000);
        let id = outcome_events(&events)[0].id;
        let fortune = FortuneRecord {
            luck: Luck::Daikichi,
            ..FortuneRecord::fallback()
        };
        match engine.complete_fortune(id, fortune.clone()).unwrap() {
            Event::FortuneRevealed { golden_unlocked, .. } => assert!(golden_unlocked),
            other => panic!("expected FortuneRevealed, got {other:?}"),
        }
        assert!(engine.merit().is_golden());
        assert_eq!(engine.outcome().unwrap().fortune.as_ref(), Some(&fortune));
        assert!(store.snapshot().contains_key(crate::storage::KEY_LAST_FORTUNE));
        // A duplicate completion is ignored.
        assert!(engine.complete_fortune(id, FortuneRecord::fallback()).is_none());
    }

    #[test]
    fn late_fortune_is_not_persisted() {
        let store = MemoryStore::new();
        let mut engine = MeritEngine::new(
            EngineSettings::default(),
            MeritState::load(store.clone()),
            ScriptedSource::new([0.0]),
            SilentSignals,
        );
        let last = tap_n(&mut engine, 5, 0, 100);
        let id = outcome_events(&engine.tick(last + 5_000))[0].id;
        engine.dismiss(last + 5_100);
        assert!(engine.complete_fortune(id, FortuneRecord::fallback()).is_none());
        assert!(engine.merit().last_fortune().is_none());
        assert!(!store.snapshot().contains_key(crate::storage::KEY_LAST_FORTUNE));
    }

    #[test]
    fn quote_requests_are_tagged() {
        let mut engine = engine_with([]);
        assert_eq!(engine.quote(), DEFAULT_QUOTE);
        let ticket = match engine.request_quote().unwrap() {
            Event::QuoteRequested { ticket, .. } => ticket,
            other => panic!("expected QuoteRequested, got {other:?}"),
        };
        assert!(engine.request_quote().is_none());
        assert!(engine.complete_quote(QuoteTicket(ticket.get() + 1), "nope".into()).is_none());
        assert!(engine.complete_quote(ticket, "心静自然凉。".into()).is_some());
        assert_eq!(engine.quote(), "心静自然凉。");
        assert!(engine.complete_quote(ticket, "again".into()).is_none());
    }

    #[test]
    fn next_deadline_tracks_earliest_timer() {
        let mut engine = engine_with([]);
        assert_eq!(engine.next_deadline(), None);
        engine.process_tap(Point::default(), false, 1_000);
        assert_eq!(engine.next_deadline(), Some(1_800));
        engine.tick(1_800);
        assert_eq!(engine.next_deadline(), Some(6_000));
    }
}
