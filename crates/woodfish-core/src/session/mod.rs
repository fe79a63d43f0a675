//! Tap session engine.
//!
//! ```text
//! user tap ─┐
//!           ├─> MeritEngine::process_tap ─> MeritState, SessionController,
//! auto-tap ─┘                               FeedbackRegistry, watchdog re-arm
//!
//! watchdog fire ─> SessionController::evaluate_end ─> FortuneDrawGate
//!                                                  ─> Outcome (+ FortuneRequested)
//! ```

mod auto_tap;
mod controller;
mod engine;
mod feedback;
mod gate;
mod watchdog;

pub use auto_tap::AutoTapDriver;
pub use controller::{
    Outcome, OutcomeId, OutcomeMode, SessionController, SessionEnd, SessionPhase, SessionState,
};
pub use engine::{EngineView, MeritEngine, QuoteTicket, DEFAULT_QUOTE};
pub use feedback::{FeedbackId, FeedbackItem, FeedbackRegistry};
pub use gate::{DrawDecision, DrawRule, FortuneDrawGate};
pub use watchdog::{InactivityWatchdog, WatchdogState};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Screen coordinates of a tap or marker.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Timing, odds and placement knobs for [`MeritEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Quiet period after the last tap before the session is evaluated.
    pub quiet_interval_ms: u64,
    /// Session taps needed for an outcome to be raised.
    pub significance_threshold: u64,
    pub feedback_lifetime_ms: u64,
    pub feedback_label: String,
    pub auto_tap_cadence_ms: u64,
    pub draw: DrawRule,
    pub manual_pulse: Duration,
    pub auto_pulse: Duration,
    /// Horizontal jitter half-width for manual taps.
    pub manual_jitter: f64,
    /// Horizontal jitter half-width around the viewport centre for auto taps.
    pub auto_jitter: f64,
    /// Markers float this far above a manual tap.
    pub manual_lift: f64,
    /// Markers float this far above the viewport centre for auto taps.
    pub auto_lift: f64,
    pub viewport: (f64, f64),
    pub sound_enabled: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            quiet_interval_ms: 5_000,
            significance_threshold: 5,
            feedback_lifetime_ms: 800,
            feedback_label: "功德 +1".into(),
            auto_tap_cadence_ms: 1_000,
            draw: DrawRule::default(),
            manual_pulse: Duration::from_millis(15),
            auto_pulse: Duration::from_millis(10),
            manual_jitter: 10.0,
            auto_jitter: 20.0,
            manual_lift: 60.0,
            auto_lift: 80.0,
            viewport: (390.0, 844.0),
            sound_enabled: true,
        }
    }
}

impl EngineSettings {
    pub fn viewport_center(&self) -> Point {
        Point::new(self.viewport.0 / 2.0, self.viewport.1 / 2.0)
    }
}
