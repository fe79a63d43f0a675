//! Session controller.
//!
//! ```text
//! NoSession --tap--> SessionOpen --tap--> SessionOpen
//!                        |
//!                        +--watchdog, count < threshold--> NoSession (count kept)
//!                        +--watchdog, count >= threshold--> AwaitingOutcome
//! AwaitingOutcome --dismiss--> NoSession (count reset to 0)
//! ```
//!
//! A FORTUNE_VIEW outcome sits beside this machine: it blocks taps while
//! open but its dismissal leaves the session untouched.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::fortune::FortuneRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    NoSession,
    SessionOpen,
    AwaitingOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub session_count: u64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeMode {
    SessionSummary,
    FortuneDraw,
    FortuneView,
}

impl OutcomeMode {
    /// Whether dismissing this outcome closes the session.
    pub fn ends_session(self) -> bool {
        matches!(self, OutcomeMode::SessionSummary | OutcomeMode::FortuneDraw)
    }
}

/// Generation tag for an outcome; async results carry it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutcomeId(u64);

impl OutcomeId {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub id: OutcomeId,
    pub mode: OutcomeMode,
    pub session_merit: u64,
    /// Drawn or re-viewed fortune; `None` while a draw is pending or for a summary.
    pub fortune: Option<FortuneRecord>,
}

/// Result of a watchdog-driven end-of-session evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// No session was open.
    NotOpen,
    /// Below threshold: closed without an outcome, count preserved.
    Silent { session_count: u64 },
    /// At or above threshold: caller must raise an outcome.
    Significant { session_merit: u64 },
}

#[derive(Debug, Clone)]
pub struct SessionController {
    state: SessionState,
    threshold: u64,
    outcome: Option<Outcome>,
    next_outcome_id: u64,
}

impl SessionController {
    pub fn new(significance_threshold: u64) -> Self {
        Self {
            state: SessionState::default(),
            threshold: significance_threshold,
            outcome: None,
            next_outcome_id: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn is_outcome_open(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn phase(&self) -> SessionPhase {
        match &self.outcome {
            Some(o) if o.mode.ends_session() => SessionPhase::AwaitingOutcome,
            _ if self.state.is_active => SessionPhase::SessionOpen,
            _ => SessionPhase::NoSession,
        }
    }

    /// Count one tap. Returns the new session count, or `None` while an
    /// outcome is open.
    pub fn record_tap(&mut self) -> Option<u64> {
        if self.is_outcome_open() {
            return None;
        }
        if !self.state.is_active {
            debug!(carried = self.state.session_count, "session opened");
        }
        self.state.session_count += 1;
        self.state.is_active = true;
        Some(self.state.session_count)
    }

    /// Judge the session after the quiet interval elapsed.
    pub fn evaluate_end(&mut self) -> SessionEnd {
        if !self.state.is_active || self.phase() == SessionPhase::AwaitingOutcome {
            return SessionEnd::NotOpen;
        }
        if self.state.session_count >= self.threshold {
            SessionEnd::Significant {
                session_merit: self.state.session_count,
            }
        } else {
            self.state.is_active = false;
            debug!(session_count = self.state.session_count, "session ended quietly");
            SessionEnd::Silent {
                session_count: self.state.session_count,
            }
        }
    }

    /// Raise a SESSION_SUMMARY or FORTUNE_DRAW outcome for the current
    /// session, superseding an open FORTUNE_VIEW.
    pub fn raise_session_outcome(&mut self, draw: bool) -> &Outcome {
        let mode = if draw {
            OutcomeMode::FortuneDraw
        } else {
            OutcomeMode::SessionSummary
        };
        if let Some(previous) = &self.outcome {
            debug!(superseded = previous.id.get(), "outcome superseded");
        }
        let id = self.allocate_id();
        info!(outcome = id.get(), ?mode, session_merit = self.state.session_count, "session outcome raised");
        self.outcome.insert(Outcome {
            id,
            mode,
            session_merit: self.state.session_count,
            fortune: None,
        })
    }

    /// Raise FORTUNE_VIEW if no outcome is open and a fortune exists.
    pub fn view_fortune(&mut self, last: Option<&FortuneRecord>) -> Option<&Outcome> {
        if self.is_outcome_open() {
            return None;
        }
        let fortune = last?.clone();
        let id = self.allocate_id();
        let outcome = self.outcome.insert(Outcome {
            id,
            mode: OutcomeMode::FortuneView,
            session_merit: self.state.session_count,
            fortune: Some(fortune),
        });
        Some(&*outcome)
    }

    /// Attach a drawn fortune to the pending draw it was requested for.
    /// Returns `false` for a dismissed, superseded or already-resolved draw.
    pub fn attach_fortune(&mut self, id: OutcomeId, fortune: &FortuneRecord) -> bool {
        match &mut self.outcome {
            Some(o) if o.id == id && o.mode == OutcomeMode::FortuneDraw && o.fortune.is_none() => {
                o.fortune = Some(fortune.clone());
                true
            }
            _ => false,
        }
    }

    /// Close the open outcome. Session outcomes reset the session.
    pub fn dismiss(&mut self) -> Option<Outcome> {
        let outcome = self.outcome.take()?;
        if outcome.mode.ends_session() {
            self.state = SessionState::default();
            debug!(outcome = outcome.id.get(), "session closed after outcome");
        }
        Some(outcome)
    }

    fn allocate_id(&mut self) -> OutcomeId {
        let id = OutcomeId(self.next_outcome_id);
        self.next_outcome_id += 1;
        id
    }
}
