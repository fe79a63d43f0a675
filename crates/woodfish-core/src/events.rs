use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fortune::FortuneRecord;
use crate::session::{FeedbackId, FeedbackItem, Outcome, OutcomeId, OutcomeMode, QuoteTicket};

/// Every state change in the engine produces an Event.
/// Renderers consume them; the runtime also reacts to the request events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    Tapped {
        automatic: bool,
        lifetime_count: u64,
        session_count: u64,
        feedback: FeedbackItem,
        at: DateTime<Utc>,
    },
    FeedbackExpired {
        id: FeedbackId,
        at: DateTime<Utc>,
    },
    /// Watchdog closed a session below the significance threshold.
    SessionEnded {
        session_count: u64,
        at: DateTime<Utc>,
    },
    OutcomeRaised {
        outcome: Outcome,
        at: DateTime<Utc>,
    },
    /// A draw needs a fortune from the oracle, tagged with its outcome.
    FortuneRequested {
        outcome_id: OutcomeId,
        at: DateTime<Utc>,
    },
    FortuneRevealed {
        outcome_id: OutcomeId,
        fortune: FortuneRecord,
        golden_unlocked: bool,
        at: DateTime<Utc>,
    },
    OutcomeDismissed {
        outcome_id: OutcomeId,
        mode: OutcomeMode,
        at: DateTime<Utc>,
    },
    AutoTapToggled {
        enabled: bool,
        at: DateTime<Utc>,
    },
    SoundToggled {
        enabled: bool,
        at: DateTime<Utc>,
    },
    QuoteRequested {
        ticket: QuoteTicket,
        at: DateTime<Utc>,
    },
    QuoteUpdated {
        text: String,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Short name, matching the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Tapped { .. } => "Tapped",
            Event::FeedbackExpired { .. } => "FeedbackExpired",
            Event::SessionEnded { .. } => "SessionEnded",
            Event::OutcomeRaised { .. } => "OutcomeRaised",
            Event::FortuneRequested { .. } => "FortuneRequested",
            Event::FortuneRevealed { .. } => "FortuneRevealed",
            Event::OutcomeDismissed { .. } => "OutcomeDismissed",
            Event::AutoTapToggled { .. } => "AutoTapToggled",
            Event::SoundToggled { .. } => "SoundToggled",
            Event::QuoteRequested { .. } => "QuoteRequested",
            Event::QuoteUpdated { .. } => "QuoteUpdated",
        }
    }
}
