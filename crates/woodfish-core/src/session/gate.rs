//! Fortune draw gate.
//!
//! A significant session draws a fortune with probability
//! `min(base_chance + session_merit, 100)%`, and always draws once the
//! session merit reaches the guaranteed threshold. With the default odds the
//! chance already saturates at 67 merit, well below the 200 guarantee; both
//! rules are kept as they are.

use serde::{Deserialize, Serialize};

use crate::random::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRule {
    pub base_chance: u64,
    pub guaranteed_threshold: u64,
}

impl Default for DrawRule {
    fn default() -> Self {
        Self {
            base_chance: 33,
            guaranteed_threshold: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawDecision {
    Draw,
    SummaryOnly,
}

#[derive(Debug, Clone, Default)]
pub struct FortuneDrawGate {
    rule: DrawRule,
}

impl FortuneDrawGate {
    pub fn new(rule: DrawRule) -> Self {
        Self { rule }
    }

    /// Percentage chance of a draw for this much session merit.
    pub fn chance_percent(&self, session_merit: u64) -> u64 {
        if session_merit >= self.rule.guaranteed_threshold {
            return 100;
        }
        self.rule.base_chance.saturating_add(session_merit).min(100)
    }

    /// Decide, consuming a roll only below the guaranteed threshold.
    pub fn decide(&self, session_merit: u64, rng: &mut dyn RandomSource) -> DrawDecision {
        if session_merit >= self.rule.guaranteed_threshold {
            return DrawDecision::Draw;
        }
        self.decide_with_roll(session_merit, rng.percent())
    }

    /// Decide against an explicit roll in `[0, 100)`.
    pub fn decide_with_roll(&self, session_merit: u64, roll: f64) -> DrawDecision {
        if session_merit >= self.rule.guaranteed_threshold
            || roll < self.rule.base_chance.saturating_add(session_merit) as f64
        {
            DrawDecision::Draw
        } else {
            DrawDecision::SummaryOnly
        }
    }
}
