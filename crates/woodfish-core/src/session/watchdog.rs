//! Inactivity watchdog.
//!
//! ```text
//! Idle --tap--> Armed --tap--> Armed (re-armed from zero)
//!                 |
//!                 +--quiet interval elapsed--> fires --> Idle
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::timer::{TimerHandle, TimerSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchdogState {
    Idle,
    Armed,
}

#[derive(Debug, Clone)]
pub struct InactivityWatchdog {
    quiet_interval_ms: u64,
    slot: TimerSlot,
}

impl InactivityWatchdog {
    pub fn new(quiet_interval_ms: u64) -> Self {
        Self {
            quiet_interval_ms,
            slot: TimerSlot::new(),
        }
    }

    pub fn state(&self) -> WatchdogState {
        if self.slot.is_armed() {
            WatchdogState::Armed
        } else {
            WatchdogState::Idle
        }
    }

    pub fn due_at(&self) -> Option<u64> {
        self.slot.due_at()
    }

    /// Cancel any pending fire and count the quiet interval from `now_ms`.
    pub fn rearm(&mut self, now_ms: u64) -> TimerHandle {
        let handle = self.slot.arm(now_ms + self.quiet_interval_ms);
        debug!(handle = handle.get(), due_ms = now_ms + self.quiet_interval_ms, "watchdog armed");
        handle
    }

    pub fn cancel(&mut self) {
        self.slot.cancel();
    }

    /// Returns the deadline it fired at, once per arming.
    pub fn poll(&mut self, now_ms: u64) -> Option<u64> {
        let (handle, due) = self.slot.fire_if_due(now_ms)?;
        debug!(handle = handle.get(), due_ms = due, "watchdog fired");
        Some(due)
    }
}
