//! Single-shot, handle-keyed deadlines.
//!
//! A slot holds at most one pending deadline. Arming always cancels the
//! previous deadline first and hands out a fresh handle, so a handler that
//! fires can tell which arming it belongs to. Slots never run anything by
//! themselves; the owner polls them with the current clock value.

use serde::{Deserialize, Serialize};

/// Identity of one arming of a [`TimerSlot`]. Never reused within a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Pending {
    handle: TimerHandle,
    due_ms: u64,
}

/// A cancel-and-rearm single-shot timer on a caller-supplied millisecond clock.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimerSlot {
    next_handle: u64,
    pending: Option<Pending>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel any pending deadline and arm a new one at `due_ms`.
    pub fn arm(&mut self, due_ms: u64) -> TimerHandle {
        self.cancel();
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.pending = Some(Pending { handle, due_ms });
        handle
    }

    /// Drop the pending deadline, returning its handle if one was armed.
    pub fn cancel(&mut self) -> Option<TimerHandle> {
        self.pending.take().map(|p| p.handle)
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    pub fn due_at(&self) -> Option<u64> {
        self.pending.map(|p| p.due_ms)
    }

    /// Disarm and return `(handle, due_ms)` if the deadline has passed.
    pub fn fire_if_due(&mut self, now_ms: u64) -> Option<(TimerHandle, u64)> {
        match self.pending {
            Some(p) if p.due_ms <= now_ms => {
                self.pending = None;
                Some((p.handle, p.due_ms))
            }
            _ => None,
        }
    }
}
