//! Floating "功德 +1" markers.
//!
//! Every item carries its own deadline; expiry is checked per item, so
//! removals never depend on each other. Ids come from a monotonic counter
//! and are never reused, even after removal.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedbackId(u64);

impl FeedbackId {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub id: FeedbackId,
    pub position: Point,
    pub label: String,
    pub created_at_ms: u64,
    pub expires_at_ms: u64,
}

#[derive(Debug, Clone)]
pub struct FeedbackRegistry {
    next_id: u64,
    lifetime_ms: u64,
    live: BTreeMap<FeedbackId, FeedbackItem>,
}

impl FeedbackRegistry {
    pub fn new(lifetime_ms: u64) -> Self {
        Self {
            next_id: 0,
            lifetime_ms,
            live: BTreeMap::new(),
        }
    }

    pub fn allocate(&mut self, position: Point, label: impl Into<String>, now_ms: u64) -> FeedbackId {
        let id = FeedbackId(self.next_id);
        self.next_id += 1;
        self.live.insert(
            id,
            FeedbackItem {
                id,
                position,
                label: label.into(),
                created_at_ms: now_ms,
                expires_at_ms: now_ms + self.lifetime_ms,
            },
        );
        id
    }

    pub fn get(&self, id: FeedbackId) -> Option<&FeedbackItem> {
        self.live.get(&id)
    }

    /// Remove an item. Returns `false` if it was already gone.
    pub fn expire(&mut self, id: FeedbackId) -> bool {
        self.live.remove(&id).is_some()
    }

    /// Remove every item whose deadline is at or before `now_ms`.
    pub fn expire_due(&mut self, now_ms: u64) -> Vec<FeedbackId> {
        let due: Vec<FeedbackId> = self
            .live
            .values()
            .filter(|item| item.expires_at_ms <= now_ms)
            .map(|item| item.id)
            .collect();
        for id in &due {
            self.live.remove(id);
        }
        if !due.is_empty() {
            debug!(count = due.len(), remaining = self.live.len(), "feedback items expired");
        }
        due
    }

    pub fn next_expiry(&self) -> Option<u64> {
        self.live.values().map(|item| item.expires_at_ms).min()
    }

    /// Live items in allocation order.
    pub fn live(&self) -> impl Iterator<Item = &FeedbackItem> {
        self.live.values()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
