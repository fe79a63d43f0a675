//! Persistence bridge for process-wide merit state.
//!
//! `MeritState::load` reads every field once at startup; each mutator
//! writes its field straight through to the store. A failed write is
//! logged and the in-memory value stays authoritative for the rest of the
//! process.

use serde::Serialize;
use tracing::{info, warn};

use super::{Database, KvStore};
use crate::error::Result;
use crate::fortune::FortuneRecord;

pub const KEY_LIFETIME_COUNT: &str = "zen-merit-count";
pub const KEY_IS_GOLDEN: &str = "zen-is-golden";
pub const KEY_LAST_FORTUNE: &str = "zen-last-fortune";

/// Serializable view of the persisted fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeritSnapshot {
    pub lifetime_count: u64,
    pub is_golden: bool,
    pub last_fortune: Option<FortuneRecord>,
}

pub struct MeritState {
    store: Box<dyn KvStore>,
    lifetime_count: u64,
    is_golden: bool,
    last_fortune: Option<FortuneRecord>,
}

impl std::fmt::Debug for MeritState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeritState")
            .field("lifetime_count", &self.lifetime_count)
            .field("is_golden", &self.is_golden)
            .field("last_fortune", &self.last_fortune)
            .finish_non_exhaustive()
    }
}

impl MeritState {
    /// Load all fields. Each field is recovered independently: a corrupt
    /// value falls back to its default without touching the others.
    pub fn load(store: impl KvStore + 'static) -> Self {
        let store: Box<dyn KvStore> = Box::new(store);

        let lifetime_count = match read(store.as_ref(), KEY_LIFETIME_COUNT) {
            Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|e| {
                warn!(value = %raw, error = %e, "stored merit count is not a number, starting from 0");
                0
            }),
            None => 0,
        };

        let is_golden = read(store.as_ref(), KEY_IS_GOLDEN).as_deref() == Some("true");

        let last_fortune = read(store.as_ref(), KEY_LAST_FORTUNE).and_then(|raw| {
            serde_json::from_str::<FortuneRecord>(&raw)
                .map_err(|e| warn!(error = %e, "failed to parse saved fortune, ignoring it"))
                .ok()
        });

        Self {
            store,
            lifetime_count,
            is_golden,
            last_fortune,
        }
    }

    /// Load from the default on-disk database.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be opened.
    pub fn open() -> Result<Self> {
        Ok(Self::load(Database::open()?))
    }

    pub fn lifetime_count(&self) -> u64 {
        self.lifetime_count
    }

    pub fn is_golden(&self) -> bool {
        self.is_golden
    }

    pub fn last_fortune(&self) -> Option<&FortuneRecord> {
        self.last_fortune.as_ref()
    }

    pub fn snapshot(&self) -> MeritSnapshot {
        MeritSnapshot {
            lifetime_count: self.lifetime_count,
            is_golden: self.is_golden,
            last_fortune: self.last_fortune.clone(),
        }
    }

    /// Add one merit and write the new total through.
    pub fn increment(&mut self) -> u64 {
        self.lifetime_count += 1;
        let value = self.lifetime_count.to_string();
        self.write(KEY_LIFETIME_COUNT, &value);
        self.lifetime_count
    }

    /// Remember a drawn fortune. Returns `true` if this draw unlocked golden
    /// status; golden never reverts.
    pub fn record_fortune(&mut self, fortune: FortuneRecord) -> bool {
        let unlocked = fortune.luck.is_top_tier() && !self.is_golden;
        if unlocked {
            self.is_golden = true;
            self.write(KEY_IS_GOLDEN, "true");
            info!(fortune_id = fortune.id, "golden status unlocked");
        }
        match serde_json::to_string(&fortune) {
            Ok(json) => self.write(KEY_LAST_FORTUNE, &json),
            Err(e) => warn!(error = %e, "failed to serialize fortune"),
        }
        self.last_fortune = Some(fortune);
        unlocked
    }

    fn write(&mut self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            warn!(key, error = %e, "failed to persist merit state");
        }
    }
}

fn read(store: &dyn KvStore, key: &str) -> Option<String> {
    store
        .get(key)
        .map_err(|e| warn!(key, error = %e, "failed to read merit state"))
        .ok()
        .flatten()
}
