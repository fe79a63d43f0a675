//! In-process key-value store.
//!
//! Clones share the same map, so a test can hand one clone to the engine
//! and keep another to inspect what was written or to "restart" from it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::KvStore;
use crate::error::StorageError;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    map: Arc<Mutex<HashMap<String, String>>>,
    reject_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail; reads still work.
    pub fn read_only() -> Self {
        Self {
            reject_writes: true,
            ..Self::default()
        }
    }

    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let store = Self::default();
        if let Ok(mut map) = store.map.lock() {
            for (k, v) in entries {
                map.insert(k.to_string(), v.to_string());
            }
        }
        store
    }

    pub fn snapshot(&self) -> HashMap<String, String> {
        self.map.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self
            .map
            .lock()
            .map_err(|_| StorageError::QueryFailed("memory store poisoned".into()))?;
        Ok(map.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.reject_writes {
            return Err(StorageError::QueryFailed(format!("write rejected for {key}")));
        }
        let mut map = self
            .map
            .lock()
            .map_err(|_| StorageError::QueryFailed("memory store poisoned".into()))?;
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
