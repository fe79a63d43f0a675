mod config;
pub mod database;
pub mod memory;
pub mod merit;

pub use config::{
    AutoTapConfig, Config, DrawConfig, FeedbackConfig, HapticsConfig, OracleConfig,
    SessionConfig, ViewportConfig,
};
pub use database::Database;
pub use memory::MemoryStore;
pub use merit::{MeritSnapshot, MeritState, KEY_IS_GOLDEN, KEY_LAST_FORTUNE, KEY_LIFETIME_COUNT};

use std::path::PathBuf;

use crate::error::StorageError;

/// String-keyed durable storage used by [`MeritState`].
pub trait KvStore: Send {
    /// Get a value, `None` if the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Insert or replace a value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Returns `~/.config/woodfish[-dev]/` based on WOODFISH_ENV.
///
/// Set WOODFISH_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("WOODFISH_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("woodfish-dev")
    } else {
        base_dir.join("woodfish")
    };

    std::fs::create_dir_all(&dir).map_err(StorageError::DataDir)?;
    Ok(dir)
}
