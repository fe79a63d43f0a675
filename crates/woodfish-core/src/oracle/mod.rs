//! Fortune and quote providers.
//!
//! Oracles are total: any transport or parsing failure is logged and
//! replaced by a fixed fallback, so callers never handle provider errors.

mod gemini;
mod offline;

pub use gemini::GeminiOracle;
pub use offline::OfflineOracle;

use std::future::Future;

use crate::fortune::FortuneRecord;
use crate::storage::Config;

/// Quote shown when a provider call fails.
pub const FALLBACK_QUOTE: &str = "心静自然凉。";

/// Quote shown when the provider answered with nothing.
pub const EMPTY_QUOTE: &str = "心如止水，万事皆安。";

/// Quote shown when no provider is configured.
pub const OFFLINE_QUOTE: &str =
    "API Key not found. Inner peace comes from within (and environment variables).";

pub trait Oracle: Send + Sync + 'static {
    /// A short blessing or zen saying.
    fn short_quote(&self) -> impl Future<Output = String> + Send;

    /// One fortune draw. Single attempt; falls back on failure.
    fn fortune(&self) -> impl Future<Output = FortuneRecord> + Send;
}

/// Either oracle, chosen from configuration.
pub enum AnyOracle {
    Gemini(GeminiOracle),
    Offline(OfflineOracle),
}

impl AnyOracle {
    /// Gemini when an API key is available, offline otherwise.
    pub fn from_config(config: &Config) -> Self {
        match config.api_key() {
            Some(key) => match GeminiOracle::new(&config.oracle, key) {
                Ok(oracle) => AnyOracle::Gemini(oracle),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to build HTTP client, using offline oracle");
                    AnyOracle::Offline(OfflineOracle)
                }
            },
            None => AnyOracle::Offline(OfflineOracle),
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, AnyOracle::Offline(_))
    }
}

impl Oracle for AnyOracle {
    async fn short_quote(&self) -> String {
        match self {
            AnyOracle::Gemini(o) => o.short_quote().await,
            AnyOracle::Offline(o) => o.short_quote().await,
        }
    }

    async fn fortune(&self) -> FortuneRecord {
        match self {
            AnyOracle::Gemini(o) => o.fortune().await,
            AnyOracle::Offline(o) => o.fortune().await,
        }
    }
}
