use super::{Oracle, OFFLINE_QUOTE};
use crate::fortune::FortuneRecord;

/// Oracle used when no API key is configured. Answers immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineOracle;

impl Oracle for OfflineOracle {
    async fn short_quote(&self) -> String {
        OFFLINE_QUOTE.to_string()
    }

    async fn fortune(&self) -> FortuneRecord {
        FortuneRecord::offline()
    }
}
