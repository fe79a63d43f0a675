//! Fortune (omikuji) records.
//!
//! The JSON shape matches what the fortune provider returns and what is
//! persisted under `zen-last-fortune`:
//!
//! ```json
//! {"id": 7, "luck": "大吉", "poem": ["..", "..", "..", ".."], "explanation": ".."}
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Luck tiers, best first. `Daikichi` is the top tier that unlocks golden status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Luck {
    #[serde(rename = "大吉")]
    Daikichi,
    #[serde(rename = "吉")]
    Kichi,
    #[serde(rename = "中吉")]
    Chukichi,
    #[serde(rename = "小吉")]
    Shokichi,
    #[serde(rename = "末吉")]
    Suekichi,
    #[serde(rename = "凶")]
    Kyo,
}

impl Luck {
    pub const ALL: [Luck; 6] = [
        Luck::Daikichi,
        Luck::Kichi,
        Luck::Chukichi,
        Luck::Shokichi,
        Luck::Suekichi,
        Luck::Kyo,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Luck::Daikichi => "大吉",
            Luck::Kichi => "吉",
            Luck::Chukichi => "中吉",
            Luck::Shokichi => "小吉",
            Luck::Suekichi => "末吉",
            Luck::Kyo => "凶",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.label() == label.trim())
    }

    pub fn is_top_tier(self) -> bool {
        self == Luck::Daikichi
    }
}

impl std::fmt::Display for Luck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A drawn fortune. The poem always has exactly four lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FortuneRecord {
    pub id: u32,
    pub luck: Luck,
    pub poem: [String; 4],
    pub explanation: String,
}

/// Loosely-typed provider payload, validated into a [`FortuneRecord`].
#[derive(Debug, Deserialize)]
struct RawFortune {
    id: i64,
    luck: String,
    poem: Vec<String>,
    explanation: String,
}

impl FortuneRecord {
    /// Record substituted when a draw fails or returns malformed data.
    pub fn fallback() -> Self {
        Self {
            id: 1,
            luck: Luck::Kichi,
            poem: [
                "春来花发好".into(),
                "秋至月轮圆".into(),
                "万事皆成就".into(),
                "福禄自天然".into(),
            ],
            explanation: "心诚则灵，万事顺遂。（备用签文）".into(),
        }
    }

    /// Record returned when no provider is configured at all.
    pub fn offline() -> Self {
        Self {
            id: 1,
            luck: Luck::Daikichi,
            poem: [
                "七宝浮图塔".into(),
                "高峰顶上安".into(),
                "众人皆仰望".into(),
                "莫作等闲看".into(),
            ],
            explanation: "万事如意，功德圆满。（API Key 缺失模式）".into(),
        }
    }

    /// Parse and validate provider JSON.
    ///
    /// # Errors
    /// Returns [`ProviderError::Malformed`] for unparsable JSON, an unknown
    /// luck label, a poem that is not exactly four lines, or a negative id.
    pub fn parse_provider_json(text: &str) -> Result<Self, ProviderError> {
        let raw: RawFortune = serde_json::from_str(text.trim())?;
        let luck = Luck::from_label(&raw.luck)
            .ok_or_else(|| ProviderError::Malformed(format!("unknown luck '{}'", raw.luck)))?;
        let id = u32::try_from(raw.id)
            .map_err(|_| ProviderError::Malformed(format!("invalid id {}", raw.id)))?;
        let poem: [String; 4] = raw.poem.try_into().map_err(|lines: Vec<String>| {
            ProviderError::Malformed(format!("poem has {} lines, expected 4", lines.len()))
        })?;
        Ok(Self {
            id,
            luck,
            poem,
            explanation: raw.explanation,
        })
    }
}
