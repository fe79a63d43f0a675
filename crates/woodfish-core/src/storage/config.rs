//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Session timing (quiet interval, significance threshold)
//! - Feedback marker lifetime and label
//! - Auto-tap cadence
//! - Fortune draw odds and reveal delay
//! - Haptic pulse lengths
//! - Oracle (Gemini) connection settings
//!
//! Configuration is stored at `~/.config/woodfish/config.toml`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::error::ConfigError;
use crate::session::{DrawRule, EngineSettings};

/// Session timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_quiet_interval_ms")]
    pub quiet_interval_ms: u64,
    #[serde(default = "default_significance_threshold")]
    pub significance_threshold: u64,
}

/// Floating feedback marker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackConfig {
    #[serde(default = "default_feedback_lifetime_ms")]
    pub lifetime_ms: u64,
    #[serde(default = "default_feedback_label")]
    pub label: String,
}

/// Auto-tap configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoTapConfig {
    #[serde(default = "default_cadence_ms")]
    pub cadence_ms: u64,
}

/// Fortune draw configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawConfig {
    /// Base percentage chance before adding session merit.
    #[serde(default = "default_base_chance")]
    pub base_chance: u64,
    /// Session merit at which a draw is guaranteed.
    #[serde(default = "default_guaranteed_threshold")]
    pub guaranteed_threshold: u64,
    /// Pause before asking the oracle, so the draw feels deliberate.
    #[serde(default = "default_reveal_delay_ms")]
    pub reveal_delay_ms: u64,
}

/// Haptic pulse lengths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HapticsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_manual_pulse_ms")]
    pub manual_pulse_ms: u64,
    #[serde(default = "default_auto_pulse_ms")]
    pub auto_pulse_ms: u64,
}

/// Oracle (fortune/quote provider) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Overridden by GEMINI_API_KEY or API_KEY when set.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Logical screen size used to place auto-tap markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_viewport_width")]
    pub width: f64,
    #[serde(default = "default_viewport_height")]
    pub height: f64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/woodfish/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub auto_tap: AutoTapConfig,
    #[serde(default)]
    pub draw: DrawConfig,
    #[serde(default)]
    pub haptics: HapticsConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
}

// Default functions
fn default_quiet_interval_ms() -> u64 {
    5_000
}
fn default_significance_threshold() -> u64 {
    5
}
fn default_feedback_lifetime_ms() -> u64 {
    800
}
fn default_feedback_label() -> String {
    "功德 +1".into()
}
fn default_cadence_ms() -> u64 {
    1_000
}
fn default_base_chance() -> u64 {
    33
}
fn default_guaranteed_threshold() -> u64 {
    200
}
fn default_reveal_delay_ms() -> u64 {
    1_500
}
fn default_manual_pulse_ms() -> u64 {
    15
}
fn default_auto_pulse_ms() -> u64 {
    10
}
fn default_model() -> String {
    "gemini-3-flash-preview".into()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_timeout_secs() -> u64 {
    20
}
fn default_viewport_width() -> f64 {
    390.0
}
fn default_viewport_height() -> f64 {
    844.0
}
fn default_true() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            quiet_interval_ms: default_quiet_interval_ms(),
            significance_threshold: default_significance_threshold(),
        }
    }
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            lifetime_ms: default_feedback_lifetime_ms(),
            label: default_feedback_label(),
        }
    }
}

impl Default for AutoTapConfig {
    fn default() -> Self {
        Self {
            cadence_ms: default_cadence_ms(),
        }
    }
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            base_chance: default_base_chance(),
            guaranteed_threshold: default_guaranteed_threshold(),
            reveal_delay_ms: default_reveal_delay_ms(),
        }
    }
}

impl Default for HapticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            manual_pulse_ms: default_manual_pulse_ms(),
            auto_pulse_ms: default_auto_pulse_ms(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_viewport_width(),
            height: default_viewport_height(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            feedback: FeedbackConfig::default(),
            auto_tap: AutoTapConfig::default(),
            draw: DrawConfig::default(),
            haptics: HapticsConfig::default(),
            oracle: OracleConfig::default(),
            viewport: ViewportConfig::default(),
            sound_enabled: true,
        }
    }
}

/// `draw.base_chance` as the JSON pointer `/draw/base_chance`.
fn pointer(key: &str) -> Option<String> {
    let well_formed = key
        .split('.')
        .all(|part| !part.is_empty() && !part.contains(['/', '~']));
    well_formed.then(|| format!("/{}", key.replace('.', "/")))
}

/// Parse `raw` into the JSON type already stored at `key`.
fn parse_like(existing: &Value, key: &str, raw: &str) -> Result<Value, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    };
    match existing {
        Value::Bool(_) => raw
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|e| invalid(e.to_string())),
        Value::Number(_) => raw.parse::<u64>().map(Value::from).or_else(|_| {
            raw.parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| invalid(format!("'{raw}' is not a number")))
        }),
        Value::Object(_) | Value::Array(_) => {
            serde_json::from_str(raw).map_err(|e| invalid(e.to_string()))
        }
        // `oracle.api_key` is null until set.
        Value::Null | Value::String(_) => Ok(Value::String(raw.to_string())),
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/woodfish"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there only if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// default config cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get a config value as string by dot-separated key, e.g.
    /// `session.quiet_interval_ms` or `oracle.model`.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        match json.pointer(&pointer(key)?)? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving. The value is parsed as the
    /// type the key already holds.
    ///
    /// # Errors
    ///
    /// Returns `UnknownKey` if no such key exists, or `InvalidValue` if the
    /// value does not fit the field.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        let slot = pointer(key)
            .and_then(|p| json.pointer_mut(&p))
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        let parsed = parse_like(slot, key, value)?;
        *slot = parsed;
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    /// Set a config value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// API key from the environment, falling back to the config file.
    pub fn api_key(&self) -> Option<String> {
        ["GEMINI_API_KEY", "API_KEY"]
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|k| !k.trim().is_empty()))
            .or_else(|| self.oracle.api_key.clone())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.draw.reveal_delay_ms)
    }

    /// Timing and odds for the session engine.
    pub fn engine_settings(&self) -> EngineSettings {
        let haptic = |ms: u64| {
            if self.haptics.enabled {
                Duration::from_millis(ms)
            } else {
                Duration::ZERO
            }
        };
        EngineSettings {
            quiet_interval_ms: self.session.quiet_interval_ms,
            significance_threshold: self.session.significance_threshold,
            feedback_lifetime_ms: self.feedback.lifetime_ms,
            feedback_label: self.feedback.label.clone(),
            auto_tap_cadence_ms: self.auto_tap.cadence_ms,
            draw: DrawRule {
                base_chance: self.draw.base_chance,
                guaranteed_threshold: self.draw.guaranteed_threshold,
            },
            manual_pulse: haptic(self.haptics.manual_pulse_ms),
            auto_pulse: haptic(self.haptics.auto_pulse_ms),
            viewport: (self.viewport.width, self.viewport.height),
            sound_enabled: self.sound_enabled,
            ..EngineSettings::default()
        }
    }
}
