//! # Woodfish Core Library
//!
//! Core logic for a tap-for-merit "wooden fish": every tap adds one unit of
//! merit, a quiet period ends the session, and a significant session may
//! draw a fortune from an external oracle.
//!
//! ## Architecture
//!
//! - **Session engine**: [`MeritEngine`] is a clock-driven state machine with
//!   no internal threads; the caller supplies monotonic milliseconds and
//!   calls `tick()` at [`MeritEngine::next_deadline`]
//! - **Runtime**: [`runtime::Runtime`] drives the engine on tokio, serialising
//!   commands, timers and oracle completions onto one task
//! - **Storage**: SQLite key-value persistence and TOML configuration
//! - **Oracle**: fortune and quote providers with fixed fallbacks
//!
//! ## Key Components
//!
//! - [`MeritEngine`]: taps, sessions, outcomes, auto-tap
//! - [`MeritState`]: lifetime count, golden flag and last fortune
//! - [`Database`]: persistent key-value store
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod fortune;
pub mod oracle;
pub mod random;
pub mod runtime;
pub mod session;
pub mod signals;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, ProviderError, StorageError};
pub use events::Event;
pub use fortune::{FortuneRecord, Luck};
pub use oracle::{AnyOracle, GeminiOracle, OfflineOracle, Oracle};
pub use random::{RandomSource, RngSource};
pub use runtime::{Command, Runtime};
pub use session::{EngineSettings, EngineView, MeritEngine, Outcome, OutcomeMode, Point};
pub use signals::{SilentSignals, TapSignals};
pub use storage::{Config, Database, KvStore, MemoryStore, MeritState};
