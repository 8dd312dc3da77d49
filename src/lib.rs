/*!
 * Cadence - telemetry-driven genre selection
 *
 * Ingests periodic numeric telemetry for running sessions, evaluates each
 * session's threshold rules and decides which genre should be playing:
 * - Priority-ordered rule resolution (first declared rule wins ties)
 * - Dual writes to a TTL cache and a durable store, with typed partial-failure outcomes
 * - Cache-aside reads with write-back on store hits
 * - Exponential backoff with jitter around every backend and provider call
 * - Pluggable backends: in-memory, redb, Redis
 */

pub mod commands;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod factory;
pub mod logging;

// Re-export commonly used types
pub use config::CadenceConfig;
pub use dispatch::{GenreDispatcher, PlaybackProvider};
pub use engine::{EngineError, Orchestrator, PersistOutcome, RetrySettings, TelemetryOutcome};
pub use error::{CadenceError, Result};

pub use cadence_core_model as model;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
