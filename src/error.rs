/*!
 * Error types for Cadence
 */

use crate::engine::EngineError;
use cadence_core_model::ValidationError;
use cadence_core_resilience::ResilienceError;
use cadence_session_store::PersistenceError;
use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CadenceError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

#[derive(Debug, Error)]
pub enum CadenceError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Input could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Telemetry, rule or session rejected
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Backend construction or direct backend call failed
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Engine fault
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Playback provider failure or invalid retry policy
    #[error("Resilience error: {0}")]
    Resilience(#[from] ResilienceError),

    /// Write accepted but not confirmed by both tiers
    #[error("Session '{0}' was not durably persisted")]
    NotDurable(String),

    /// Read found nothing in either tier
    #[error("Not found: {0}")]
    NotFound(String),
}

impl CadenceError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // Fatal errors: bad config, bad input, unusable backends
            CadenceError::Config(_)
            | CadenceError::Io(_)
            | CadenceError::Parse(_)
            | CadenceError::Validation(_)
            | CadenceError::Persistence(_) => EXIT_FATAL,
            CadenceError::Engine(e) if e.is_validation() => EXIT_FATAL,
            CadenceError::Resilience(ResilienceError::InvalidPolicy(_)) => EXIT_FATAL,
            // Partial failures: accepted but not durable, missing data, provider errors
            _ => EXIT_PARTIAL,
        }
    }
}

impl From<serde_json::Error> for CadenceError {
    fn from(err: serde_json::Error) -> Self {
        CadenceError::Parse(err.to_string())
    }
}
