//! Errors raised by the orchestration engine

use cadence_core_model::ValidationError;
use thiserror::Error;

/// Faults that escape the engine
///
/// Persistence failures are never returned here; they are reported through
/// [`PersistOutcome`](super::PersistOutcome) instead.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input rejected before any persistence call was made
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The background write task panicked or was aborted
    #[error("Persistence task failed: {0}")]
    WriteTask(String),
}

impl EngineError {
    pub fn is_validation(&self) -> bool {
        matches!(self, EngineError::Validation(_))
    }
}
