//! Error types for the persistence ports

use cadence_core_model::ValidationError;
use std::time::Duration;
use thiserror::Error;

/// Result type for cache and store operations
pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Errors surfaced by a [`SessionCache`](crate::SessionCache) or
/// [`SessionStore`](crate::SessionStore) backend
///
/// Validation failures are kept apart from connectivity failures so callers
/// never retry a write that can only fail again.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PersistenceError {
    /// Value rejected before reaching the backend
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Backend could not be reached (connection refused, reset, dropped)
    #[error("Backend '{backend}' unavailable: {reason}")]
    Unavailable { backend: String, reason: String },

    /// Backend did not answer in time
    #[error("Backend '{backend}' timed out after {elapsed:?}")]
    Timeout { backend: String, elapsed: Duration },

    /// Value could not be encoded for storage
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Backend reported a non-recoverable failure
    #[error("Backend '{backend}' error: {reason}")]
    Backend { backend: String, reason: String },
}

impl PersistenceError {
    pub fn unavailable(backend: &str, reason: impl ToString) -> Self {
        PersistenceError::Unavailable {
            backend: backend.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn backend(backend: &str, reason: impl ToString) -> Self {
        PersistenceError::Backend {
            backend: backend.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Check if this error is transient and the call can be retried
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PersistenceError::Unavailable { .. } | PersistenceError::Timeout { .. }
        )
    }

    /// Check if the value itself was rejected
    pub fn is_validation(&self) -> bool {
        matches!(self, PersistenceError::Validation(_))
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(PersistenceError::unavailable("redis", "connection refused").is_transient());
        assert!(PersistenceError::Timeout {
            backend: "redis".to_string(),
            elapsed: Duration::from_secs(1),
        }
        .is_transient());

        let validation = PersistenceError::from(ValidationError::EmptyMetrics);
        assert!(validation.is_validation());
        assert!(!validation.is_transient());

        assert!(!PersistenceError::backend("redb", "corrupted page").is_transient());
        assert!(!PersistenceError::Serialization("bad".to_string()).is_transient());
    }
}
