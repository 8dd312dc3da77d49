//! Validation errors for Cadence data model types

use thiserror::Error;

/// Result type for model construction and validation
pub type Result<T> = std::result::Result<T, ValidationError>;

/// An invariant of a telemetry sample, rule or session was violated
///
/// Validation failures are never retried: the same input fails the same way.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Session id shorter than the minimum length
    #[error("Session id '{session_id}' is too short (minimum {min} characters)")]
    SessionIdTooShort { session_id: String, min: usize },

    /// Telemetry sample carried no metrics
    #[error("Telemetry payload must contain at least one metric")]
    EmptyMetrics,

    /// Metric value is NaN or infinite
    #[error("Metric '{name}' has a non-finite value ({value})")]
    NonFiniteMetric { name: String, value: f64 },

    /// Rule definition is malformed
    #[error("Invalid rule #{index}: {reason}")]
    InvalidRule { index: usize, reason: String },

    /// Comparison operator is not one of the supported five
    #[error("Unknown trigger operator: '{0}'")]
    UnknownOperator(String),

    /// Timestamp could not be represented
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
