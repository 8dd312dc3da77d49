//! Cadence Core Model: telemetry, rules and session state
//!
//! # Overview
//!
//! Plain data types shared by every Cadence layer:
//!
//! - [`TelemetryPayload`]: one validated sample of numeric metrics for a session
//! - [`TriggerRule`]: a threshold comparison over one metric proposing a genre
//! - [`SessionConfig`]: the rule set and fallback genre of a session
//! - [`SessionState`]: configuration plus the last processed metrics and status
//!
//! Invariants are enforced where values enter the system (constructors and
//! deserialization) and reported as [`ValidationError`].
//!
//! # Example
//!
//! ```
//! use cadence_core_model::{Metrics, SessionConfig, TelemetryPayload, TriggerOperator, TriggerRule};
//!
//! let config = SessionConfig::new("raid-42")
//!     .with_default_genre("exploration")
//!     .with_rule(TriggerRule::new("hp", TriggerOperator::Lt, 10.0, "funeral"));
//! assert!(config.validate().is_ok());
//!
//! let mut metrics = Metrics::new();
//! metrics.insert("hp".to_string(), 5.0);
//! let sample = TelemetryPayload::new("raid-42", metrics).unwrap();
//! assert_eq!(sample.metric("hp"), Some(5.0));
//!
//! let mut bad = Metrics::new();
//! bad.insert("hp".to_string(), f64::NAN);
//! assert!(TelemetryPayload::new("raid-42", bad).is_err());
//! ```

pub mod error;
pub mod session;
pub mod telemetry;

pub use error::{Result, ValidationError};
pub use session::{SessionConfig, SessionState, SessionStatus, TriggerOperator, TriggerRule};
pub use telemetry::{validate_session_id, Metrics, TelemetryPayload, MIN_SESSION_ID_LEN};
