//! Cadence Core Rules: threshold evaluation and priority resolution
//!
//! Turns a telemetry sample and a session's rule set into the genre that
//! should be playing.
//!
//! # Example
//!
//! ```
//! use cadence_core_model::{Metrics, SessionConfig, TriggerOperator, TriggerRule};
//! use cadence_core_rules::resolve;
//!
//! let config = SessionConfig::new("raid-42")
//!     .with_rule(TriggerRule::new("hp", TriggerOperator::Lt, 10.0, "funeral"))
//!     .with_rule(TriggerRule::new("energy", TriggerOperator::Gt, 90.0, "battle").with_priority(5));
//!
//! let mut metrics = Metrics::new();
//! metrics.insert("hp".to_string(), 5.0);
//! metrics.insert("energy".to_string(), 95.0);
//!
//! let resolution = resolve(&config, &metrics);
//! assert_eq!(resolution.target_genre, Some("battle"));
//! ```

pub mod evaluator;
pub mod resolver;

pub use evaluator::{is_triggered, rule_fires};
pub use resolver::{highest_priority, resolve, Resolution};
