//! Telemetry samples
//!
//! A [`TelemetryPayload`] is one periodic sample of named numeric metrics for a
//! running session. Every way of obtaining a payload (the constructors and
//! deserialization) runs the same validation, so a payload in hand is always
//! well-formed:
//!
//! - the session id has at least [`MIN_SESSION_ID_LEN`] characters
//! - there is at least one metric
//! - every metric value is finite (no NaN, no ±infinity)

use crate::error::{Result, ValidationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Minimum number of characters in a session id
pub const MIN_SESSION_ID_LEN: usize = 3;

/// Metric name to value mapping
///
/// Ordered so that serialized samples are deterministic.
pub type Metrics = BTreeMap<String, f64>;

/// Check that a session id satisfies the minimum length
pub fn validate_session_id(session_id: &str) -> Result<()> {
    if session_id.chars().count() < MIN_SESSION_ID_LEN {
        return Err(ValidationError::SessionIdTooShort {
            session_id: session_id.to_string(),
            min: MIN_SESSION_ID_LEN,
        });
    }
    Ok(())
}

/// Check that every metric value is finite
///
/// An empty mapping is accepted here; callers that require at least one
/// metric check that separately.
pub fn validate_finite(metrics: &Metrics) -> Result<()> {
    match metrics.iter().find(|(_, value)| !value.is_finite()) {
        Some((name, value)) => Err(ValidationError::NonFiniteMetric {
            name: name.clone(),
            value: *value,
        }),
        None => Ok(()),
    }
}

/// One ingested telemetry sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTelemetryPayload")]
pub struct TelemetryPayload {
    session_id: String,
    timestamp: DateTime<Utc>,
    metrics: Metrics,
}

impl TelemetryPayload {
    /// Create a sample stamped with the current time
    pub fn new(session_id: impl Into<String>, metrics: Metrics) -> Result<Self> {
        Self::with_timestamp(session_id, Utc::now(), metrics)
    }

    /// Create a sample with an explicit timestamp
    pub fn with_timestamp(
        session_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        metrics: Metrics,
    ) -> Result<Self> {
        let payload = Self {
            session_id: session_id.into(),
            timestamp,
            metrics,
        };
        payload.validate()?;
        Ok(payload)
    }

    /// Re-check the payload invariants
    pub fn validate(&self) -> Result<()> {
        validate_session_id(&self.session_id)?;
        if self.metrics.is_empty() {
            return Err(ValidationError::EmptyMetrics);
        }
        validate_finite(&self.metrics)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Value of a single metric, if present in this sample
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    pub fn into_metrics(self) -> Metrics {
        self.metrics
    }
}

/// Wire shape accepted on deserialization
#[derive(Deserialize)]
struct RawTelemetryPayload {
    session_id: String,
    #[serde(default)]
    timestamp: Option<RawTimestamp>,
    metrics: Metrics,
}

/// Producers send either RFC 3339 strings or Unix epoch seconds
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Rfc3339(DateTime<Utc>),
    Epoch(f64),
}

impl RawTimestamp {
    fn into_datetime(self) -> Result<DateTime<Utc>> {
        match self {
            RawTimestamp::Rfc3339(dt) => Ok(dt),
            RawTimestamp::Epoch(secs) => {
                if !secs.is_finite() {
                    return Err(ValidationError::InvalidTimestamp(secs.to_string()));
                }
                let whole = secs.floor();
                let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
                DateTime::<Utc>::from_timestamp(whole as i64, nanos)
                    .ok_or_else(|| ValidationError::InvalidTimestamp(secs.to_string()))
            }
        }
    }
}

impl TryFrom<RawTelemetryPayload> for TelemetryPayload {
    type Error = ValidationError;

    fn try_from(raw: RawTelemetryPayload) -> Result<Self> {
        let timestamp = match raw.timestamp {
            Some(ts) => ts.into_datetime()?,
            None => Utc::now(),
        };
        Self::with_timestamp(raw.session_id, timestamp, raw.metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(pairs: &[(&str, f64)]) -> Metrics {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_valid_payload() {
        let payload = TelemetryPayload::new("session-1", metrics(&[("hp", 42.0)])).unwrap();
        assert_eq!(payload.session_id(), "session-1");
        assert_eq!(payload.metric("hp"), Some(42.0));
        assert_eq!(payload.metric("mana"), None);
    }

    #[test]
    fn test_zero_is_a_valid_metric() {
        let payload = TelemetryPayload::new("abc", metrics(&[("hp", 0.0)])).unwrap();
        assert_eq!(payload.metric("hp"), Some(0.0));
    }

    #[test]
    fn test_short_session_id_rejected() {
        let err = TelemetryPayload::new("ab", metrics(&[("hp", 1.0)])).unwrap_err();
        assert!(matches!(err, ValidationError::SessionIdTooShort { .. }));
    }

    #[test]
    fn test_empty_metrics_rejected() {
        let err = TelemetryPayload::new("abc", Metrics::new()).unwrap_err();
        assert_eq!(err, ValidationError::EmptyMetrics);
    }

    #[test]
    fn test_non_finite_metrics_rejected() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = TelemetryPayload::new("abc", metrics(&[("hp", 1.0), ("energy", bad)]))
                .unwrap_err();
            match err {
                ValidationError::NonFiniteMetric { name, .. } => assert_eq!(name, "energy"),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_deserialize_epoch_timestamp() {
        let json = r#"{"session_id":"abc","timestamp":1700000000.5,"metrics":{"hp":10}}"#;
        let payload: TelemetryPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.timestamp().timestamp(), 1_700_000_000);
        assert_eq!(payload.timestamp().timestamp_subsec_millis(), 500);
        assert_eq!(payload.metric("hp"), Some(10.0));
    }

    #[test]
    fn test_deserialize_missing_timestamp_defaults_to_now() {
        let before = Utc::now();
        let payload: TelemetryPayload =
            serde_json::from_str(r#"{"session_id":"abc","metrics":{"hp":1.5}}"#).unwrap();
        assert!(payload.timestamp() >= before);
    }

    #[test]
    fn test_deserialize_rejects_invalid_payloads() {
        assert!(serde_json::from_str::<TelemetryPayload>(
            r#"{"session_id":"abc","metrics":{}}"#
        )
        .is_err());
        assert!(serde_json::from_str::<TelemetryPayload>(
            r#"{"session_id":"x","metrics":{"hp":1}}"#
        )
        .is_err());
    }
}
