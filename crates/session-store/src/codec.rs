//! JSON encoding shared by every backend

use crate::error::Result;
use cadence_core_model::{SessionState, TelemetryPayload};
use serde::de::DeserializeOwned;
use tracing::warn;

/// Encode a telemetry sample
///
/// Payloads are validated on construction, so only encoding can fail here.
pub fn encode_telemetry(payload: &TelemetryPayload) -> Result<String> {
    Ok(serde_json::to_string(payload)?)
}

/// Validate and encode a session state
pub fn encode_state(state: &SessionState) -> Result<String> {
    state.validate()?;
    Ok(serde_json::to_string(state)?)
}

/// Decode a durable value; corruption is an error
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T> {
    Ok(serde_json::from_str(raw)?)
}

/// Decode a cached value; corruption is logged and treated as a miss
pub fn decode_cached<T: DeserializeOwned>(key: &str, raw: &str) -> Option<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Discarding corrupt cache entry {}: {}", key, e);
            None
        }
    }
}
