//! Parsing of CLI input files

use crate::error::{CadenceError, Result};
use cadence_core_model::{SessionConfig, SessionState, TelemetryPayload};

/// Parse telemetry from a JSON object, a JSON array or JSON Lines
pub fn parse_telemetry(text: &str) -> Result<Vec<TelemetryPayload>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    if let Ok(payload) = serde_json::from_str::<TelemetryPayload>(trimmed) {
        return Ok(vec![payload]);
    }

    trimmed
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line)
                .map_err(|e| CadenceError::Parse(format!("line {}: {}", index + 1, e)))
        })
        .collect()
}

/// Parse a full session state, or a bare configuration wrapped into a fresh
/// state
pub fn parse_session(text: &str) -> Result<SessionState> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    if value.get("config").is_some() {
        Ok(serde_json::from_value(value)?)
    } else {
        let config: SessionConfig = serde_json::from_value(value)?;
        Ok(SessionState::new(config))
    }
}
