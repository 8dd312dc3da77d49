//! Storage key layout
//!
//! Both tiers address values by a two-part path built from the session id and
//! a fixed kind suffix. The template is configurable so several deployments
//! can share one keyspace.

use crate::error::{PersistenceError, Result};
use std::fmt;

/// Default template, e.g. `sessions/raid-42/state`
pub const DEFAULT_KEY_TEMPLATE: &str = "sessions/{session_id}/{kind}";

const SESSION_ID_PLACEHOLDER: &str = "{session_id}";
const KIND_PLACEHOLDER: &str = "{kind}";

/// Which value a key addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// Latest telemetry sample
    Telemetry,
    /// Session state (config + runtime status)
    State,
}

impl KeyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyKind::Telemetry => "telemetry",
            KeyKind::State => "state",
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders storage keys from a namespace template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    template: String,
}

impl Default for KeyLayout {
    fn default() -> Self {
        Self {
            template: DEFAULT_KEY_TEMPLATE.to_string(),
        }
    }
}

impl KeyLayout {
    /// Create a layout, rejecting templates that lack either placeholder
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        Self::check_template(&template)?;
        Ok(Self { template })
    }

    /// Validate a template without building a layout
    pub fn check_template(template: &str) -> Result<()> {
        for placeholder in [SESSION_ID_PLACEHOLDER, KIND_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(PersistenceError::backend(
                    "key-layout",
                    format!("template '{}' is missing {}", template, placeholder),
                ));
            }
        }
        Ok(())
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn key(&self, session_id: &str, kind: KeyKind) -> String {
        self.template
            .replace(SESSION_ID_PLACEHOLDER, session_id)
            .replace(KIND_PLACEHOLDER, kind.as_str())
    }

    pub fn telemetry_key(&self, session_id: &str) -> String {
        self.key(session_id, KeyKind::Telemetry)
    }

    pub fn state_key(&self, session_id: &str) -> String {
        self.key(session_id, KeyKind::State)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let layout = KeyLayout::default();
        assert_eq!(layout.telemetry_key("raid-42"), "sessions/raid-42/telemetry");
        assert_eq!(layout.state_key("raid-42"), "sessions/raid-42/state");
    }

    #[test]
    fn test_custom_template() {
        let layout = KeyLayout::new("cadence:{kind}:{session_id}").unwrap();
        assert_eq!(layout.state_key("abc"), "cadence:state:abc");
    }

    #[test]
    fn test_template_requires_both_placeholders() {
        assert!(KeyLayout::new("sessions/{session_id}").is_err());
        assert!(KeyLayout::new("{kind}").is_err());
        assert!(KeyLayout::check_template(DEFAULT_KEY_TEMPLATE).is_ok());
    }
}
