//! Session configuration and runtime state
//!
//! A session is configured once with a [`SessionConfig`] (a fallback genre and
//! a flat list of [`TriggerRule`]s) and then carries a [`SessionState`] that the
//! engine rewrites on every processed telemetry sample.

use crate::error::{Result, ValidationError};
use crate::telemetry::{validate_finite, validate_session_id, Metrics};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric comparison applied between a metric value and a rule threshold
///
/// Serialized as `lt | le | eq | ge | gt`; the symbolic forms are accepted on
/// input as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TriggerOperator {
    /// `value < threshold`
    Lt,
    /// `value <= threshold`
    Le,
    /// `value == threshold`
    Eq,
    /// `value >= threshold`
    Ge,
    /// `value > threshold`
    Gt,
}

impl TriggerOperator {
    /// All operators, in declaration order
    pub const ALL: [TriggerOperator; 5] = [
        TriggerOperator::Lt,
        TriggerOperator::Le,
        TriggerOperator::Eq,
        TriggerOperator::Ge,
        TriggerOperator::Gt,
    ];

    /// Symbolic form, e.g. `<=`
    pub fn symbol(&self) -> &'static str {
        match self {
            TriggerOperator::Lt => "<",
            TriggerOperator::Le => "<=",
            TriggerOperator::Eq => "==",
            TriggerOperator::Ge => ">=",
            TriggerOperator::Gt => ">",
        }
    }
}

impl fmt::Display for TriggerOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerOperator::Lt => write!(f, "lt"),
            TriggerOperator::Le => write!(f, "le"),
            TriggerOperator::Eq => write!(f, "eq"),
            TriggerOperator::Ge => write!(f, "ge"),
            TriggerOperator::Gt => write!(f, "gt"),
        }
    }
}

impl FromStr for TriggerOperator {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "lt" | "<" => Ok(TriggerOperator::Lt),
            "le" | "<=" => Ok(TriggerOperator::Le),
            "eq" | "==" => Ok(TriggerOperator::Eq),
            "ge" | ">=" => Ok(TriggerOperator::Ge),
            "gt" | ">" => Ok(TriggerOperator::Gt),
            _ => Err(ValidationError::UnknownOperator(s.to_string())),
        }
    }
}

impl TryFrom<String> for TriggerOperator {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TriggerOperator> for String {
    fn from(op: TriggerOperator) -> Self {
        op.to_string()
    }
}

fn default_priority() -> i64 {
    1
}

/// A single activation condition over one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRule {
    /// Metric the rule watches (e.g. "hp", "sanity")
    pub metric_name: String,

    /// Comparison applied as `value <operator> threshold`
    pub operator: TriggerOperator,

    /// Threshold compared against
    pub threshold: f64,

    /// Genre to activate when the rule fires
    pub target_genre: String,

    /// Higher wins when several rules fire together
    #[serde(default = "default_priority")]
    pub priority: i64,
}

impl TriggerRule {
    /// Create a rule with the default priority of 1
    pub fn new(
        metric_name: impl Into<String>,
        operator: TriggerOperator,
        threshold: f64,
        target_genre: impl Into<String>,
    ) -> Self {
        Self {
            metric_name: metric_name.into(),
            operator,
            threshold,
            target_genre: target_genre.into(),
            priority: default_priority(),
        }
    }

    /// Builder-style priority override
    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    fn validate(&self, index: usize) -> Result<()> {
        let invalid = |reason: &str| ValidationError::InvalidRule {
            index,
            reason: reason.to_string(),
        };

        if self.metric_name.trim().is_empty() {
            return Err(invalid("metric_name must not be empty"));
        }
        if self.target_genre.trim().is_empty() {
            return Err(invalid("target_genre must not be empty"));
        }
        if !self.threshold.is_finite() {
            return Err(invalid("threshold must be finite"));
        }
        Ok(())
    }
}

impl fmt::Display for TriggerRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} -> {} (priority {})",
            self.metric_name,
            self.operator.symbol(),
            self.threshold,
            self.target_genre,
            self.priority
        )
    }
}

/// Durable configuration of one session
///
/// Replaced wholesale; the engine never edits it in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub session_id: String,

    /// Genre played when no rule fires
    #[serde(default)]
    pub default_genre: Option<String>,

    /// Rules in declaration order (declaration order breaks priority ties)
    #[serde(default)]
    pub rules: Vec<TriggerRule>,
}

impl SessionConfig {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            default_genre: None,
            rules: Vec::new(),
        }
    }

    pub fn with_default_genre(mut self, genre: impl Into<String>) -> Self {
        self.default_genre = Some(genre.into());
        self
    }

    pub fn with_rule(mut self, rule: TriggerRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_session_id(&self.session_id)?;
        for (index, rule) in self.rules.iter().enumerate() {
            rule.validate(index)?;
        }
        Ok(())
    }
}

/// Whether any rule is currently firing for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionStatus {
    #[default]
    Nominal,
    Critical,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Nominal => write!(f, "NOMINAL"),
            SessionStatus::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Runtime state persisted to both cache and store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub config: SessionConfig,

    /// Metrics of the most recently processed sample
    #[serde(default)]
    pub last_metrics: Option<Metrics>,

    #[serde(default)]
    pub current_status: SessionStatus,

    /// Metric of the rule currently driving genre selection
    #[serde(default)]
    pub active_rule_metric: Option<String>,
}

impl SessionState {
    /// Setup state: nominal, no metrics seen yet
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            last_metrics: None,
            current_status: SessionStatus::Nominal,
            active_rule_metric: None,
        }
    }

    /// Key under which the state is persisted
    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;
        if let Some(metrics) = &self.last_metrics {
            validate_finite(metrics)?;
        }
        Ok(())
    }
}
