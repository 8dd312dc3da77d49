//! Typed results of engine writes

use cadence_core_model::{SessionStatus, TelemetryPayload, TriggerRule};
use cadence_session_store::PersistenceError;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Result of one dual write (cache + store)
///
/// Each tier's final failure is kept, so a cache-only failure can be told
/// apart from a store-only one.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistOutcome {
    /// Both tiers accepted the write
    Persisted,
    /// Store has the value, cache does not
    CacheFailed(PersistenceError),
    /// Cache has the value, store does not
    StoreFailed(PersistenceError),
    /// Neither tier has the value
    BothFailed {
        cache: PersistenceError,
        store: PersistenceError,
    },
}

impl PersistOutcome {
    pub fn from_results(
        cache: Result<(), PersistenceError>,
        store: Result<(), PersistenceError>,
    ) -> Self {
        match (cache, store) {
            (Ok(()), Ok(())) => PersistOutcome::Persisted,
            (Err(cache), Ok(())) => PersistOutcome::CacheFailed(cache),
            (Ok(()), Err(store)) => PersistOutcome::StoreFailed(store),
            (Err(cache), Err(store)) => PersistOutcome::BothFailed { cache, store },
        }
    }

    /// Both tiers hold the value
    pub fn is_persisted(&self) -> bool {
        matches!(self, PersistOutcome::Persisted)
    }

    /// The store holds the value (the cache may not)
    pub fn is_durable(&self) -> bool {
        matches!(
            self,
            PersistOutcome::Persisted | PersistOutcome::CacheFailed(_)
        )
    }

    pub fn cache_error(&self) -> Option<&PersistenceError> {
        match self {
            PersistOutcome::CacheFailed(e) | PersistOutcome::BothFailed { cache: e, .. } => Some(e),
            _ => None,
        }
    }

    pub fn store_error(&self) -> Option<&PersistenceError> {
        match self {
            PersistOutcome::StoreFailed(e) | PersistOutcome::BothFailed { store: e, .. } => Some(e),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            PersistOutcome::Persisted => "persisted",
            PersistOutcome::CacheFailed(_) => "cache_failed",
            PersistOutcome::StoreFailed(_) => "store_failed",
            PersistOutcome::BothFailed { .. } => "both_failed",
        }
    }
}

impl Serialize for PersistOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("PersistOutcome", 3)?;
        s.serialize_field("outcome", self.label())?;
        s.serialize_field("cache_error", &self.cache_error().map(|e| e.to_string()))?;
        s.serialize_field("store_error", &self.store_error().map(|e| e.to_string()))?;
        s.end()
    }
}

/// Everything `process_telemetry` decided and persisted for one sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryOutcome {
    pub session_id: String,

    /// Genre the caller should switch to, if any
    pub target_genre: Option<String>,

    /// Highest-priority rule that fired
    pub triggered_rule: Option<TriggerRule>,

    pub status: SessionStatus,

    pub active_rule_metric: Option<String>,

    /// Dual write of the sample itself
    pub telemetry: PersistOutcome,

    /// Dual write of the updated session state; `None` for unknown sessions
    /// and when the state could not be read
    pub state: Option<PersistOutcome>,

    /// Store failure that prevented reading the session state
    #[serde(serialize_with = "serialize_error")]
    pub state_read_error: Option<PersistenceError>,
}

fn serialize_error<S: Serializer>(
    error: &Option<PersistenceError>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    error.as_ref().map(|e| e.to_string()).serialize(serializer)
}

impl TelemetryOutcome {
    pub(crate) fn unconfigured(payload: &TelemetryPayload, telemetry: PersistOutcome) -> Self {
        Self {
            session_id: payload.session_id().to_string(),
            target_genre: None,
            triggered_rule: None,
            status: SessionStatus::Nominal,
            active_rule_metric: None,
            telemetry,
            state: None,
            state_read_error: None,
        }
    }

    pub(crate) fn state_unavailable(
        payload: &TelemetryPayload,
        telemetry: PersistOutcome,
        error: PersistenceError,
    ) -> Self {
        Self {
            state_read_error: Some(error),
            ..Self::unconfigured(payload, telemetry)
        }
    }

    /// The session state was read, so rules were evaluated if it exists
    pub fn is_evaluated(&self) -> bool {
        self.state_read_error.is_none()
    }

    /// The state was readable and every write reached the durable store
    pub fn is_durable(&self) -> bool {
        self.is_evaluated()
            && self.telemetry.is_durable()
            && self.state.as_ref().is_none_or(PersistOutcome::is_durable)
    }

    /// The state was readable and every write reached both tiers
    pub fn is_persisted(&self) -> bool {
        self.is_evaluated()
            && self.telemetry.is_persisted()
            && self.state.as_ref().is_none_or(PersistOutcome::is_persisted)
    }
}
