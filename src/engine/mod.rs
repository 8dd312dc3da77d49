//! Orchestration engine
//!
//! The [`Orchestrator`] ties rule resolution to the two persistence tiers:
//!
//! - **Writes** go to the cache and the store concurrently. Both are always
//!   attempted, each under its own retry budget, and the result is reported
//!   as a [`PersistOutcome`] instead of an error.
//! - **Reads** are cache-aside: cache first, then the store, repopulating the
//!   cache on a store hit. An unreachable cache degrades to a miss. The
//!   public `get_*` reads also degrade an unreachable store to not-found.
//!   `process_telemetry` does not: it reports the failed state read on the
//!   returned [`TelemetryOutcome`].
//!
//! Errors returned from processing are validation failures, raised before any
//! persistence call is made, and [`EngineError::WriteTask`] when a spawned
//! write task dies.
//!
//! Writes run in a spawned task that the caller awaits. Dropping the caller's
//! future therefore does not cancel an in-flight dual write halfway.

mod error;
mod outcome;

pub use error::EngineError;
pub use outcome::{PersistOutcome, TelemetryOutcome};

use async_trait::async_trait;
use cadence_core_model::{validate_session_id, SessionState, TelemetryPayload};
use cadence_core_resilience::{with_retry_if, RetryPolicy};
use cadence_core_rules::resolve;
use cadence_session_store::{PersistenceError, SessionCache, SessionStore};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub type Result<T> = std::result::Result<T, EngineError>;

/// Retry budgets for each persistence tier
#[derive(Debug, Clone, PartialEq)]
pub struct RetrySettings {
    pub cache: RetryPolicy,
    pub store: RetryPolicy,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            cache: RetryPolicy::persistence(),
            store: RetryPolicy::persistence(),
        }
    }
}

fn is_retryable(err: &PersistenceError) -> bool {
    !err.is_validation()
}

/// A value persisted under a session id in both tiers
#[async_trait]
trait Record: Clone + Send + Sync + 'static {
    const KIND: &'static str;

    fn session_id(&self) -> &str;

    async fn cache_get(cache: &dyn SessionCache, session_id: &str) -> PersistResult<Option<Self>>;
    async fn cache_set(cache: &dyn SessionCache, value: &Self) -> PersistResult<()>;
    async fn store_get(store: &dyn SessionStore, session_id: &str) -> PersistResult<Option<Self>>;
    async fn store_set(store: &dyn SessionStore, value: &Self) -> PersistResult<()>;
}

type PersistResult<T> = std::result::Result<T, PersistenceError>;

#[async_trait]
impl Record for TelemetryPayload {
    const KIND: &'static str = "telemetry";

    fn session_id(&self) -> &str {
        TelemetryPayload::session_id(self)
    }

    async fn cache_get(cache: &dyn SessionCache, session_id: &str) -> PersistResult<Option<Self>> {
        cache.get_telemetry(session_id).await
    }

    async fn cache_set(cache: &dyn SessionCache, value: &Self) -> PersistResult<()> {
        cache.set_telemetry(value).await
    }

    async fn store_get(store: &dyn SessionStore, session_id: &str) -> PersistResult<Option<Self>> {
        store.get_telemetry(session_id).await
    }

    async fn store_set(store: &dyn SessionStore, value: &Self) -> PersistResult<()> {
        store.set_telemetry(value).await
    }
}

#[async_trait]
impl Record for SessionState {
    const KIND: &'static str = "session";

    fn session_id(&self) -> &str {
        SessionState::session_id(self)
    }

    async fn cache_get(cache: &dyn SessionCache, session_id: &str) -> PersistResult<Option<Self>> {
        cache.get_session(session_id).await
    }

    async fn cache_set(cache: &dyn SessionCache, value: &Self) -> PersistResult<()> {
        cache.set_session(value).await
    }

    async fn store_get(store: &dyn SessionStore, session_id: &str) -> PersistResult<Option<Self>> {
        store.get_session(session_id).await
    }

    async fn store_set(store: &dyn SessionStore, value: &Self) -> PersistResult<()> {
        store.set_session(value).await
    }
}

/// Telemetry processing and dual-persistence coordinator
///
/// Cheap to clone; clones share the same cache and store clients.
#[derive(Clone)]
pub struct Orchestrator {
    cache: Arc<dyn SessionCache>,
    store: Arc<dyn SessionStore>,
    retry: RetrySettings,
}

impl Orchestrator {
    pub fn new(
        cache: Arc<dyn SessionCache>,
        store: Arc<dyn SessionStore>,
        retry: RetrySettings,
    ) -> Self {
        info!(
            "Orchestrator ready (cache: {}, store: {})",
            cache.name(),
            store.name()
        );
        Self {
            cache,
            store,
            retry,
        }
    }

    pub fn cache(&self) -> &Arc<dyn SessionCache> {
        &self.cache
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn retry_settings(&self) -> &RetrySettings {
        &self.retry
    }

    /// Persist a sample, resolve the session's rules against it and persist
    /// the updated session state
    ///
    /// A sample for a session with no stored state is still persisted; it
    /// resolves to no target and leaves `state` as `None`. When the state
    /// cannot be read at all the sample is persisted too, and the read error
    /// is carried in `state_read_error` so the outcome is never durable.
    pub async fn process_telemetry(&self, payload: TelemetryPayload) -> Result<TelemetryOutcome> {
        payload.validate()?;

        let session = self.lookup::<SessionState>(payload.session_id()).await;
        let telemetry = self.dual_write(payload.clone()).await?;

        let mut state = match session {
            Ok(Some(state)) => state,
            Ok(None) => {
                warn!(
                    "No session state for {}; telemetry stored without rule evaluation",
                    payload.session_id()
                );
                return Ok(TelemetryOutcome::unconfigured(&payload, telemetry));
            }
            Err(e) => {
                error!(
                    "🔴 FAILURE | Session state for {} unreadable, rules not evaluated: {}",
                    payload.session_id(),
                    e
                );
                return Ok(TelemetryOutcome::state_unavailable(&payload, telemetry, e));
            }
        };

        let (target_genre, triggered_rule, status, active_rule_metric) = {
            let resolution = resolve(&state.config, payload.metrics());
            (
                resolution.target_genre.map(str::to_string),
                resolution.winner.cloned(),
                resolution.status(),
                resolution.active_metric().map(str::to_string),
            )
        };

        if state.current_status != status {
            info!(
                "Session {} status {} -> {}",
                payload.session_id(),
                state.current_status,
                status
            );
        }

        state.last_metrics = Some(payload.metrics().clone());
        state.current_status = status;
        state.active_rule_metric = active_rule_metric.clone();
        state.validate()?;

        let state_outcome = self.dual_write(state).await?;

        Ok(TelemetryOutcome {
            session_id: payload.session_id().to_string(),
            target_genre,
            triggered_rule,
            status,
            active_rule_metric,
            telemetry,
            state: Some(state_outcome),
            state_read_error: None,
        })
    }

    /// Persist a session state as-is (setup or administrative overwrite)
    pub async fn process_session(&self, state: SessionState) -> Result<PersistOutcome> {
        state.validate()?;
        self.dual_write(state).await
    }

    /// Cache-aside read of the latest sample
    pub async fn get_telemetry(&self, session_id: &str) -> Result<Option<TelemetryPayload>> {
        validate_session_id(session_id)?;
        Ok(self.read_through(session_id).await)
    }

    /// Cache-aside read of the session state
    pub async fn get_session(&self, session_id: &str) -> Result<Option<SessionState>> {
        validate_session_id(session_id)?;
        Ok(self.read_through(session_id).await)
    }

    async fn dual_write<T: Record>(&self, value: T) -> Result<PersistOutcome> {
        let cache = Arc::clone(&self.cache);
        let store = Arc::clone(&self.store);
        let retry = self.retry.clone();

        let task = tokio::spawn(async move {
            let cache_op = format!("{}.set_{}", cache.name(), T::KIND);
            let store_op = format!("{}.set_{}", store.name(), T::KIND);

            let (cache_result, store_result) = tokio::join!(
                with_retry_if(
                    &retry.cache,
                    &cache_op,
                    || T::cache_set(cache.as_ref(), &value),
                    is_retryable,
                ),
                with_retry_if(
                    &retry.store,
                    &store_op,
                    || T::store_set(store.as_ref(), &value),
                    is_retryable,
                ),
            );

            let outcome = PersistOutcome::from_results(cache_result, store_result);
            match &outcome {
                PersistOutcome::Persisted => {
                    debug!("Persisted {} for {}", T::KIND, value.session_id())
                }
                PersistOutcome::CacheFailed(e) => warn!(
                    "🟡 PARTIAL | {} for {} stored durably but not cached: {}",
                    T::KIND,
                    value.session_id(),
                    e
                ),
                PersistOutcome::StoreFailed(e) => error!(
                    "🔴 PARTIAL | {} for {} cached but NOT durable: {}",
                    T::KIND,
                    value.session_id(),
                    e
                ),
                PersistOutcome::BothFailed { cache, store } => error!(
                    "🔴 FAILURE | {} for {} not persisted (cache: {}, store: {})",
                    T::KIND,
                    value.session_id(),
                    cache,
                    store
                ),
            }
            outcome
        });

        task.await
            .map_err(|e| EngineError::WriteTask(e.to_string()))
    }

    /// Cache-aside read that degrades an unreachable store to not-found
    async fn read_through<T: Record>(&self, session_id: &str) -> Option<T> {
        match self.lookup(session_id).await {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    "Store read of {} {} failed, reporting not found: {}",
                    T::KIND,
                    session_id,
                    e
                );
                None
            }
        }
    }

    /// Cache-aside read; only a failed store read is an error
    async fn lookup<T: Record>(&self, session_id: &str) -> PersistResult<Option<T>> {
        let cache = self.cache.as_ref();
        let store = self.store.as_ref();

        let cached = with_retry_if(
            &self.retry.cache,
            &format!("{}.get_{}", cache.name(), T::KIND),
            || T::cache_get(cache, session_id),
            is_retryable,
        )
        .await;

        match cached {
            Ok(Some(value)) => {
                debug!("Cache hit: {} {}", T::KIND, session_id);
                return Ok(Some(value));
            }
            Ok(None) => debug!("Cache miss: {} {}", T::KIND, session_id),
            Err(e) => warn!(
                "Cache read of {} {} failed, falling back to store: {}",
                T::KIND,
                session_id,
                e
            ),
        }

        let stored = with_retry_if(
            &self.retry.store,
            &format!("{}.get_{}", store.name(), T::KIND),
            || T::store_get(store, session_id),
            is_retryable,
        )
        .await;

        let Some(value) = stored? else {
            return Ok(None);
        };

        let repopulated = with_retry_if(
            &self.retry.cache,
            &format!("{}.set_{}", cache.name(), T::KIND),
            || T::cache_set(cache, &value),
            is_retryable,
        )
        .await;

        if let Err(e) = repopulated {
            warn!("Could not repopulate cache for {} {}: {}", T::KIND, session_id, e);
        }

        Ok(Some(value))
    }
}
