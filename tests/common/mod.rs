//! Test doubles for the persistence ports
//!
//! `TestCache` and `TestStore` wrap the in-memory backends, count every call
//! and can be scripted to fail a number of reads or writes with a transient
//! error.

#![allow(dead_code)]

use async_trait::async_trait;
use cadence::engine::{Orchestrator, RetrySettings};
use cadence::logging::init_test_logging;
use cadence_core_model::{Metrics, SessionState, TelemetryPayload};
use cadence_core_resilience::RetryPolicy;
use cadence_session_store::{
    MemoryCache, MemoryStore, PersistenceError, Result, SessionCache, SessionStore,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Per-operation call counters
#[derive(Debug, Default)]
pub struct Calls {
    pub get_telemetry: AtomicUsize,
    pub set_telemetry: AtomicUsize,
    pub get_session: AtomicUsize,
    pub set_session: AtomicUsize,
}

impl Calls {
    pub fn get_session(&self) -> usize {
        self.get_session.load(Ordering::SeqCst)
    }

    pub fn set_session(&self) -> usize {
        self.set_session.load(Ordering::SeqCst)
    }

    pub fn get_telemetry(&self) -> usize {
        self.get_telemetry.load(Ordering::SeqCst)
    }

    pub fn set_telemetry(&self) -> usize {
        self.set_telemetry.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.get_session() + self.set_session() + self.get_telemetry() + self.set_telemetry()
    }
}

/// Remaining scripted failures
#[derive(Debug, Default)]
pub struct Faults {
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl Faults {
    pub fn fail_reads(&self, n: usize) {
        self.reads.store(n, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, n: usize) {
        self.writes.store(n, Ordering::SeqCst);
    }

    pub fn fail_all_writes(&self) {
        self.fail_writes(usize::MAX);
    }

    pub fn fail_all_reads(&self) {
        self.fail_reads(usize::MAX);
    }

    fn take(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn check_read(&self, backend: &str) -> Result<()> {
        if Self::take(&self.reads) {
            return Err(PersistenceError::unavailable(backend, "connection reset"));
        }
        Ok(())
    }

    fn check_write(&self, backend: &str) -> Result<()> {
        if Self::take(&self.writes) {
            return Err(PersistenceError::unavailable(backend, "connection reset"));
        }
        Ok(())
    }
}

pub struct TestCache {
    pub inner: MemoryCache,
    pub calls: Calls,
    pub faults: Faults,
}

impl TestCache {
    pub fn new() -> Arc<Self> {
        Self::with_ttl(Duration::from_secs(3600))
    }

    pub fn with_ttl(ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryCache::new(ttl),
            calls: Calls::default(),
            faults: Faults::default(),
        })
    }
}

#[async_trait]
impl SessionCache for TestCache {
    async fn set_telemetry(&self, payload: &TelemetryPayload) -> Result<()> {
        self.calls.set_telemetry.fetch_add(1, Ordering::SeqCst);
        self.faults.check_write("test-cache")?;
        self.inner.set_telemetry(payload).await
    }

    async fn get_telemetry(&self, session_id: &str) -> Result<Option<TelemetryPayload>> {
        self.calls.get_telemetry.fetch_add(1, Ordering::SeqCst);
        self.faults.check_read("test-cache")?;
        self.inner.get_telemetry(session_id).await
    }

    async fn set_session(&self, state: &SessionState) -> Result<()> {
        self.calls.set_session.fetch_add(1, Ordering::SeqCst);
        self.faults.check_write("test-cache")?;
        self.inner.set_session(state).await
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<SessionState>> {
        self.calls.get_session.fetch_add(1, Ordering::SeqCst);
        self.faults.check_read("test-cache")?;
        self.inner.get_session(session_id).await
    }

    fn ttl(&self) -> Duration {
        self.inner.ttl()
    }

    fn name(&self) -> &str {
        "test-cache"
    }
}

pub struct TestStore {
    pub inner: MemoryStore,
    pub calls: Calls,
    pub faults: Faults,
}

impl TestStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::new(),
            calls: Calls::default(),
            faults: Faults::default(),
        })
    }
}

#[async_trait]
impl SessionStore for TestStore {
    async fn set_telemetry(&self, payload: &TelemetryPayload) -> Result<()> {
        self.calls.set_telemetry.fetch_add(1, Ordering::SeqCst);
        self.faults.check_write("test-store")?;
        self.inner.set_telemetry(payload).await
    }

    async fn get_telemetry(&self, session_id: &str) -> Result<Option<TelemetryPayload>> {
        self.calls.get_telemetry.fetch_add(1, Ordering::SeqCst);
        self.faults.check_read("test-store")?;
        self.inner.get_telemetry(session_id).await
    }

    async fn set_session(&self, state: &SessionState) -> Result<()> {
        self.calls.set_session.fetch_add(1, Ordering::SeqCst);
        self.faults.check_write("test-store")?;
        self.inner.set_session(state).await
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<SessionState>> {
        self.calls.get_session.fetch_add(1, Ordering::SeqCst);
        self.faults.check_read("test-store")?;
        self.inner.get_session(session_id).await
    }

    fn name(&self) -> &str {
        "test-store"
    }
}

/// Three attempts, short delays
pub fn fast_retry() -> RetrySettings {
    let policy = RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(50))
        .expect("valid policy");
    RetrySettings {
        cache: policy.clone(),
        store: policy,
    }
}

pub fn orchestrator(cache: &Arc<TestCache>, store: &Arc<TestStore>) -> Orchestrator {
    init_test_logging();
    Orchestrator::new(cache.clone(), store.clone(), fast_retry())
}

pub fn sample(session_id: &str, pairs: &[(&str, f64)]) -> TelemetryPayload {
    let metrics: Metrics = pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect();
    TelemetryPayload::new(session_id, metrics).expect("valid sample")
}
