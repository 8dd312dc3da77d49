//! In-process backends
//!
//! Values are stored in their encoded JSON form, exactly as a networked
//! backend would hold them, so validation and decoding behave the same way
//! in tests and in production.

use crate::codec::{decode, decode_cached, encode_state, encode_telemetry};
use crate::error::Result;
use crate::keys::KeyLayout;
use crate::{SessionCache, SessionStore, DEFAULT_CACHE_TTL};
use async_trait::async_trait;
use cadence_core_model::{SessionState, TelemetryPayload};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// TTL cache backed by a `HashMap`
///
/// Expired entries are evicted lazily when read, and in bulk through
/// [`MemoryCache::purge_expired`], which [`MemoryCache::spawn_purger`] runs
/// periodically for long-lived caches.
#[derive(Debug)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    layout: KeyLayout,
    ttl: Duration,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_layout(ttl, KeyLayout::default())
    }

    pub fn with_layout(ttl: Duration, layout: KeyLayout) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            layout,
            ttl,
        }
    }

    async fn put(&self, key: String, value: String) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.write().await.insert(key, entry);
    }

    async fn fetch<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return decode_cached(key, &entry.value),
                Some(_) => {}
            }
        }

        // Re-check under the write lock; a concurrent writer may have refreshed it
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
            debug!("Evicted expired cache entry {}", key);
        }
        None
    }

    /// Drop both entries of a session
    pub async fn invalidate(&self, session_id: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(&self.layout.telemetry_key(session_id));
        entries.remove(&self.layout.state_key(session_id));
    }

    /// Evict every expired entry, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Run [`purge_expired`](Self::purge_expired) every `period` on a
    /// background task
    ///
    /// The task holds a weak reference and exits once the cache is dropped.
    pub fn spawn_purger(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let cache = Arc::downgrade(self);
        let period = period.max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let purged = cache.purge_expired().await;
                if purged > 0 {
                    debug!("Purged {} expired cache entries", purged);
                }
            }
        })
    }

    /// Number of entries held, including expired ones not yet evicted
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SessionCache for MemoryCache {
    async fn set_telemetry(&self, payload: &TelemetryPayload) -> Result<()> {
        let value = encode_telemetry(payload)?;
        self.put(self.layout.telemetry_key(payload.session_id()), value)
            .await;
        Ok(())
    }

    async fn get_telemetry(&self, session_id: &str) -> Result<Option<TelemetryPayload>> {
        Ok(self.fetch(&self.layout.telemetry_key(session_id)).await)
    }

    async fn set_session(&self, state: &SessionState) -> Result<()> {
        let value = encode_state(state)?;
        self.put(self.layout.state_key(state.session_id()), value)
            .await;
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<SessionState>> {
        Ok(self.fetch(&self.layout.state_key(session_id)).await)
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }

    fn name(&self) -> &str {
        "memory-cache"
    }
}

/// Non-expiring store backed by a `HashMap`
///
/// Durable only for the life of the process; intended for tests and
/// single-run CLI use.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    layout: KeyLayout,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(layout: KeyLayout) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            layout,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let entries = self.entries.read().await;
        entries.get(key).map(|raw| decode(raw)).transpose()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn set_telemetry(&self, payload: &TelemetryPayload) -> Result<()> {
        let value = encode_telemetry(payload)?;
        let key = self.layout.telemetry_key(payload.session_id());
        self.entries.write().await.insert(key, value);
        Ok(())
    }

    async fn get_telemetry(&self, session_id: &str) -> Result<Option<TelemetryPayload>> {
        self.fetch(&self.layout.telemetry_key(session_id)).await
    }

    async fn set_session(&self, state: &SessionState) -> Result<()> {
        let value = encode_state(state)?;
        let key = self.layout.state_key(state.session_id());
        self.entries.write().await.insert(key, value);
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<SessionState>> {
        self.fetch(&self.layout.state_key(session_id)).await
    }

    fn name(&self) -> &str {
        "memory-store"
    }
}
