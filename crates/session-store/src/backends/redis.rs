//! Redis cache backend
//!
//! Uses a multiplexed [`ConnectionManager`] that reconnects on its own and is
//! cheap to clone, so concurrent calls share one connection. Entries are
//! written with `SET key value EX ttl`.

use crate::codec::{decode_cached, encode_state, encode_telemetry};
use crate::error::{PersistenceError, Result};
use crate::keys::KeyLayout;
use crate::{SessionCache, DEFAULT_CACHE_TTL};
use async_trait::async_trait;
use cadence_core_model::{SessionState, TelemetryPayload};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::info;

const BACKEND: &str = "redis";

/// Map a client error onto the transient/permanent split
fn classify(err: RedisError) -> PersistenceError {
    if err.is_timeout() {
        PersistenceError::Timeout {
            backend: BACKEND.to_string(),
            elapsed: Duration::ZERO,
        }
    } else if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
        PersistenceError::unavailable(BACKEND, err)
    } else {
        PersistenceError::backend(BACKEND, err)
    }
}

/// Redis-backed TTL cache
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    layout: KeyLayout,
    ttl: Duration,
}

impl RedisCache {
    /// Connect to the server at `url` (e.g. `redis://127.0.0.1:6379/`)
    pub async fn connect(url: &str, ttl: Duration, layout: KeyLayout) -> Result<Self> {
        let client = Client::open(url).map_err(classify)?;
        let conn = ConnectionManager::new(client).await.map_err(classify)?;
        info!("Connected to Redis cache at {}", url);
        Ok(Self { conn, layout, ttl })
    }

    /// Connect with the default key layout and one-hour TTL
    pub async fn connect_default(url: &str) -> Result<Self> {
        Self::connect(url, DEFAULT_CACHE_TTL, KeyLayout::default()).await
    }

    fn ttl_secs(&self) -> u64 {
        self.ttl.as_secs().max(1)
    }

    async fn put(&self, key: String, value: String) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, self.ttl_secs())
            .await
            .map_err(classify)
    }

    async fn fetch<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key).await.map_err(classify)?;
        Ok(raw.and_then(|raw| decode_cached(key, &raw)))
    }
}

#[async_trait]
impl SessionCache for RedisCache {
    async fn set_telemetry(&self, payload: &TelemetryPayload) -> Result<()> {
        let value = encode_telemetry(payload)?;
        self.put(self.layout.telemetry_key(payload.session_id()), value)
            .await
    }

    async fn get_telemetry(&self, session_id: &str) -> Result<Option<TelemetryPayload>> {
        self.fetch(&self.layout.telemetry_key(session_id)).await
    }

    async fn set_session(&self, state: &SessionState) -> Result<()> {
        let value = encode_state(state)?;
        self.put(self.layout.state_key(state.session_id()), value)
            .await
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<SessionState>> {
        self.fetch(&self.layout.state_key(session_id)).await
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }

    fn name(&self) -> &str {
        BACKEND
    }
}
