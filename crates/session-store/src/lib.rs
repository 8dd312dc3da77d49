//! Cadence Session Store: two-tier persistence for telemetry and session state
//!
//! # Overview
//!
//! The engine reads and writes through two capability ports:
//!
//! - [`SessionCache`]: fast, volatile, entries expire after a TTL. A miss is a
//!   normal outcome and the cache may lose entries at any time.
//! - [`SessionStore`]: durable, no TTL, the source of truth.
//!
//! Both hold the latest [`TelemetryPayload`] and the [`SessionState`] of each
//! session, keyed by session id through a [`KeyLayout`]. Clients are shared
//! across concurrent tasks (`Arc<dyn SessionCache>`), so every method takes
//! `&self` and each backend owns its own synchronization.
//!
//! # Backends
//!
//! - [`MemoryCache`] / [`MemoryStore`]: in-process maps (always available)
//! - `RedbStore`: pure Rust embedded database (`redb` feature, default)
//! - `RedisCache`: Redis with `SET .. EX` expiry (`redis` feature)
//!
//! # Example
//!
//! ```
//! use cadence_session_store::{MemoryStore, SessionStore};
//! use cadence_core_model::{SessionConfig, SessionState};
//!
//! # async fn example() -> cadence_session_store::Result<()> {
//! let store = MemoryStore::new();
//! store.set_session(&SessionState::new(SessionConfig::new("raid-42"))).await?;
//!
//! let state = store.get_session("raid-42").await?;
//! assert!(state.is_some());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use cadence_core_model::{SessionState, TelemetryPayload};
use std::time::Duration;

pub mod backends;
pub mod codec;
pub mod error;
pub mod keys;

pub use backends::memory::{MemoryCache, MemoryStore};
pub use error::{PersistenceError, Result};
pub use keys::{KeyKind, KeyLayout, DEFAULT_KEY_TEMPLATE};

#[cfg(feature = "redb")]
pub use backends::redb::RedbStore;

#[cfg(feature = "redis")]
pub use backends::redis::RedisCache;

/// Default cache entry lifetime
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Fast, volatile tier
///
/// Implementations must reject an invalid [`SessionState`] with
/// [`PersistenceError::Validation`] before touching the backend, and must
/// report undecodable entries as a miss.
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Cache the latest sample for its session
    async fn set_telemetry(&self, payload: &TelemetryPayload) -> Result<()>;

    /// Latest cached sample, `None` on miss or expiry
    async fn get_telemetry(&self, session_id: &str) -> Result<Option<TelemetryPayload>>;

    /// Cache a session state
    async fn set_session(&self, state: &SessionState) -> Result<()>;

    /// Cached session state, `None` on miss or expiry
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionState>>;

    /// Lifetime applied to new entries
    fn ttl(&self) -> Duration;

    /// Backend name for logs
    fn name(&self) -> &str;
}

/// Durable tier and source of truth
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist the latest sample for its session
    async fn set_telemetry(&self, payload: &TelemetryPayload) -> Result<()>;

    /// Latest persisted sample
    async fn get_telemetry(&self, session_id: &str) -> Result<Option<TelemetryPayload>>;

    /// Persist a session state, replacing any previous value
    async fn set_session(&self, state: &SessionState) -> Result<()>;

    /// Persisted session state
    async fn get_session(&self, session_id: &str) -> Result<Option<SessionState>>;

    /// Backend name for logs
    fn name(&self) -> &str;
}
