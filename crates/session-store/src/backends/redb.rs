//! redb backend implementation
//!
//! Pure Rust embedded database, one file on disk. Every value lives in a
//! single table keyed by its rendered storage key, encoded as JSON.

use crate::codec::{decode, encode_state, encode_telemetry};
use crate::error::{PersistenceError, Result};
use crate::keys::KeyLayout;
use crate::SessionStore;
use async_trait::async_trait;
use cadence_core_model::{SessionState, TelemetryPayload};
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::debug;

const SESSIONS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("sessions");

const BACKEND: &str = "redb";

fn backend_err(err: impl std::fmt::Display) -> PersistenceError {
    PersistenceError::backend(BACKEND, err)
}

/// redb-backed durable store
pub struct RedbStore {
    db: Database,
    layout: KeyLayout,
}

impl RedbStore {
    /// Open or create a redb database at the specified path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_layout(path, KeyLayout::default())
    }

    pub fn open_with_layout<P: AsRef<Path>>(path: P, layout: KeyLayout) -> Result<Self> {
        let db = Database::create(path.as_ref()).map_err(backend_err)?;

        // Initialize table
        let write_txn = db.begin_write().map_err(backend_err)?;
        {
            let _sessions = write_txn.open_table(SESSIONS_TABLE).map_err(backend_err)?;
        }
        write_txn.commit().map_err(backend_err)?;

        debug!("Opened redb store at {}", path.as_ref().display());
        Ok(Self { db, layout })
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let write_txn = self.db.begin_write().map_err(backend_err)?;
        {
            let mut table = write_txn.open_table(SESSIONS_TABLE).map_err(backend_err)?;
            table.insert(key, value).map_err(backend_err)?;
        }
        write_txn.commit().map_err(backend_err)?;
        Ok(())
    }

    fn fetch<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let read_txn = self.db.begin_read().map_err(backend_err)?;
        let table = read_txn.open_table(SESSIONS_TABLE).map_err(backend_err)?;
        let raw = table.get(key).map_err(backend_err)?;
        raw.map(|guard| decode(guard.value())).transpose()
    }

    /// Number of stored values
    pub fn len(&self) -> Result<u64> {
        let read_txn = self.db.begin_read().map_err(backend_err)?;
        let table = read_txn.open_table(SESSIONS_TABLE).map_err(backend_err)?;
        table.len().map_err(backend_err)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl SessionStore for RedbStore {
    async fn set_telemetry(&self, payload: &TelemetryPayload) -> Result<()> {
        let value = encode_telemetry(payload)?;
        self.put(&self.layout.telemetry_key(payload.session_id()), &value)
    }

    async fn get_telemetry(&self, session_id: &str) -> Result<Option<TelemetryPayload>> {
        self.fetch(&self.layout.telemetry_key(session_id))
    }

    async fn set_session(&self, state: &SessionState) -> Result<()> {
        let value = encode_state(state)?;
        self.put(&self.layout.state_key(state.session_id()), &value)
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<SessionState>> {
        self.fetch(&self.layout.state_key(session_id))
    }

    fn name(&self) -> &str {
        BACKEND
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core_model::{Metrics, SessionConfig, SessionStatus, TriggerOperator, TriggerRule};
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_redb_store_roundtrip() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = RedbStore::open(temp_file.path()).unwrap();
        assert!(store.is_empty().unwrap());

        let mut state = SessionState::new(
            SessionConfig::new("raid-42")
                .with_rule(TriggerRule::new("hp", TriggerOperator::Lt, 10.0, "funeral")),
        );
        state.current_status = SessionStatus::Critical;
        store.set_session(&state).await.unwrap();

        let metrics: Metrics = [("hp".to_string(), 4.0)].into_iter().collect();
        let payload = TelemetryPayload::new("raid-42", metrics).unwrap();
        store.set_telemetry(&payload).await.unwrap();

        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(store.get_session("raid-42").await.unwrap(), Some(state));
        assert_eq!(store.get_telemetry("raid-42").await.unwrap(), Some(payload));
        assert_eq!(store.get_session("other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_redb_store_survives_reopen() {
        let temp_file = NamedTempFile::new().unwrap();
        let state = SessionState::new(SessionConfig::new("abc").with_default_genre("ambient"));

        {
            let store = RedbStore::open(temp_file.path()).unwrap();
            store.set_session(&state).await.unwrap();
        }

        let store = RedbStore::open(temp_file.path()).unwrap();
        assert_eq!(store.get_session("abc").await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn test_redb_store_rejects_invalid_state() {
        let temp_file = NamedTempFile::new().unwrap();
        let store = RedbStore::open(temp_file.path()).unwrap();

        let err = store
            .set_session(&SessionState::new(SessionConfig::new("x")))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(store.is_empty().unwrap());
    }
}
