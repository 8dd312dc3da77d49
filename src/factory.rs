/*!
 * Backend construction from configuration
 */

use crate::config::{CacheBackend, CadenceConfig, ProviderBackend, StoreBackend};
use crate::dispatch::{GenreDispatcher, LogProvider, NullProvider, PlaybackProvider};
use crate::engine::Orchestrator;
use crate::error::Result;
use cadence_session_store::{MemoryCache, MemoryStore, SessionCache, SessionStore};
use std::sync::Arc;

/// Connect the configured cache backend
pub async fn build_cache(config: &CadenceConfig) -> Result<Arc<dyn SessionCache>> {
    let layout = config.key_layout()?;
    let ttl = config.cache.ttl();

    match config.cache.backend {
        CacheBackend::Memory => {
            let cache = Arc::new(MemoryCache::with_layout(ttl, layout));
            cache.spawn_purger(ttl);
            Ok(cache)
        }

        #[cfg(feature = "redis")]
        CacheBackend::Redis => {
            let cache = cadence_session_store::RedisCache::connect(
                &config.cache.redis_url,
                ttl,
                layout,
            )
            .await?;
            Ok(Arc::new(cache))
        }

        #[cfg(not(feature = "redis"))]
        CacheBackend::Redis => Err(crate::error::CadenceError::Config(
            "cache backend 'redis' requires building with --features redis".to_string(),
        )),
    }
}

/// Open the configured durable store
pub fn build_store(config: &CadenceConfig) -> Result<Arc<dyn SessionStore>> {
    let layout = config.key_layout()?;

    match config.store.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::with_layout(layout))),

        #[cfg(feature = "redb")]
        StoreBackend::Redb => {
            let store =
                cadence_session_store::RedbStore::open_with_layout(&config.store.path, layout)?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "redb"))]
        StoreBackend::Redb => Err(crate::error::CadenceError::Config(
            "store backend 'redb' requires building with --features redb".to_string(),
        )),
    }
}

pub fn build_provider(config: &CadenceConfig) -> Arc<dyn PlaybackProvider> {
    match config.provider.backend {
        ProviderBackend::Log => Arc::new(LogProvider),
        ProviderBackend::None => Arc::new(NullProvider),
    }
}

/// Wire an orchestrator from configuration
pub async fn build_orchestrator(config: &CadenceConfig) -> Result<Orchestrator> {
    config.validate()?;
    let cache = build_cache(config).await?;
    let store = build_store(config)?;
    Ok(Orchestrator::new(cache, store, config.retry.settings()?))
}

pub fn build_dispatcher(config: &CadenceConfig) -> Result<GenreDispatcher> {
    let policy = config.retry.provider.to_policy()?;
    Ok(GenreDispatcher::new(build_provider(config), policy))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_config_builds_memory_backends() {
        let config = CadenceConfig::default();
        let orchestrator = build_orchestrator(&config).await.unwrap();
        assert_eq!(orchestrator.cache().name(), "memory-cache");
        assert_eq!(orchestrator.store().name(), "memory-store");
        assert_eq!(orchestrator.cache().ttl().as_secs(), 3600);

        let dispatcher = build_dispatcher(&config).unwrap();
        assert_eq!(dispatcher.provider_name(), "log");
    }

    #[cfg(feature = "redb")]
    #[tokio::test]
    async fn test_redb_store_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CadenceConfig::default();
        config.store.backend = StoreBackend::Redb;
        config.store.path = dir.path().join("sessions.redb");

        let store = build_store(&config).unwrap();
        assert_eq!(store.name(), "redb");
        assert!(config.store.path.exists());
    }

    #[cfg(not(feature = "redis"))]
    #[tokio::test]
    async fn test_redis_requires_feature() {
        let mut config = CadenceConfig::default();
        config.cache.backend = CacheBackend::Redis;
        assert!(matches!(
            build_cache(&config).await,
            Err(crate::error::CadenceError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let mut config = CadenceConfig::default();
        config.key_template = "no-placeholders".to_string();
        assert!(build_orchestrator(&config).await.is_err());
    }
}
