/*!
 * Configuration types for Cadence
 */

use crate::error::{CadenceError, Result};
use crate::engine::RetrySettings;
use cadence_core_resilience::RetryPolicy;
use cadence_session_store::{KeyLayout, DEFAULT_KEY_TEMPLATE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration, read once at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadenceConfig {
    /// Storage key template; must contain `{session_id}` and `{kind}`
    #[serde(default = "default_key_template")]
    pub key_template: String,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            key_template: default_key_template(),
            cache: CacheConfig::default(),
            store: StoreConfig::default(),
            provider: ProviderConfig::default(),
            retry: RetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Cache backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// In-process map with expiry
    #[default]
    Memory,
    /// Redis server (requires the `redis` feature)
    Redis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackend,

    /// Entry lifetime in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default = "default_redis_url")]
    pub redis_url: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            ttl_secs: default_ttl_secs(),
            redis_url: default_redis_url(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Durable store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process map; lost on exit
    #[default]
    Memory,
    /// Single-file embedded database (requires the `redb` feature)
    Redb,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Database file for the redb backend
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_store_path(),
        }
    }
}

/// Playback provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderBackend {
    /// Log genre switches
    #[default]
    Log,
    /// Ignore genre switches
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub backend: ProviderBackend,
}

/// Backoff parameters for one class of calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicyConfig {
    /// Total attempts, including the first
    pub max_retries: u32,

    pub base_delay_secs: f64,

    pub max_delay_secs: f64,
}

impl RetryPolicyConfig {
    fn persistence() -> Self {
        Self {
            max_retries: 3,
            base_delay_secs: 0.5,
            max_delay_secs: 30.0,
        }
    }

    fn provider() -> Self {
        Self {
            max_retries: 5,
            base_delay_secs: 1.0,
            max_delay_secs: 30.0,
        }
    }

    /// Build a validated [`RetryPolicy`]
    pub fn to_policy(&self) -> Result<RetryPolicy> {
        let secs = |name: &str, value: f64| {
            Duration::try_from_secs_f64(value).map_err(|_| {
                CadenceError::Config(format!(
                    "{} must be a non-negative number of seconds, got {}",
                    name, value
                ))
            })
        };
        let base = secs("base_delay_secs", self.base_delay_secs)?;
        let max = secs("max_delay_secs", self.max_delay_secs)?;
        Ok(RetryPolicy::new(self.max_retries, base, max)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "RetryPolicyConfig::persistence")]
    pub cache: RetryPolicyConfig,

    #[serde(default = "RetryPolicyConfig::persistence")]
    pub store: RetryPolicyConfig,

    #[serde(default = "RetryPolicyConfig::provider")]
    pub provider: RetryPolicyConfig,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            cache: RetryPolicyConfig::persistence(),
            store: RetryPolicyConfig::persistence(),
            provider: RetryPolicyConfig::provider(),
        }
    }
}

impl RetryConfig {
    /// Budgets for the engine's cache and store calls
    pub fn settings(&self) -> Result<RetrySettings> {
        Ok(RetrySettings {
            cache: self.cache.to_policy()?,
            store: self.store.to_policy()?,
        })
    }
}

/// Logging level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    /// Write JSON lines to this file instead of stdout
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Force debug level
    #[serde(default)]
    pub verbose: bool,
}

fn default_key_template() -> String {
    DEFAULT_KEY_TEMPLATE.to_string()
}

fn default_ttl_secs() -> u64 {
    3600 // 1 hour
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("cadence.redb")
}

impl CadenceConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CadenceError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let config: CadenceConfig = toml::from_str(&contents).map_err(|e| {
            CadenceError::Config(format!("Invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| CadenceError::Config(format!("Cannot encode config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values no backend can work with
    pub fn validate(&self) -> Result<()> {
        if self.cache.ttl_secs == 0 {
            return Err(CadenceError::Config(
                "cache.ttl_secs must be greater than zero".to_string(),
            ));
        }
        KeyLayout::check_template(&self.key_template)
            .map_err(|e| CadenceError::Config(e.to_string()))?;
        self.retry.settings()?;
        self.retry.provider.to_policy()?;
        Ok(())
    }

    pub fn key_layout(&self) -> Result<KeyLayout> {
        KeyLayout::new(self.key_template.clone()).map_err(|e| CadenceError::Config(e.to_string()))
    }
}
