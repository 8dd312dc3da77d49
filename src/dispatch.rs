//! Genre dispatch to a playback provider
//!
//! The engine only decides *which* genre should play. Acting on that decision
//! is the caller's job: it hands the target to a [`GenreDispatcher`], which
//! calls the configured [`PlaybackProvider`] in the background under its own
//! retry budget.

use async_trait::async_trait;
use cadence_core_resilience::{with_retry_if, ResilienceError, RetryPolicy};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Anything that can switch a session's playback to a genre
#[async_trait]
pub trait PlaybackProvider: Send + Sync {
    /// Start playing `genre` for the session
    ///
    /// Return [`ResilienceError::Transient`] for failures worth retrying
    /// (throttling, network) and [`ResilienceError::Permanent`] otherwise.
    async fn play_genre(&self, session_id: &str, genre: &str) -> Result<(), ResilienceError>;

    fn name(&self) -> &str;
}

/// Logs each switch instead of playing anything
#[derive(Debug, Default, Clone)]
pub struct LogProvider;

#[async_trait]
impl PlaybackProvider for LogProvider {
    async fn play_genre(&self, session_id: &str, genre: &str) -> Result<(), ResilienceError> {
        info!("🎵 Session {} now playing: {}", session_id, genre);
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Discards every switch
#[derive(Debug, Default, Clone)]
pub struct NullProvider;

#[async_trait]
impl PlaybackProvider for NullProvider {
    async fn play_genre(&self, _session_id: &str, _genre: &str) -> Result<(), ResilienceError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Fire-and-forget front end for a [`PlaybackProvider`]
#[derive(Clone)]
pub struct GenreDispatcher {
    provider: Arc<dyn PlaybackProvider>,
    policy: RetryPolicy,
}

impl GenreDispatcher {
    pub fn new(provider: Arc<dyn PlaybackProvider>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Switch playback in a background task
    ///
    /// Only transient provider failures are retried. Awaiting the handle is
    /// optional.
    pub fn dispatch(
        &self,
        session_id: impl Into<String>,
        genre: impl Into<String>,
    ) -> JoinHandle<Result<(), ResilienceError>> {
        let provider = Arc::clone(&self.provider);
        let policy = self.policy.clone();
        let session_id = session_id.into();
        let genre = genre.into();

        tokio::spawn(async move {
            let operation = format!("{}.play_genre", provider.name());
            debug!("Dispatching {} for session {}", genre, session_id);
            with_retry_if(
                &policy,
                &operation,
                || provider.play_genre(&session_id, &genre),
                ResilienceError::is_transient,
            )
            .await
        })
    }
}
