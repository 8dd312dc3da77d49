//! Retry with exponential backoff and jitter
//!
//! Every persistence and playback call in Cadence goes through
//! [`with_retry`] / [`with_retry_if`]. After the `n`-th failed attempt the
//! caller's task sleeps for
//!
//! ```text
//! min(base_delay * 2^(n-1) * jitter, max_delay)     jitter ~ U[0.9, 1.1]
//! ```
//!
//! and tries again, until `max_retries` attempts have been made. The final
//! failure is returned unchanged. Sleeping uses `tokio::time::sleep`, so only
//! the calling task is suspended.

use crate::error::ResilienceError;
use rand::Rng;
use std::fmt;
use std::future::Future;
use std::ops::RangeInclusive;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, warn};

/// Multiplicative jitter applied to each backoff delay
pub const JITTER_RANGE: RangeInclusive<f64> = 0.9..=1.1;

/// Retry budget and backoff parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempt budget, including the first call (at least 1)
    pub max_retries: u32,

    /// Delay after the first failure, before jitter
    pub base_delay: Duration,

    /// Upper bound on any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Create a validated policy
    pub fn new(
        max_retries: u32,
        base_delay: Duration,
        max_delay: Duration,
    ) -> Result<Self, ResilienceError> {
        let policy = Self {
            max_retries,
            base_delay,
            max_delay,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Budget used for individual cache/store calls
    pub fn persistence() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }

    /// Single attempt, no backoff
    pub fn none() -> Self {
        Self {
            max_retries: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn validate(&self) -> Result<(), ResilienceError> {
        if self.max_retries == 0 {
            return Err(ResilienceError::InvalidPolicy(
                "max_retries must be at least 1".to_string(),
            ));
        }
        if self.max_delay < self.base_delay {
            return Err(ResilienceError::InvalidPolicy(format!(
                "max_delay ({:?}) must not be lower than base_delay ({:?})",
                self.max_delay, self.base_delay
            )));
        }
        Ok(())
    }

    /// Delay after failed attempt `attempt` (1-based) for a given jitter factor
    pub fn delay_with_jitter(&self, attempt: u32, jitter: f64) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * 2f64.powi(exponent) * jitter;
        let cap = self.max_delay.as_secs_f64();

        if !secs.is_finite() || secs >= cap {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs.max(0.0))
        }
    }

    /// Delay after failed attempt `attempt` (1-based), with random jitter
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let jitter = rand::rng().random_range(JITTER_RANGE);
        self.delay_with_jitter(attempt, jitter)
    }
}

/// Run `op`, retrying every failure within the policy budget
pub async fn with_retry<F, Fut, T, E>(policy: &RetryPolicy, operation: &str, op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    with_retry_if(policy, operation, op, |_| true).await
}

/// Run `op`, retrying only failures accepted by `is_retryable`
///
/// A rejected failure is returned immediately without consuming the rest of
/// the budget.
pub async fn with_retry_if<F, Fut, T, E, P>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
    is_retryable: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_retries.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("🟢 {} succeeded on attempt {}/{}", operation, attempt, max_attempts);
                }
                return Ok(value);
            }
            Err(e) if !is_retryable(&e) => {
                debug!("{} failed with a non-retryable error: {}", operation, e);
                return Err(e);
            }
            Err(e) if attempt >= max_attempts => {
                error!(
                    "🔴 FAILURE | {} failed after {} attempts: {}",
                    operation, max_attempts, e
                );
                return Err(e);
            }
            Err(e) => {
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    "🟡 RETRY {}/{} | {} | {}. Waiting {:.2?}",
                    attempt, max_attempts, operation, e, delay
                );
                sleep(delay).await;
            }
        }
    }
}
