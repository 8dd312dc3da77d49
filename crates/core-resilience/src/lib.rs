//! Cadence Core Resilience: retry primitives for unreliable I/O
//!
//! # Overview
//!
//! Cache, store and playback-provider calls can fail transiently (connection
//! resets, throttling, timeouts). This crate wraps such calls in a retry loop
//! with exponential backoff and multiplicative jitter so that, in the common
//! case, those failures never reach the caller.
//!
//! - [`RetryPolicy`]: attempt budget, base delay and delay cap
//! - [`with_retry`]: retry every failure
//! - [`with_retry_if`]: retry only failures a predicate accepts
//! - [`ResilienceError`]: generic transient/permanent error classification
//!
//! # Key Principles
//!
//! This crate is **pure logic** with zero knowledge of storage systems,
//! network protocols or session semantics. The final failure is always
//! handed back unchanged; converting it into an outcome is the caller's job.
//!
//! # Usage Example
//!
//! ```no_run
//! use cadence_core_resilience::{with_retry_if, ResilienceError, RetryPolicy};
//!
//! # async fn example() -> Result<(), ResilienceError> {
//! let policy = RetryPolicy::persistence();
//!
//! let value = with_retry_if(
//!     &policy,
//!     "store.get_session",
//!     || async { Ok::<_, ResilienceError>(42) },
//!     ResilienceError::is_transient,
//! )
//! .await?;
//! # assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod retry;

// Re-export main types for convenience
pub use error::ResilienceError;
pub use retry::{with_retry, with_retry_if, RetryPolicy, JITTER_RANGE};

/// Prelude module for convenient imports
///
/// # Example
/// ```
/// use cadence_core_resilience::prelude::*;
/// ```
pub mod prelude {
    pub use super::error::ResilienceError;
    pub use super::retry::{with_retry, with_retry_if, RetryPolicy};
}
