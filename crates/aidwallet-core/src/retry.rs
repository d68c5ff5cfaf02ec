//! Retry with exponential backoff for calls to external collaborators.
//!
//! Only errors that classify themselves as retryable are retried; terminal
//! errors return on the first attempt.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

/// Classifies an error as safe to retry.
pub trait RetryableError {
    fn is_retryable(&self) -> bool;
}

/// Backoff parameters for [`with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

/// Run `operation`, retrying retryable failures with jittered exponential backoff.
///
/// `what` names the call in retry logs.
pub async fn with_retry<F, Fut, T, E>(policy: &RetryPolicy, what: &str, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError + Display,
{
    // backon counts retries, not attempts.
    let max_retries = policy.max_attempts.saturating_sub(1) as usize;
    let backoff = ExponentialBuilder::default()
        .with_min_delay(policy.initial_backoff)
        .with_max_delay(policy.max_backoff)
        .with_factor(2.0)
        .with_max_times(max_retries)
        .with_jitter();

    operation
        .retry(backoff)
        .sleep(tokio::time::sleep)
        .when(|e: &E| e.is_retryable())
        .notify(|e: &E, dur: Duration| {
            tracing::warn!(
                call = what,
                backoff_ms = dur.as_millis() as u64,
                error = %e,
                "retrying after backoff"
            );
        })
        .await
}
