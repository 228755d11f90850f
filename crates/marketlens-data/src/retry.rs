//! Retry with exponential backoff.

use std::future::Future;
use std::time::Duration;

use marketlens_core::error::DataError;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::rate_limiter::RateLimiter;

/// How a request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_retries: u32,
    /// Wait after the first failed attempt; doubles after each further one
    pub base_delay: Duration,
    /// Bound on each single attempt
    pub timeout: Duration,
}

impl RetryPolicy {
    /// Backoff after failed attempt `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Run `operation` under `policy`.
///
/// Each attempt is cut off after `policy.timeout`. Errors that are not
/// retryable are returned at once; otherwise the last error is returned when
/// the attempts run out.
pub async fn retry_with_backoff<F, Fut, T>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, DataError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DataError>>,
{
    let limit = policy.timeout;
    retry_attempts(policy, move || bounded(limit, operation())).await
}

/// [`retry_with_backoff`] with every attempt queued on `limiter`.
///
/// The attempt timeout starts once the limiter grants the turn; time spent
/// waiting behind other callers does not count against it.
pub async fn retry_through_limiter<F, Fut, T>(
    policy: &RetryPolicy,
    limiter: &RateLimiter,
    mut operation: F,
) -> Result<T, DataError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DataError>>,
{
    let limit = policy.timeout;
    retry_attempts(policy, move || {
        let attempt = operation();
        limiter.run(move || bounded(limit, attempt))
    })
    .await
}

async fn bounded<Fut, T>(limit: Duration, attempt: Fut) -> Result<T, DataError>
where
    Fut: Future<Output = Result<T, DataError>>,
{
    match tokio::time::timeout(limit, attempt).await {
        Ok(result) => result,
        Err(_) => Err(DataError::Timeout {
            after_ms: limit.as_millis() as u64,
        }),
    }
}

async fn retry_attempts<F, Fut, T>(policy: &RetryPolicy, mut attempt_fn: F) -> Result<T, DataError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DataError>>,
{
    let attempts = policy.max_retries.max(1);
    let mut attempt = 0u32;

    loop {
        let err = match attempt_fn().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => err,
        };

        attempt += 1;
        if attempt >= attempts {
            warn!(attempts, error = %err, "Giving up after repeated failures");
            return Err(err);
        }

        let mut delay = policy.delay_for(attempt - 1);
        if let DataError::RateLimited { retry_after_secs } = &err {
            delay = delay.max(Duration::from_secs(*retry_after_secs));
        }
        warn!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "Request failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
