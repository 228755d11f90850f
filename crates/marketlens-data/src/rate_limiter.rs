//! Request spacing.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// Runs requests one at a time, in arrival order, with a minimum delay
/// between the starts of consecutive requests.
///
/// Waiters queue on a fair async mutex, so they are served first come
/// first served.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_start: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait for this caller's turn, then run `request` to completion before
    /// letting the next caller in.
    pub async fn run<F, Fut, T>(&self, request: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut last_start = self.last_start.lock().await;

        if let Some(prev) = *last_start {
            let ready_at = prev + self.min_interval;
            if ready_at > Instant::now() {
                let wait_ms = (ready_at - Instant::now()).as_millis() as u64;
                debug!(wait_ms, "Rate limiting request");
                sleep_until(ready_at).await;
            }
        }

        *last_start = Some(Instant::now());
        request().await
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}
