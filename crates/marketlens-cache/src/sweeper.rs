//! Background housekeeping task.

use std::sync::{Arc, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::manager::UnifiedCache;

/// Handle to a running sweeper. Dropping it stops the task.
pub struct SweeperHandle {
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub fn stop(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Run `optimize()` on `cache` every `interval`.
///
/// The task holds only a weak reference and exits once the cache is dropped.
/// Must be called from within a tokio runtime.
pub fn spawn_sweeper<V>(cache: &Arc<UnifiedCache<V>>, interval: Duration) -> SweeperHandle
where
    V: Clone + Serialize + Send + 'static,
{
    let weak: Weak<UnifiedCache<V>> = Arc::downgrade(cache);
    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let Some(cache) = weak.upgrade() else {
                info!("Cache dropped, sweeper exiting");
                break;
            };
            let report = cache.optimize();
            debug!(removed = report.total_removed(), "Cache sweep");
        }
    });

    SweeperHandle { task }
}
