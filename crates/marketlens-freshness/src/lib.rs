//! Data freshness classification.
//!
//! [`FreshnessManager`] turns a last-updated timestamp into a
//! fresh/stale/expired verdict and folds many verdicts into one
//! [`CombinedFreshness`] health signal. It holds only its thresholds and is
//! safe to share without locking.

mod manager;
mod status;
mod timestamp;

pub use manager::{relative_time, FreshnessManager, FreshnessThresholds};
pub use status::{CombinedFreshness, DataFreshnessInfo, DataSource, FreshnessStatus, OverallStatus};
pub use timestamp::Timestamp;
