//! In-process cache with TTL, tags, eviction and deduplication.
//!
//! [`UnifiedCache`] is an explicit context object: construct one per
//! payload type at startup, share it behind an `Arc`, and optionally attach
//! a background sweeper with [`spawn_sweeper`].

mod config;
mod entry;
mod manager;
mod stats;
mod sweeper;

pub use config::{CacheConfig, SetOptions};
pub use entry::{CacheEntry, EntryInfo};
pub use manager::UnifiedCache;
pub use stats::{CacheStats, CacheStatus, OptimizeReport};
pub use sweeper::{spawn_sweeper, SweeperHandle};
