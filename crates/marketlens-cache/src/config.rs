//! Cache configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cache limits and policies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry count at which `set` starts evicting
    pub max_entries: usize,
    /// Estimated memory at which `set` starts evicting
    pub max_memory_bytes: usize,
    /// Largest single entry `set` accepts
    pub max_entry_bytes: usize,
    /// TTL used when `SetOptions::ttl` is not given
    pub default_ttl_secs: u64,
    /// Share of entries removed per eviction round
    pub eviction_fraction: f64,
    /// Evict least-recently-used entries; random victims when false
    pub enable_lru: bool,
    /// Drop entries whose payload is identical to another entry's
    pub enable_deduplication: bool,
    /// Entries above this size are flagged as large
    pub compression_threshold_bytes: usize,
    /// Interval of the background `optimize()` sweep
    pub sweep_interval_secs: u64,
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            max_memory_bytes: 50 * 1024 * 1024,
            max_entry_bytes: 5 * 1024 * 1024,
            default_ttl_secs: 300,
            eviction_fraction: 0.1,
            enable_lru: true,
            enable_deduplication: true,
            compression_threshold_bytes: 10 * 1024,
            sweep_interval_secs: 30,
        }
    }
}

/// Per-entry options for `set`.
#[derive(Debug, Clone)]
pub struct SetOptions {
    /// Time to live; the cache default when `None`
    pub ttl: Option<Duration>,
    /// Tags for bulk invalidation
    pub tags: Vec<String>,
    /// Retention priority in [0, 1]; lower is evicted first on ties
    pub priority: f64,
    /// Per-entry size cap overriding the configured one
    pub max_size: Option<usize>,
}

impl SetOptions {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the priority, clamped to [0, 1].
    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }
}

impl Default for SetOptions {
    fn default() -> Self {
        Self {
            ttl: None,
            tags: Vec::new(),
            priority: 0.5,
            max_size: None,
        }
    }
}
