//! Cache counters and status snapshots.

use serde::Serialize;

/// Request counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub total_requests: u64,
    /// hits / total_requests, 0 before the first request
    pub hit_rate: f64,
    pub evictions: u64,
}

impl CacheStats {
    pub(crate) fn new(hits: u64, misses: u64, evictions: u64) -> Self {
        let total_requests = hits + misses;
        let hit_rate = if total_requests == 0 {
            0.0
        } else {
            hits as f64 / total_requests as f64
        };
        Self {
            hits,
            misses,
            total_requests,
            hit_rate,
            evictions,
        }
    }
}

/// Occupancy snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CacheStatus {
    pub size: usize,
    pub max_size: usize,
    pub memory_usage_bytes: usize,
    pub max_memory_bytes: usize,
    /// Entries past their TTL that no read or sweep has removed yet
    pub expired_entries: usize,
    pub large_entries: usize,
    pub hit_rate: f64,
}

/// What one `optimize()` pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OptimizeReport {
    pub expired_removed: usize,
    pub duplicates_removed: usize,
    pub evicted: usize,
    pub trimmed: usize,
}

impl OptimizeReport {
    pub fn total_removed(&self) -> usize {
        self.expired_removed + self.duplicates_removed + self.evicted + self.trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_without_requests() {
        let stats = CacheStats::new(0, 0, 0);
        assert_eq!(stats.hit_rate, 0.0);
        assert_eq!(stats.total_requests, 0);
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats::new(3, 1, 0);
        assert_eq!(stats.total_requests, 4);
        assert_eq!(stats.hit_rate, 0.75);
    }
}
