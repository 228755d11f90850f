//! Plain-text health report.

use chrono::{DateTime, Utc};
use marketlens_cache::{CacheStats, CacheStatus};
use marketlens_freshness::{relative_time, CombinedFreshness};
use serde::Serialize;
use std::fmt;

/// Snapshot of data freshness and cache health.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub generated_at: DateTime<Utc>,
    pub freshness: CombinedFreshness,
    pub cache: CacheStatus,
    pub stats: CacheStats,
}

impl HealthReport {
    pub fn new(freshness: CombinedFreshness, cache: CacheStatus, stats: CacheStats) -> Self {
        Self {
            generated_at: Utc::now(),
            freshness,
            cache,
            stats,
        }
    }
}

impl fmt::Display for HealthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fr = &self.freshness;
        writeln!(f, "Data health ({})", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(f, "  Overall:   {}", fr.overall_status)?;
        writeln!(
            f,
            "  Sources:   {} total, {} fresh, {} stale, {} expired",
            fr.total_count, fr.fresh_count, fr.stale_count, fr.expired_count
        )?;
        if let Some(oldest) = &fr.oldest {
            writeln!(
                f,
                "  Oldest:    {} via {} ({})",
                relative_time(oldest.age_minutes),
                oldest.source,
                oldest.status
            )?;
        }

        let c = &self.cache;
        writeln!(f, "Cache")?;
        writeln!(f, "  Entries:   {}/{}", c.size, c.max_size)?;
        writeln!(
            f,
            "  Memory:    {:.1} KiB / {:.1} KiB",
            c.memory_usage_bytes as f64 / 1024.0,
            c.max_memory_bytes as f64 / 1024.0
        )?;
        writeln!(f, "  Expired:   {} (awaiting sweep)", c.expired_entries)?;
        writeln!(f, "  Large:     {}", c.large_entries)?;
        write!(
            f,
            "  Hit rate:  {:.1}% ({} hits / {} requests, {} evictions)",
            self.stats.hit_rate * 100.0,
            self.stats.hits,
            self.stats.total_requests,
            self.stats.evictions
        )
    }
}
