//! Cache entries and their metadata.

use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;

/// A cached payload with its bookkeeping.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub(crate) value: V,
    pub(crate) inserted_at: Instant,
    pub(crate) ttl: Duration,
    pub(crate) tags: HashSet<String>,
    pub(crate) priority: f64,
    pub(crate) access_count: u64,
    pub(crate) last_accessed: Instant,
    /// Estimated footprint of key plus serialized payload
    pub(crate) size_bytes: usize,
    pub(crate) content_hash: u64,
    /// Payload is above the configured size threshold
    pub(crate) large: bool,
}

impl<V> CacheEntry<V> {
    #[inline]
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) >= self.ttl
    }

    pub fn has_any_tag(&self, tags: &[&str]) -> bool {
        tags.iter().any(|t| self.tags.contains(*t))
    }

    pub(crate) fn touch(&mut self, now: Instant) {
        self.access_count += 1;
        self.last_accessed = now;
    }

    pub(crate) fn info(&self, now: Instant) -> EntryInfo {
        let age = now.saturating_duration_since(self.inserted_at);
        let mut tags: Vec<String> = self.tags.iter().cloned().collect();
        tags.sort();
        EntryInfo {
            age,
            ttl: self.ttl,
            remaining_ttl: self.ttl.saturating_sub(age),
            tags,
            priority: self.priority,
            access_count: self.access_count,
            size_bytes: self.size_bytes,
            large: self.large,
        }
    }
}

/// Read-only snapshot of an entry's metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryInfo {
    pub age: Duration,
    pub ttl: Duration,
    pub remaining_ttl: Duration,
    pub tags: Vec<String>,
    pub priority: f64,
    pub access_count: u64,
    pub size_bytes: usize,
    pub large: bool,
}
