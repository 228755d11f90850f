//! The unified cache.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use marketlens_core::error::CacheError;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::{CacheConfig, SetOptions};
use crate::entry::{CacheEntry, EntryInfo};
use crate::stats::{CacheStats, CacheStatus, OptimizeReport};

/// Share of entries dropped per trimming round in `optimize()`.
const TRIM_FRACTION: f64 = 0.2;

struct CacheState<V> {
    entries: HashMap<String, CacheEntry<V>>,
    memory_bytes: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<V> CacheState<V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            memory_bytes: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.memory_bytes = self.memory_bytes.saturating_sub(entry.size_bytes);
        Some(entry)
    }

    fn remove_all(&mut self, keys: &[String]) -> usize {
        keys.iter().filter(|k| self.remove(k).is_some()).count()
    }

    fn expired_keys(&self, now: Instant) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Least recently used first; lower priority first on equal access time.
    fn lru_order(&self) -> Vec<String> {
        let mut keyed: Vec<(&String, &CacheEntry<V>)> = self.entries.iter().collect();
        keyed.sort_by(|(_, a), (_, b)| {
            a.last_accessed
                .cmp(&b.last_accessed)
                .then(a.priority.total_cmp(&b.priority))
        });
        keyed.into_iter().map(|(k, _)| k.clone()).collect()
    }

    fn insertion_order(&self) -> Vec<String> {
        let mut keyed: Vec<(&String, &CacheEntry<V>)> = self.entries.iter().collect();
        keyed.sort_by_key(|(_, e)| e.inserted_at);
        keyed.into_iter().map(|(k, _)| k.clone()).collect()
    }
}

/// Serialized form of a value about to be stored.
struct Measured {
    size_bytes: usize,
    content_hash: u64,
}

/// In-process key/value cache with TTL, tags, eviction and deduplication.
///
/// All operations lock an internal mutex for a short, non-awaiting section,
/// so a single instance can be shared across tasks behind an `Arc`.
pub struct UnifiedCache<V> {
    config: CacheConfig,
    state: Mutex<CacheState<V>>,
}

impl<V: Clone + Serialize> UnifiedCache<V> {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CacheState::new()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up a live entry.
    ///
    /// An expired entry is deleted on access and counts as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut state = self.state.lock();

        let expired = match state.entries.get(key) {
            None => {
                state.misses += 1;
                return None;
            }
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            state.remove(key);
            state.misses += 1;
            debug!(key, "Cache entry expired");
            return None;
        }

        state.hits += 1;
        let entry = state.entries.get_mut(key)?;
        entry.touch(now);
        Some(entry.value.clone())
    }

    /// Store a value.
    ///
    /// Returns `false` when the entry was refused: it exceeds its size cap or
    /// cannot be serialized for measurement. Refusals are logged, not raised.
    pub fn set(&self, key: impl Into<String>, value: V, options: SetOptions) -> bool {
        let key = key.into();
        let max_size = options.max_size.unwrap_or(self.config.max_entry_bytes);

        let measured = match Self::measure(&key, &value, max_size) {
            Ok(m) => m,
            Err(err) => {
                warn!(%err, "Refused cache write");
                return false;
            }
        };

        let now = Instant::now();
        let entry = CacheEntry {
            value,
            inserted_at: now,
            ttl: options.ttl.unwrap_or_else(|| self.config.default_ttl()),
            tags: options.tags.into_iter().collect(),
            priority: options.priority.clamp(0.0, 1.0),
            access_count: 0,
            last_accessed: now,
            size_bytes: measured.size_bytes,
            content_hash: measured.content_hash,
            large: measured.size_bytes > self.config.compression_threshold_bytes,
        };

        let mut state = self.state.lock();
        state.remove(&key);

        if self.config.enable_deduplication {
            let duplicates: Vec<String> = state
                .entries
                .iter()
                .filter(|(_, e)| e.content_hash == entry.content_hash)
                .map(|(k, _)| k.clone())
                .collect();
            if !duplicates.is_empty() {
                debug!(key = %key, replaced = duplicates.len(), "Deduplicated cache entry");
                state.remove_all(&duplicates);
            }
        }

        if state.entries.len() >= self.config.max_entries
            || state.memory_bytes >= self.config.max_memory_bytes
        {
            self.evict_round(&mut state);
        }

        state.memory_bytes += entry.size_bytes;
        state.entries.insert(key, entry);
        true
    }

    pub fn remove(&self, key: &str) -> bool {
        self.state.lock().remove(key).is_some()
    }

    /// Remove every entry carrying any of `tags`. Returns how many went.
    pub fn remove_by_tags(&self, tags: &[&str]) -> usize {
        let mut state = self.state.lock();
        let keys: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, e)| e.has_any_tag(tags))
            .map(|(k, _)| k.clone())
            .collect();
        let removed = state.remove_all(&keys);
        if removed > 0 {
            debug!(removed, ?tags, "Invalidated cache entries by tag");
        }
        removed
    }

    /// Drop all entries. Counters are kept.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.memory_bytes = 0;
    }

    /// Housekeeping pass.
    ///
    /// Removes expired entries, deduplicates, evicts least recently used
    /// entries down to `max_entries`, then drops the oldest entries by
    /// insertion time while memory is over budget. Running it twice in a row
    /// removes nothing the second time.
    pub fn optimize(&self) -> OptimizeReport {
        let now = Instant::now();
        let mut state = self.state.lock();
        let mut report = OptimizeReport::default();

        let expired = state.expired_keys(now);
        report.expired_removed = state.remove_all(&expired);

        if self.config.enable_deduplication {
            let duplicates = Self::duplicate_keys(&state);
            report.duplicates_removed = state.remove_all(&duplicates);
        }

        if state.entries.len() > self.config.max_entries {
            let excess = state.entries.len() - self.config.max_entries;
            let victims: Vec<String> = state.lru_order().into_iter().take(excess).collect();
            report.evicted = state.remove_all(&victims);
        }

        while state.memory_bytes > self.config.max_memory_bytes && !state.entries.is_empty() {
            let count = fraction_of(state.entries.len(), TRIM_FRACTION);
            let victims: Vec<String> = state.insertion_order().into_iter().take(count).collect();
            report.trimmed += state.remove_all(&victims);
        }

        state.evictions += (report.evicted + report.trimmed) as u64;

        if report.total_removed() > 0 {
            debug!(
                expired = report.expired_removed,
                duplicates = report.duplicates_removed,
                evicted = report.evicted,
                trimmed = report.trimmed,
                remaining = state.entries.len(),
                "Cache optimized"
            );
        }

        report
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats::new(state.hits, state.misses, state.evictions)
    }

    pub fn status(&self) -> CacheStatus {
        let now = Instant::now();
        let state = self.state.lock();
        let stats = CacheStats::new(state.hits, state.misses, state.evictions);
        CacheStatus {
            size: state.entries.len(),
            max_size: self.config.max_entries,
            memory_usage_bytes: state.memory_bytes,
            max_memory_bytes: self.config.max_memory_bytes,
            expired_entries: state.entries.values().filter(|e| e.is_expired(now)).count(),
            large_entries: state.entries.values().filter(|e| e.large).count(),
            hit_rate: stats.hit_rate,
        }
    }

    /// Metadata of an entry, expired or not. Does not count as an access.
    pub fn entry_info(&self, key: &str) -> Option<EntryInfo> {
        let now = Instant::now();
        self.state.lock().entries.get(key).map(|e| e.info(now))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        self.state
            .lock()
            .entries
            .get(key)
            .is_some_and(|e| !e.is_expired(now))
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn memory_usage(&self) -> usize {
        self.state.lock().memory_bytes
    }

    fn measure(key: &str, value: &V, max_size: usize) -> Result<Measured, CacheError> {
        let json = serde_json::to_string(value).map_err(|e| CacheError::Serialization {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        // Two bytes per UTF-16 code unit
        let size_bytes = (key.encode_utf16().count() + json.encode_utf16().count()) * 2;
        if size_bytes > max_size {
            return Err(CacheError::EntryTooLarge {
                key: key.to_string(),
                size: size_bytes,
                max: max_size,
            });
        }

        let mut hasher = DefaultHasher::new();
        json.hash(&mut hasher);
        Ok(Measured {
            size_bytes,
            content_hash: hasher.finish(),
        })
    }

    /// One capacity-pressure round: drop a fraction of the entries.
    fn evict_round(&self, state: &mut CacheState<V>) {
        let count = fraction_of(state.entries.len(), self.config.eviction_fraction);
        let victims: Vec<String> = if self.config.enable_lru {
            state.lru_order().into_iter().take(count).collect()
        } else {
            let keys: Vec<String> = state.entries.keys().cloned().collect();
            keys.choose_multiple(&mut rand::thread_rng(), count)
                .cloned()
                .collect()
        };

        let evicted = state.remove_all(&victims);
        state.evictions += evicted as u64;
        debug!(evicted, lru = self.config.enable_lru, "Evicted cache entries");
    }

    /// Keys to drop so that each payload is stored once. The copy with the
    /// highest priority survives, then the most recently accessed one.
    fn duplicate_keys(state: &CacheState<V>) -> Vec<String> {
        let mut groups: HashMap<u64, Vec<(&String, &CacheEntry<V>)>> = HashMap::new();
        for (key, entry) in &state.entries {
            groups.entry(entry.content_hash).or_default().push((key, entry));
        }

        let mut duplicates = Vec::new();
        for mut group in groups.into_values().filter(|g| g.len() > 1) {
            group.sort_by(|(_, a), (_, b)| {
                b.priority
                    .total_cmp(&a.priority)
                    .then(b.last_accessed.cmp(&a.last_accessed))
            });
            duplicates.extend(group.into_iter().skip(1).map(|(k, _)| k.clone()));
        }
        duplicates
    }
}

impl<V: Clone + Serialize> Default for UnifiedCache<V> {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

/// ⌈len × fraction⌉, at least one and at most `len`.
fn fraction_of(len: usize, fraction: f64) -> usize {
    ((len as f64 * fraction).ceil() as usize).clamp(1, len.max(1))
}
