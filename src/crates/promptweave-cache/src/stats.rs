//! Lock-free hit/miss/eviction counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Cumulative counters for a single cache instance, plus the entry count at
/// the moment the snapshot was taken.
///
/// `hits`/`misses`/`evictions` are independent `AtomicU64`s updated with
/// `Relaxed` ordering: callers only ever read these for monitoring, never to
/// make a decision that must be consistent with a concurrent `get`/`set`, so
/// there is no need for anything stronger. `size` is not a counter — it is
/// stamped in by [`crate::Cache::stats`] from the entry table's length at
/// snapshot time, since the table itself, not `CacheStats`, owns that count.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    size: u64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Number of entries held by the cache when this snapshot was taken.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn total_accesses(&self) -> u64 {
        self.hits() + self.misses()
    }

    /// Fraction of accesses that were hits, in `[0.0, 1.0]`. `0.0` when the
    /// cache has never been read.
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    pub fn miss_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.misses() as f64 / total as f64
        }
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }

    /// Snapshots the current counters into a fresh, independent
    /// `CacheStats` stamped with `size` as the entry count at this instant.
    pub(crate) fn snapshot_with_size(&self, size: u64) -> Self {
        Self {
            hits: AtomicU64::new(self.hits()),
            misses: AtomicU64::new(self.misses()),
            evictions: AtomicU64::new(self.evictions()),
            size,
        }
    }
}

/// Snapshots the current counters and carries `size` over unchanged.
impl Clone for CacheStats {
    fn clone(&self) -> Self {
        self.snapshot_with_size(self.size)
    }
}
