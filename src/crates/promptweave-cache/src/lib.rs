//! A bounded, thread-safe cache with LRU/LFU/FIFO eviction and per-entry
//! TTL, shared by the router's response/context cache and the evolution
//! engine's fitness memoization.
//!
//! The entry and stats shapes follow a reference cache crate's
//! `{value, inserted_at, frequency}` entry and atomic hit/miss counters,
//! generalized with a `last_access_at` field (needed for LRU, absent from
//! that reference) and an `evictions` counter. Unlike that reference, this
//! cache keeps no separate ordering structure: eviction scans the entry map
//! directly, which keeps `set` trivially correct at the cost of an O(n)
//! scan when the cache is full — the same order of work that reference
//! spends on its own order-deque bookkeeping.
//!
//! # Modules
//!
//! - `entry` - per-key value plus the bookkeeping eviction policies rank on
//! - `policy` - the `EvictionPolicy` enum (LRU/LFU/FIFO)
//! - `stats` - atomic hit/miss/eviction counters plus a point-in-time size
//! - `error` - construction-time configuration errors

mod entry;
mod error;
mod policy;
mod stats;

pub use error::CacheConfigError;
pub use policy::EvictionPolicy;
pub use stats::CacheStats;

use entry::Entry;
use parking_lot::Mutex;
use promptweave_core::Clock;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

/// Immutable, validated settings for a [`Cache`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    max_size: usize,
    default_ttl: Option<Duration>,
    policy: EvictionPolicy,
}

impl CacheConfig {
    /// Starts a config with the given capacity and LRU eviction, no TTL.
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            default_ttl: None,
            policy: EvictionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: EvictionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    fn validate(&self) -> Result<(), CacheConfigError> {
        if self.max_size == 0 {
            return Err(CacheConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

struct Inner<K, V> {
    entries: HashMap<K, Entry<V>>,
    next_seq: u64,
}

/// A bounded cache keyed by `K`, storing clonable values `V`.
///
/// Every operation takes `&self`: the entry table lives behind a single
/// `parking_lot::Mutex`, so `Cache` is `Clone`-free but freely shareable via
/// `Arc<Cache<K, V>>` across router and evolution-engine call sites.
pub struct Cache<K, V> {
    inner: Mutex<Inner<K, V>>,
    stats: CacheStats,
    max_size: usize,
    default_ttl: Option<Duration>,
    policy: EvictionPolicy,
    clock: Arc<dyn Clock>,
}

impl<K, V> std::fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("max_size", &self.max_size)
            .field("default_ttl", &self.default_ttl)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(config: CacheConfig, clock: Arc<dyn Clock>) -> Result<Self, CacheConfigError> {
        config.validate()?;
        Ok(Self {
            inner: Mutex::new(Inner {
                entries: HashMap::with_capacity(config.max_size),
                next_seq: 0,
            }),
            stats: CacheStats::new(),
            max_size: config.max_size,
            default_ttl: config.default_ttl,
            policy: config.policy,
            clock,
        })
    }

    /// A point-in-time snapshot of `{hits, misses, evictions, size, hit_rate}`.
    /// `size` is stamped in from the entry table's current length; the rest
    /// carry over from the cache's live counters.
    pub fn stats(&self) -> CacheStats {
        let size = self.inner.lock().entries.len() as u64;
        self.stats.snapshot_with_size(size)
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads `key`, applying lazy TTL expiry and updating whatever
    /// bookkeeping the active eviction policy needs. Never fails: a miss is
    /// `None`, not an error.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        let expired = match inner.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => {
                drop(inner);
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            inner.entries.remove(key);
            drop(inner);
            self.stats.record_miss();
            return None;
        }

        let entry = inner.entries.get_mut(key).expect("checked present above");
        entry.touch(now);
        let value = entry.value.clone();
        drop(inner);
        self.stats.record_hit();
        Some(value)
    }

    /// Inserts or replaces `key` with the cache's default TTL.
    pub fn set(&self, key: K, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Inserts or replaces `key`, overriding the cache's default TTL for
    /// this entry only. `None` means "never expires".
    pub fn set_with_ttl(&self, key: K, value: V, ttl: Option<Duration>) {
        let now = self.clock.now();
        let mut inner = self.inner.lock();

        if let Some(existing) = inner.entries.get_mut(&key) {
            existing.value = value;
            existing.inserted_at = now;
            existing.ttl = ttl;
            return;
        }

        if inner.entries.len() >= self.max_size {
            self.evict_one(&mut inner);
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(key, Entry::new(value, now, ttl, seq));
    }

    pub fn delete(&self, key: &K) -> Option<V> {
        self.inner.lock().entries.remove(key).map(|e| e.value)
    }

    pub fn clear(&self) {
        self.inner.lock().entries.clear();
        self.stats.reset();
    }

    /// Picks a victim per the active policy and removes it. Ties are broken
    /// by insertion sequence so eviction order is deterministic even when
    /// the clock hasn't advanced between inserts.
    fn evict_one(&self, inner: &mut Inner<K, V>) {
        let victim = match self.policy {
            EvictionPolicy::Lru => inner
                .entries
                .iter()
                .min_by_key(|(_, e)| (e.last_access_at, e.seq))
                .map(|(k, _)| k.clone()),
            EvictionPolicy::Lfu => inner
                .entries
                .iter()
                .min_by_key(|(_, e)| (e.access_count, e.last_access_at, e.seq))
                .map(|(k, _)| k.clone()),
            EvictionPolicy::Fifo => inner
                .entries
                .iter()
                .min_by_key(|(_, e)| (e.inserted_at, e.seq))
                .map(|(k, _)| k.clone()),
        };

        if let Some(key) = victim {
            inner.entries.remove(&key);
            self.stats.record_eviction();
            tracing::trace!(policy = %self.policy, "evicted cache entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptweave_core::FakeClock;

    fn cache(max_size: usize, policy: EvictionPolicy) -> Cache<String, i32> {
        let config = CacheConfig::new(max_size).with_policy(policy);
        Cache::new(config, Arc::new(FakeClock::new())).unwrap()
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = Cache::<String, i32>::new(CacheConfig::new(0), Arc::new(FakeClock::new()))
            .unwrap_err();
        assert_eq!(err, CacheConfigError::ZeroCapacity);
    }

    #[test]
    fn miss_then_hit() {
        let cache = cache(4, EvictionPolicy::Lru);
        assert_eq!(cache.get(&"a".to_string()), None);
        cache.set("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.stats().hits(), 1);
        assert_eq!(cache.stats().misses(), 1);
    }

    #[test]
    fn never_exceeds_max_size() {
        let cache = cache(3, EvictionPolicy::Lru);
        for i in 0..10 {
            cache.set(format!("k{i}"), i);
        }
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn lru_evicts_least_recently_read() {
        let cache = cache(2, EvictionPolicy::Lru);
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        // touch "a" so "b" becomes the least recently used
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        cache.set("c".to_string(), 3);
        assert_eq!(cache.get(&"b".to_string()), None);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.get(&"c".to_string()), Some(3));
        assert_eq!(cache.stats().evictions(), 1);
    }

    #[test]
    fn lfu_evicts_least_frequently_read() {
        let cache = cache(2, EvictionPolicy::Lfu);
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        cache.get(&"a".to_string());
        cache.get(&"a".to_string());
        cache.get(&"b".to_string());
        cache.set("c".to_string(), 3);
        assert_eq!(cache.get(&"b".to_string()), None);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
    }

    #[test]
    fn lfu_ties_break_by_oldest_access() {
        let cache = cache(2, EvictionPolicy::Lfu);
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        // neither has been read: access_count ties at 0, so the older
        // last_access_at (from insertion) decides. "a" was inserted first.
        cache.set("c".to_string(), 3);
        assert_eq!(cache.get(&"a".to_string()), None);
        assert_eq!(cache.get(&"b".to_string()), Some(2));
    }

    #[test]
    fn fifo_evicts_oldest_insert_regardless_of_reads() {
        let cache = cache(2, EvictionPolicy::Fifo);
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        // repeatedly reading "a" must not save it under FIFO
        for _ in 0..5 {
            cache.get(&"a".to_string());
        }
        cache.set("c".to_string(), 3);
        assert_eq!(cache.get(&"a".to_string()), None);
        assert_eq!(cache.get(&"b".to_string()), Some(2));
        assert_eq!(cache.get(&"c".to_string()), Some(3));
    }

    #[test]
    fn ttl_expiry_is_lazy_and_counts_as_a_miss() {
        let clock = Arc::new(FakeClock::new());
        let config = CacheConfig::new(4).with_default_ttl(Duration::from_secs(10));
        let cache: Cache<String, i32> = Cache::new(config, clock.clone()).unwrap();
        cache.set("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        clock.advance(Duration::from_secs(11));
        assert_eq!(cache.get(&"a".to_string()), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn per_entry_ttl_overrides_default() {
        let clock = Arc::new(FakeClock::new());
        let config = CacheConfig::new(4).with_default_ttl(Duration::from_secs(1));
        let cache: Cache<String, i32> = Cache::new(config, clock.clone()).unwrap();
        cache.set_with_ttl("a".to_string(), 1, None);
        clock.advance(Duration::from_secs(100));
        assert_eq!(cache.get(&"a".to_string()), Some(1));
    }

    #[test]
    fn replacing_a_key_does_not_evict() {
        let cache = cache(1, EvictionPolicy::Lru);
        cache.set("a".to_string(), 1);
        cache.set("a".to_string(), 2);
        assert_eq!(cache.get(&"a".to_string()), Some(2));
        assert_eq!(cache.stats().evictions(), 0);
    }

    #[test]
    fn delete_and_clear() {
        let cache = cache(4, EvictionPolicy::Lru);
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        assert_eq!(cache.delete(&"a".to_string()), Some(1));
        assert_eq!(cache.delete(&"a".to_string()), None);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().hits(), 0);
        assert_eq!(cache.stats().misses(), 0);
    }

    #[test]
    fn zero_ttl_never_expires() {
        let clock = Arc::new(FakeClock::new());
        let cache: Cache<String, i32> = Cache::new(CacheConfig::new(4), clock.clone()).unwrap();
        cache.set_with_ttl("a".to_string(), 1, Some(Duration::ZERO));
        clock.advance(Duration::from_secs(1_000_000));
        assert_eq!(cache.get(&"a".to_string()), Some(1));
    }

    #[test]
    fn lru_cache_cycle_scenario() {
        // Capacity 2, insert a, b, read a, insert c -> b evicted, a and c survive.
        let cache = cache(2, EvictionPolicy::Lru);
        cache.set("a".to_string(), 1);
        cache.set("b".to_string(), 2);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        cache.set("c".to_string(), 3);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&"b".to_string()), None);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.get(&"c".to_string()), Some(3));
    }
}
