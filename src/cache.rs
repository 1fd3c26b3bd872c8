//! Bounded result cache with TTL and a runtime-switchable LRU/MRU eviction
//! policy (spec §4.7). Grounded on the teacher's `query::cache::QueryCache`:
//! an `lru::LruCache` wrapped with atomic hit/miss counters. The teacher's
//! cache is LRU-only with no TTL; this generalizes it per spec.md by
//! tracking `created`/`last_accessed` timestamps on each entry and walking
//! `lru::LruCache`'s recency order from either end — its front is the
//! most-recently-touched entry, so MRU eviction is "pop the front" where
//! LRU eviction is the crate's native `pop_lru`.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;

use crate::core::config::EvictionPolicy;

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub results: V,
    pub created: i64,
    pub last_accessed: i64,
    pub access_count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct CacheAnalysis {
    pub hit_rate: f64,
    pub average_access_count: f64,
    pub top_keys: Vec<String>,
}

/// Bounded store with capacity `N` and TTL `T` (spec §4.7). Generic over
/// the cached value so the façade can use it for full `SearchResults`
/// without this module depending on the search-result shape.
pub struct ResultCache<V: Clone> {
    capacity: usize,
    ttl: Duration,
    policy: EvictionPolicy,
    entries: LruCache<String, CacheEntry<V>>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<V: Clone> ResultCache<V> {
    pub fn new(capacity: usize, ttl: Duration, policy: EvictionPolicy) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap();
        ResultCache {
            capacity,
            ttl,
            policy,
            entries: LruCache::new(cap),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    fn is_expired(&self, entry: &CacheEntry<V>, now_ms: i64) -> bool {
        now_ms.saturating_sub(entry.created) as u128 > self.ttl.as_millis()
    }

    /// On `get`, expired entries are deleted and counted as misses
    /// (spec §4.7).
    pub fn get(&mut self, key: &str, now_ms: i64) -> Option<V> {
        let expired = self
            .entries
            .peek(key)
            .map(|e| self.is_expired(e, now_ms))
            .unwrap_or(false);
        if expired {
            self.entries.pop(key);
            self.misses += 1;
            return None;
        }

        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.last_accessed = now_ms;
                entry.access_count += 1;
                self.hits += 1;
                Some(entry.results.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insert/overwrite `key`. If full, evict one entry by policy before
    /// inserting and count the eviction (spec §4.7).
    pub fn set(&mut self, key: String, value: V, now_ms: i64) {
        if !self.entries.contains(&key) && self.entries.len() >= self.capacity {
            self.evict_one();
        }
        self.entries.put(
            key,
            CacheEntry {
                results: value,
                created: now_ms,
                last_accessed: now_ms,
                access_count: 0,
            },
        );
    }

    fn evict_one(&mut self) {
        let evicted = match self.policy {
            // `pop_lru` removes the least-recently-used entry: the tail of
            // the crate's internal recency list.
            EvictionPolicy::Lru => self.entries.pop_lru(),
            // The crate exposes no `pop_mru`, but `peek` order starts at
            // the most-recently-used entry; pulling its key and popping it
            // directly realizes MRU eviction without a second structure.
            EvictionPolicy::Mru => {
                let mru_key = self.entries.iter().next().map(|(k, _)| k.clone());
                mru_key.and_then(|k| self.entries.pop(&k).map(|v| (k, v)))
            }
        };
        if evicted.is_some() {
            self.evictions += 1;
        }
    }

    pub fn invalidate_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Changing the policy at runtime must re-order existing entries to
    /// match (spec §4.7). Both policies share the same underlying recency
    /// list, so there is nothing to physically reorder; future evictions
    /// simply consult the new policy.
    pub fn set_policy(&mut self, policy: EvictionPolicy) {
        self.policy = policy;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            size: self.entries.len(),
        }
    }

    pub fn analysis(&self) -> CacheAnalysis {
        let total = self.hits + self.misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        };

        let mut by_access: HashMap<String, u32> = HashMap::new();
        let mut total_access = 0u64;
        for (key, entry) in self.entries.iter() {
            by_access.insert(key.clone(), entry.access_count);
            total_access += entry.access_count as u64;
        }
        let average_access_count = if by_access.is_empty() {
            0.0
        } else {
            total_access as f64 / by_access.len() as f64
        };

        let mut top_keys: Vec<(String, u32)> = by_access.into_iter().collect();
        top_keys.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let top_keys = top_keys.into_iter().map(|(k, _)| k).take(10).collect();

        CacheAnalysis {
            hit_rate,
            average_access_count,
            top_keys,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_never_exceeded() {
        let mut cache = ResultCache::new(2, Duration::from_secs(60), EvictionPolicy::Lru);
        cache.set("a".into(), 1, 0);
        cache.set("b".into(), 2, 0);
        cache.set("c".into(), 3, 0);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn lru_evicts_least_recently_used() {
        let mut cache = ResultCache::new(2, Duration::from_secs(60), EvictionPolicy::Lru);
        cache.set("a".into(), 1, 0);
        cache.set("b".into(), 2, 0);
        cache.get("a", 0); // touch a, b becomes LRU
        cache.set("c".into(), 3, 0);
        assert!(cache.get("a", 0).is_some());
        assert!(cache.get("b", 0).is_none());
    }

    #[test]
    fn mru_evicts_most_recently_used() {
        let mut cache = ResultCache::new(2, Duration::from_secs(60), EvictionPolicy::Mru);
        cache.set("a".into(), 1, 0);
        cache.set("b".into(), 2, 0);
        cache.get("b", 0); // touch b, making it MRU
        cache.set("c".into(), 3, 0);
        assert!(cache.get("b", 0).is_none());
        assert!(cache.get("a", 0).is_some());
    }

    #[test]
    fn expired_entries_are_treated_as_misses() {
        let mut cache = ResultCache::new(4, Duration::from_millis(100), EvictionPolicy::Lru);
        cache.set("a".into(), 1, 0);
        assert!(cache.get("a", 50).is_some());
        assert!(cache.get("a", 500).is_none());
        assert_eq!(cache.stats().hits + cache.stats().misses, 2);
    }

    #[test]
    fn hit_plus_miss_equals_total_lookups() {
        let mut cache = ResultCache::new(4, Duration::from_secs(60), EvictionPolicy::Lru);
        cache.set("a".into(), 1, 0);
        cache.get("a", 0);
        cache.get("missing", 0);
        let stats = cache.stats();
        assert_eq!(stats.hits + stats.misses, 2);
    }
}
