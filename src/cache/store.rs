//! Cache Store Module
//!
//! Synchronous core of a cache: a bounded map from composite key to entry with
//! lazy expiry, capacity eviction and bulk invalidation. Not thread-safe on
//! its own; `NamespacedCache` wraps it in a lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use crate::cache::{CacheEntry, CacheKey, CacheStats, EvictionPolicy, KeyPattern};

// == Cache Store ==
#[derive(Debug)]
pub struct CacheStore<V> {
    entries: HashMap<CacheKey, CacheEntry<V>>,
    policy: EvictionPolicy,
    /// Maximum number of entries; zero disables storage entirely
    max_entries: usize,
    stats: CacheStats,
}

impl<V> CacheStore<V> {
    // == Constructor ==
    pub fn new(max_entries: usize, policy: EvictionPolicy) -> Self {
        Self {
            entries: HashMap::new(),
            policy,
            max_entries,
            stats: CacheStats::new(),
        }
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    // == Set ==
    /// Stores `value` under `key`, expiring `ttl` from now.
    ///
    /// Overwrites replace the entry in place. A new key arriving at capacity
    /// first drops expired entries, then evicts per the policy.
    pub fn set(&mut self, key: CacheKey, value: Arc<V>, ttl: Duration) {
        if self.max_entries == 0 {
            return;
        }

        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_entries {
            self.make_room();
        }

        self.entries.insert(key, CacheEntry::new(value, ttl));
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Returns the value if present and fresh, removing it if expired.
    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<V>> {
        let now = Instant::now();

        match self.entries.get_mut(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                entry.touch(now);
                self.stats.record_hit();
                Some(Arc::clone(&entry.value))
            }
            Some(_) => {
                self.entries.remove(key);
                trace!(key = %key, "lazily expired entry");
                self.stats.record_expirations(1);
                self.stats.record_miss();
                self.stats.set_total_entries(self.entries.len());
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Peek ==
    /// Returns the fresh entry without touching access metadata or stats.
    pub fn peek(&self, key: &CacheKey) -> Option<&CacheEntry<V>> {
        self.entries.get(key).filter(|entry| !entry.is_expired())
    }

    // == Delete ==
    /// Removes one entry; returns whether anything was removed.
    pub fn delete(&mut self, key: &CacheKey) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.stats.record_invalidations(1);
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }

    // == Delete Namespace ==
    /// Removes every entry whose composite key starts with `namespace:`.
    pub fn delete_namespace(&mut self, namespace: &str) -> usize {
        self.remove_where(|key| key.in_namespace(namespace))
    }

    // == Delete Matching ==
    /// Removes every entry matched by `pattern`, see [`KeyPattern::matches_key`].
    pub fn delete_matching(&mut self, pattern: &KeyPattern, namespace: Option<&str>) -> usize {
        self.remove_where(|key| pattern.matches_key(key, namespace))
    }

    // == Clear ==
    /// Removes all entries, returning how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.stats.record_invalidations(count);
        self.stats.set_total_entries(0);
        count
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, returning the number removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();

        self.entries.retain(|_, entry| !entry.is_expired_at(now));

        let removed = before - self.entries.len();
        self.stats.record_expirations(removed);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut CacheStats {
        &mut self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_where(&mut self, mut predicate: impl FnMut(&CacheKey) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !predicate(key));

        let removed = before - self.entries.len();
        self.stats.record_invalidations(removed);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    fn make_room(&mut self) {
        if self.cleanup_expired() > 0 && self.entries.len() < self.max_entries {
            return;
        }

        let victims = self.policy.select_victims(&self.entries);
        for key in &victims {
            self.entries.remove(key);
        }
        trace!(count = victims.len(), policy = %self.policy, "evicted entries");
        self.stats.record_evictions(victims.len());
    }
}
