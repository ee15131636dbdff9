//! Cache Statistics Module
//!
//! Tracks lookup, eviction and computation counters for one cache.

use serde::Serialize;

// == Cache Stats ==
/// Counters for one cache instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the store
    pub hits: u64,
    /// Lookups that found nothing fresh
    pub misses: u64,
    /// Entries dropped because their TTL elapsed (lazily or by the sweep)
    pub expirations: u64,
    /// Entries dropped to stay within capacity
    pub evictions: u64,
    /// Entries dropped by delete, namespace or pattern invalidation
    pub invalidations: u64,
    /// Computations started by `get_or_set`
    pub computes: u64,
    /// Callers that joined an already running computation
    pub deduplicated: u64,
    /// Computations that returned an error or aborted
    pub compute_failures: u64,
    /// Current number of entries in the store
    pub total_entries: usize,
    /// Computations currently in flight
    pub in_flight: usize,
}

impl CacheStats {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    pub fn record_invalidations(&mut self, count: usize) {
        self.invalidations += count as u64;
    }

    pub fn record_compute(&mut self) {
        self.computes += 1;
    }

    pub fn record_dedup(&mut self) {
        self.deduplicated += 1;
    }

    pub fn record_compute_failure(&mut self) {
        self.compute_failures += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats, CacheStats::default());
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_bulk_counters() {
        let mut stats = CacheStats::new();
        stats.record_evictions(3);
        stats.record_evictions(2);
        stats.record_expirations(4);
        stats.record_invalidations(7);

        assert_eq!(stats.evictions, 5);
        assert_eq!(stats.expirations, 4);
        assert_eq!(stats.invalidations, 7);
    }

    #[test]
    fn test_compute_counters() {
        let mut stats = CacheStats::new();
        stats.record_compute();
        stats.record_dedup();
        stats.record_dedup();
        stats.record_compute_failure();

        assert_eq!(stats.computes, 1);
        assert_eq!(stats.deduplicated, 2);
        assert_eq!(stats.compute_failures, 1);
    }
}
