//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and stale loads.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of loads served from a fresh entry
    pub hits: u64,
    /// Number of loads for keys that were never saved
    pub misses: u64,
    /// Number of loads that found an entry past its TTL
    pub stale: u64,
    /// Number of successful saves
    pub writes: u64,
    /// Number of entries removed by the purge task
    pub purged: u64,
    /// Current number of entries in the store
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Stale loads count as misses. Returns 0.0 if no loads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.stale;
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

    pub fn record_stale(&mut self) {
        self.stale += 1;
    }

    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    pub fn record_purged(&mut self, count: usize) {
        self.purged += count as u64;
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
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.stale, 0);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_counts_stale_as_miss() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        stats.record_stale();
        stats.record_hit();
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_record_purged() {
        let mut stats = CacheStats::new();
        stats.record_purged(3);
        stats.record_purged(2);
        assert_eq!(stats.purged, 5);
    }
}
