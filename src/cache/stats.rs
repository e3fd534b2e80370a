//! Store Statistics Module
//!
//! Tracks store metrics including hits, misses, and evictions.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Store Stats ==
/// Point-in-time view of a bounded store's counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    /// Number of successful lookups
    pub hits: u64,
    /// Number of lookups for absent keys
    pub misses: u64,
    /// Number of entries dropped to make room
    pub evictions: u64,
    /// Current number of entries
    pub entries: usize,
    /// Fixed maximum number of entries
    pub capacity: usize,
}

impl StoreStats {
    // == Hit Rate ==
    /// Calculates the hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Counters ==
/// Lock-free counters so lookups under a shared lock can still record stats.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl StatsCounters {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, entries: usize, capacity: usize) -> StoreStats {
        StoreStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries,
            capacity,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = StoreStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let counters = StatsCounters::default();
        counters.record_hit();
        counters.record_miss();

        assert_eq!(counters.snapshot(0, 1).hit_rate(), 0.5);
    }

    #[test]
    fn test_snapshot_reports_counters() {
        let counters = StatsCounters::default();
        counters.record_eviction();
        counters.record_eviction();
        counters.record_hit();

        let stats = counters.snapshot(3, 8);
        assert_eq!(stats.evictions, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.entries, 3);
        assert_eq!(stats.capacity, 8);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = StoreStats {
            hits: 1,
            misses: 2,
            evictions: 3,
            entries: 4,
            capacity: 5,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["evictions"], 3);
        assert_eq!(json["capacity"], 5);
    }
}
