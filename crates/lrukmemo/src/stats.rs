//! Memo cache statistics
//!
//! Only counts are exposed; key and value contents never leave the engine.

use serde::Serialize;

/// Occupancy of both tiers, as returned by [`crate::LrukMemo::get_stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoStats {
    /// Keys seen fewer than K times
    pub history_size: usize,
    /// Keys holding a cached value
    pub cache_size: usize,
}

/// Activity counters for a memo cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    hits: u64,
    misses: u64,
    promotions: u64,
    evictions: u64,
    computations: u64,
}

impl CacheStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cache hit
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Record a cache miss
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Record a key entering the cache tier
    pub fn record_promotion(&mut self) {
        self.promotions += 1;
    }

    /// Record an eviction
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Record a successful run of the wrapped computation
    pub fn record_computation(&mut self) {
        self.computations += 1;
    }

    /// Get total hits
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Get total misses
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Get total promotions
    pub fn promotions(&self) -> u64 {
        self.promotions
    }

    /// Get total evictions
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Get total successful computations
    pub fn computations(&self) -> u64 {
        self.computations
    }

    /// Calculate hit ratio (0.0 to 1.0)
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Reset all statistics
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_basic() {
        let mut stats = CacheStats::new();

        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        stats.record_promotion();

        assert_eq!(stats.hits(), 2);
        assert_eq!(stats.misses(), 1);
        assert_eq!(stats.promotions(), 1);
        assert_eq!(stats.hit_ratio(), 2.0 / 3.0);
    }

    #[test]
    fn test_stats_reset() {
        let mut stats = CacheStats::new();

        stats.record_hit();
        stats.record_miss();
        stats.record_eviction();
        stats.record_computation();
        stats.reset();

        assert_eq!(stats, CacheStats::default());
        assert_eq!(stats.hit_ratio(), 0.0);
    }

    #[test]
    fn test_memo_stats_serialize() {
        let stats = MemoStats {
            history_size: 3,
            cache_size: 1,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert_eq!(json, r#"{"history_size":3,"cache_size":1}"#);
    }
}
