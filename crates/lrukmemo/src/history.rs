//! History ledger: visit counts for keys that have not yet earned a cache slot

use std::collections::HashMap;
use std::hash::Hash;
use ahash::RandomState;

/// A key below the promotion threshold and how often it has been seen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry<K> {
    /// Lookup key
    pub key: K,
    /// Visits so far, always in `1..threshold`
    pub visit_count: usize,
}

/// Outcome of recording a visit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visit<K> {
    /// Still below the threshold; the entry stays in the ledger
    Recorded(HistoryEntry<K>),
    /// Threshold reached; the entry has left the ledger and must be cached
    Promoted(K),
}

/// Per-key visit counter with a fixed promotion threshold
pub struct HistoryLedger<K> {
    visits: HashMap<K, usize, RandomState>,
    threshold: usize,
}

impl<K> HistoryLedger<K>
where
    K: Hash + Eq + Clone,
{
    /// Create a ledger that promotes keys on their `threshold`-th visit
    pub fn new(threshold: usize) -> Self {
        assert!(threshold > 0, "Threshold must be greater than 0");

        Self {
            visits: HashMap::with_hasher(RandomState::new()),
            threshold,
        }
    }

    /// Count one visit to `key`.
    ///
    /// The visit that reaches the threshold removes the entry and reports
    /// [`Visit::Promoted`]; with a threshold of 1 that is the first visit, and
    /// the key never occupies the ledger.
    pub fn record_visit(&mut self, key: &K) -> Visit<K> {
        let visit_count = self.visits(key) + 1;
        if visit_count >= self.threshold {
            self.visits.remove(key);
            return Visit::Promoted(key.clone());
        }

        self.visits.insert(key.clone(), visit_count);
        Visit::Recorded(HistoryEntry {
            key: key.clone(),
            visit_count,
        })
    }

    /// Visits recorded for `key`, 0 if unseen
    pub fn visits(&self, key: &K) -> usize {
        self.visits.get(key).copied().unwrap_or(0)
    }

    /// Forget a key; no-op when absent
    pub fn remove(&mut self, key: &K) {
        self.visits.remove(key);
    }

    /// Check whether `key` is being tracked
    pub fn contains(&self, key: &K) -> bool {
        self.visits.contains_key(key)
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.visits.len()
    }

    /// Check if no key is being tracked
    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    /// Promotion threshold (K)
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Forget every key
    pub fn clear(&mut self) {
        self.visits.clear();
    }
}
