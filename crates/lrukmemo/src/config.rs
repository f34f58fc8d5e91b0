//! Construction-time configuration

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Visits required before a key earns a cache slot
pub const DEFAULT_PROMOTION_THRESHOLD: usize = 2;

/// Entries held by the cache tier
pub const DEFAULT_CACHE_CAPACITY: usize = 10;

/// Tunables for an [`crate::LrukMemo`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoConfig {
    /// Number of visits (K) before a key is promoted into the cache tier
    pub promotion_threshold: usize,

    /// Maximum number of entries in the cache tier
    pub cache_capacity: usize,
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            promotion_threshold: DEFAULT_PROMOTION_THRESHOLD,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl MemoConfig {
    /// Create a config with the default threshold and capacity
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the promotion threshold (K)
    pub fn with_promotion_threshold(mut self, k: usize) -> Self {
        self.promotion_threshold = k;
        self
    }

    /// Set the cache tier capacity
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Reject values that would leave the cache permanently inert
    pub fn validate(&self) -> Result<()> {
        if self.promotion_threshold < 1 {
            return Err(Error::InvalidThreshold(self.promotion_threshold));
        }
        if self.cache_capacity < 1 {
            return Err(Error::InvalidCapacity(self.cache_capacity));
        }
        Ok(())
    }
}
