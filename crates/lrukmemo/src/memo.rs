//! LrukMemo: memoizing wrapper with LRU-K admission
//!
//! A call's result is cached only once its key has been seen K times; until
//! then every call recomputes. Cached keys are evicted in strict LRU order.

use std::marker::PhantomData;
use std::rc::Rc;
use tracing::{debug, trace};

use crate::config::MemoConfig;
use crate::error::Result;
use crate::history::{HistoryLedger, Visit};
use crate::key::{derive_key, Arg, KeyString};
use crate::lru::CacheTier;
use crate::stats::{CacheStats, MemoStats};

/// Memoized computation with a history ledger in front of an LRU cache tier.
///
/// `S` is the scope the computation runs against (`()` unless one is given),
/// `V` the computed value and `E` the computation's error type.
pub struct LrukMemo<S, V, E, F> {
    /// Wrapped computation
    computation: F,

    /// Receiver handed to every computation call
    scope: S,

    config: MemoConfig,

    /// Visit counts for keys below the promotion threshold
    history: HistoryLedger<KeyString>,

    /// Promoted keys and their values
    cache: CacheTier<KeyString, Rc<V>>,

    stats: CacheStats,

    _error: PhantomData<fn() -> E>,
}

impl<V, E, F> LrukMemo<(), V, E, F>
where
    F: FnMut(&mut (), &[Arg]) -> std::result::Result<V, E>,
{
    /// Wrap a computation using the default threshold (2) and capacity (10)
    pub fn new(computation: F) -> Self {
        Self::build(MemoConfig::default(), (), computation)
    }

    /// Wrap a computation with custom settings
    ///
    /// # Returns
    /// * `Err` if the threshold or capacity is below 1
    pub fn with_config(config: MemoConfig, computation: F) -> Result<Self> {
        Self::with_scope(config, (), computation)
    }
}

impl<S, V, E, F> LrukMemo<S, V, E, F>
where
    F: FnMut(&mut S, &[Arg]) -> std::result::Result<V, E>,
{
    /// Wrap a computation that runs against `scope`
    ///
    /// # Returns
    /// * `Err` if the threshold or capacity is below 1
    pub fn with_scope(config: MemoConfig, scope: S, computation: F) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, scope, computation))
    }

    fn build(config: MemoConfig, scope: S, computation: F) -> Self {
        Self {
            computation,
            scope,
            config,
            history: HistoryLedger::new(config.promotion_threshold),
            cache: CacheTier::new(config.cache_capacity),
            stats: CacheStats::new(),
            _error: PhantomData,
        }
    }

    /// Run the computation for `args`, or return its cached result.
    ///
    /// A cache hit returns the stored value without calling the computation.
    /// On a miss the computation always runs; the visit is counted only after
    /// it succeeds, and the visit that reaches the threshold caches the value
    /// it just computed. A failing computation leaves both tiers untouched
    /// and its error is returned as is.
    pub fn invoke(&mut self, args: &[Arg]) -> std::result::Result<Rc<V>, E> {
        let key = derive_key(args);

        if let Some(value) = self.cache.lookup(&key) {
            let value = Rc::clone(value);
            self.stats.record_hit();
            trace!(cache_size = self.cache.len(), "Cache hit");
            return Ok(value);
        }
        self.stats.record_miss();

        let value = Rc::new((self.computation)(&mut self.scope, args)?);
        self.stats.record_computation();

        match self.history.record_visit(&key) {
            Visit::Promoted(key) => self.promote(key, Rc::clone(&value)),
            Visit::Recorded(entry) => {
                trace!(
                    visits = entry.visit_count,
                    threshold = self.config.promotion_threshold,
                    "Visit recorded below threshold"
                );
            }
        }

        debug_assert!(
            !(self.history.contains(&key) && self.cache.contains(&key)),
            "key tracked by both history ledger and cache tier"
        );
        debug_assert!(self.cache.len() <= self.cache.capacity());

        Ok(value)
    }

    fn promote(&mut self, key: KeyString, value: Rc<V>) {
        self.stats.record_promotion();
        if self.cache.insert(key, value).is_some() {
            self.stats.record_eviction();
            debug!(
                capacity = self.cache.capacity(),
                "Evicted least recently used entry"
            );
        }
        debug!(
            cache_size = self.cache.len(),
            history_size = self.history.len(),
            "Promoted key into cache tier"
        );
    }

    /// Sizes of the history ledger and cache tier
    pub fn get_stats(&self) -> MemoStats {
        MemoStats {
            history_size: self.history.len(),
            cache_size: self.cache.len(),
        }
    }

    /// Hit/miss/promotion/eviction counters
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Active configuration
    pub fn config(&self) -> &MemoConfig {
        &self.config
    }

    /// Scope the computation runs against
    pub fn scope(&self) -> &S {
        &self.scope
    }

    /// Mutable access to the computation's scope
    pub fn scope_mut(&mut self) -> &mut S {
        &mut self.scope
    }

    /// Forget every tracked and cached key and reset the counters
    pub fn clear(&mut self) {
        self.history.clear();
        self.cache.clear();
        self.stats.reset();
        debug!("Cleared memo cache");
    }
}
