//! # lrukmemo
//!
//! Function memoization gated by an LRU-K admission policy.
//!
//! ## Architecture
//! - **Key derivation**: argument tuples are snapshotted (callables dropped,
//!   cycles detected) and rendered as canonical JSON
//! - **History ledger**: visit counts for keys seen fewer than K times
//! - **Cache tier**: arena-backed doubly-linked LRU list, O(1) touch and evict
//! - **LrukMemo**: consults the cache tier, counts misses, promotes on the
//!   K-th visit
//!
//! The engine is single-threaded: arguments and cached values are `Rc`-based
//! and never cross threads.
//!
//! ```
//! use lrukmemo::{Arg, LrukMemo};
//!
//! let mut memo = LrukMemo::new(|_: &mut (), args: &[Arg]| {
//!     Ok::<i64, String>(args.iter().filter_map(Arg::as_int).sum())
//! });
//!
//! let args = [Arg::from(1), Arg::from(2)];
//! assert_eq!(*memo.invoke(&args).unwrap(), 3); // recorded
//! assert_eq!(*memo.invoke(&args).unwrap(), 3); // promoted
//! assert_eq!(memo.get_stats().cache_size, 1);
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod history;
mod key;
mod lru;
mod memo;
mod stats;

pub use config::{MemoConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_PROMOTION_THRESHOLD};
pub use error::{Error, Result};
pub use history::{HistoryEntry, HistoryLedger, Visit};
pub use key::{derive_key, Arg, Callable, KeyString, SharedArg};
pub use lru::CacheTier;
pub use memo::LrukMemo;
pub use stats::{CacheStats, MemoStats};
