//! Page cache layer.
//!
//! Everything above the storage layer reaches pages through here:
//! - [`PageCache`] - fetch-or-load cache with eviction and flush
//! - [`PageHandle`] - shared lock around one resident page
//! - [`CacheStats`] / [`StatsSnapshot`] - lock-free counters

mod page_cache;
mod stats;

pub use page_cache::{PageCache, PageHandle};
pub use stats::{CacheStats, StatsSnapshot};
