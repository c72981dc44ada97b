//! Page cache statistics tracking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained by the page cache.
///
/// All fields are atomic so concurrent fetches can bump them without
/// taking the cache lock.
///
/// # Memory Ordering
/// Everything uses `Ordering::Relaxed`:
/// - Each counter only needs atomicity, not ordering against the others
/// - Readers tolerate slightly stale values; these numbers are advisory
///
/// # Example
/// ```
/// use minnowdb::cache::CacheStats;
/// use std::sync::atomic::Ordering;
///
/// let stats = CacheStats::new();
/// stats.hits.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(stats.hits.load(Ordering::Relaxed), 1);
/// ```
#[derive(Debug)]
pub struct CacheStats {
    /// Fetches satisfied by a resident page.
    pub hits: AtomicU64,

    /// Fetches that had to go to the heap file.
    pub misses: AtomicU64,

    /// Pages removed from the cache to make room.
    pub evictions: AtomicU64,

    /// Pages read from heap files.
    pub pages_read: AtomicU64,

    /// Pages written back to heap files (flushes and dirty evictions).
    pub pages_written: AtomicU64,
}

impl CacheStats {
    /// Create a tracker with every counter at zero.
    pub fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            pages_read: AtomicU64::new(0),
            pages_written: AtomicU64::new(0),
        }
    }

    /// Fraction of fetches served from memory (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Copy the current counters into a plain, non-atomic struct.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            pages_read: self.pages_read.load(Ordering::Relaxed),
            pages_written: self.pages_written.load(Ordering::Relaxed),
        }
    }

    /// Zero every counter.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.pages_read.store(0, Ordering::Relaxed);
        self.pages_written.store(0, Ordering::Relaxed);
    }
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time copy of [`CacheStats`].
///
/// Plain integers, so it can be compared, logged, or stashed in a test
/// without worrying about concurrent updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub pages_read: u64,
    pub pages_written: u64,
}

impl StatsSnapshot {
    /// Fraction of fetches served from memory (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cache {{ hits: {}, misses: {}, evictions: {}, hit rate: {:.2}% }}",
            self.hits,
            self.misses,
            self.evictions,
            self.hit_rate() * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_start_at_zero() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits.load(Ordering::Relaxed), 0);
        assert_eq!(stats.misses.load(Ordering::Relaxed), 0);
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats::new();

        stats.hits.fetch_add(3, Ordering::Relaxed);
        stats.misses.fetch_add(1, Ordering::Relaxed);

        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_snapshot_copies_counters() {
        let stats = CacheStats::new();
        stats.hits.fetch_add(3, Ordering::Relaxed);
        stats.misses.fetch_add(1, Ordering::Relaxed);
        stats.evictions.fetch_add(2, Ordering::Relaxed);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.hits, 3);
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.evictions, 2);
        assert_eq!(snapshot.hit_rate(), 0.75);
    }

    #[test]
    fn test_reset() {
        let stats = CacheStats::new();
        stats.hits.fetch_add(42, Ordering::Relaxed);
        stats.pages_written.fetch_add(7, Ordering::Relaxed);

        stats.reset();

        assert_eq!(stats.hits.load(Ordering::Relaxed), 0);
        assert_eq!(stats.pages_written.load(Ordering::Relaxed), 0);
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_snapshot_display() {
        let stats = CacheStats::new();
        stats.hits.fetch_add(90, Ordering::Relaxed);
        stats.misses.fetch_add(10, Ordering::Relaxed);

        let display = format!("{}", stats.snapshot());
        assert!(display.contains("hits: 90"));
        assert!(display.contains("misses: 10"));
        assert!(display.contains("90.00%"));
    }
}
