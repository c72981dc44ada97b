//! Page cache - the single gateway between operators and table storage.
//!
//! The [`PageCache`] provides:
//! - Fetch-or-load access to heap pages by [`PageId`]
//! - A capacity bound with least-recently-touched eviction
//! - Dirty tracking with explicit flush and write-back on eviction
//! - Tuple insert/delete pass-throughs that route to the owning table

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use crate::cache::CacheStats;
use crate::catalog::Catalog;
use crate::common::config::DEFAULT_CACHE_CAPACITY;
use crate::common::{AccessMode, Error, PageId, Result, TableId, TransactionId};
use crate::storage::HeapPage;
use crate::tuple::Tuple;

/// Shared handle to a resident page.
///
/// Readers take the read half, mutators take the write half and mark the
/// page dirty before releasing it. Handles stay usable after eviction, but
/// an evicted page is no longer the copy the cache serves, so callers
/// should re-fetch rather than hold handles across unrelated operations.
pub type PageHandle = Arc<RwLock<HeapPage>>;

/// Fixed-capacity cache of heap pages, keyed by page identity.
///
/// # Architecture
/// ```text
/// ┌───────────────────────────────────────────────────────────┐
/// │                        PageCache                          │
/// │  ┌────────────────────────┐  ┌─────────────────────────┐  │
/// │  │ entries                │  │ recency                 │  │
/// │  │ PageId → (page, stamp) │  │ VecDeque<(PageId,stamp)>│  │
/// │  └────────────────────────┘  └─────────────────────────┘  │
/// │          │ miss / flush                ▲ touch            │
/// │          ▼                             │                  │
/// │  ┌────────────────────────┐  ┌─────────────────────────┐  │
/// │  │ catalog: Arc<Catalog>  │  │ stats: CacheStats       │  │
/// │  │ (routes to HeapFiles)  │  │ (atomics, no lock)      │  │
/// │  └────────────────────────┘  └─────────────────────────┘  │
/// └───────────────────────────────────────────────────────────┘
/// ```
///
/// # Eviction
/// The victim is always the resident page whose last touch (hit or insert)
/// is oldest, with ties impossible because touches are totally ordered by
/// stamp. Each touch pushes a `(page, stamp)` record onto the back of the
/// recency queue and refreshes the entry's stamp; eviction pops from the
/// front, skipping records whose stamp no longer matches the entry (the
/// page was touched again later, or discarded). Every queue record is
/// popped at most once, so the skipping is O(1) amortized.
///
/// # Thread Safety
/// - `entries` + `recency`: one `Mutex`, held for the whole of each cache
///   operation so eviction always sees a consistent resident set
/// - page contents: per-page `RwLock` inside the [`PageHandle`]
/// - `stats`: atomic counters, no lock
///
/// Lock order is cache mutex, then page lock, then the heap file mutex;
/// nothing acquires them in the other direction.
pub struct PageCache {
    /// Maximum number of resident pages (immutable after construction).
    capacity: usize,

    /// Resolves a page's table id to the heap file that stores it.
    catalog: Arc<Catalog>,

    /// Resident set and recency state.
    inner: Mutex<CacheInner>,

    /// Hit/miss/eviction counters.
    stats: CacheStats,
}

struct CacheInner {
    entries: HashMap<PageId, CachedPage>,
    recency: VecDeque<(PageId, u64)>,
    next_stamp: u64,
}

struct CachedPage {
    page: PageHandle,
    /// Stamp of the latest touch; older queue records for this page are
    /// stale and get skipped at eviction time.
    stamp: u64,
}

impl CacheInner {
    /// Make `pid` the most recently touched entry.
    fn touch(&mut self, pid: PageId) {
        let stamp = self.next_stamp;
        self.next_stamp += 1;
        if let Some(entry) = self.entries.get_mut(&pid) {
            entry.stamp = stamp;
        }
        self.recency.push_back((pid, stamp));
    }
}

impl PageCache {
    /// Create a cache with the default capacity.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY, catalog)
    }

    /// Create a cache holding at most `capacity` pages.
    ///
    /// A capacity of zero is accepted but makes every fetch fail with
    /// `StorageExhausted`.
    pub fn with_capacity(capacity: usize, catalog: Arc<Catalog>) -> Self {
        Self {
            capacity,
            catalog,
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                recency: VecDeque::new(),
                next_stamp: 0,
            }),
            stats: CacheStats::new(),
        }
    }

    /// Maximum number of resident pages.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of pages currently resident.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counter access for callers and tests.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Return the resident page for `pid`, loading it from its table's
    /// heap file if absent.
    ///
    /// Loading at capacity evicts the least recently touched resident page
    /// first, writing it back if dirty. The access mode is a lock hook for
    /// callers that will mutate the page; this version only records it in
    /// trace output.
    ///
    /// # Errors
    /// - `NotFound` if the table is unknown or the page is past the end of
    ///   its file
    /// - `StorageExhausted` if eviction is needed but nothing is resident
    ///   (capacity zero)
    /// - `Io` if the page load or a dirty victim's write-back fails
    pub fn fetch(&self, pid: PageId, mode: AccessMode) -> Result<PageHandle> {
        let mut inner = self.inner.lock();

        if let Some(entry) = inner.entries.get(&pid) {
            let handle = Arc::clone(&entry.page);
            inner.touch(pid);
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            trace!(%pid, ?mode, "page cache hit");
            return Ok(handle);
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        let page = self.catalog.table(pid.table)?.read_page(pid)?;
        self.stats.pages_read.fetch_add(1, Ordering::Relaxed);

        if inner.entries.len() >= self.capacity {
            self.evict_one(&mut inner)?;
        }

        let handle: PageHandle = Arc::new(RwLock::new(page));
        inner.entries.insert(
            pid,
            CachedPage {
                page: Arc::clone(&handle),
                stamp: 0,
            },
        );
        inner.touch(pid);
        debug!(%pid, ?mode, "page cache miss");
        Ok(handle)
    }

    /// Write `pid`'s resident page back to its heap file and clear its
    /// dirty flag. A no-op if the page is not resident or not dirty.
    ///
    /// Holds the page's write lock while encoding, so a flush never
    /// interleaves with a tuple mutation of the same page.
    pub fn flush_page(&self, pid: PageId) -> Result<()> {
        let inner = self.inner.lock();
        let Some(entry) = inner.entries.get(&pid) else {
            return Ok(());
        };

        let mut page = entry.page.write();
        if page.is_dirty() {
            self.catalog.table(pid.table)?.write_page(&page)?;
            page.clear_dirty();
            self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
            debug!(%pid, "flushed page");
        }
        Ok(())
    }

    /// Write back every resident dirty page, leaving clean pages untouched.
    pub fn flush_all(&self) -> Result<()> {
        let inner = self.inner.lock();
        for (pid, entry) in &inner.entries {
            let mut page = entry.page.write();
            if page.is_dirty() {
                self.catalog.table(pid.table)?.write_page(&page)?;
                page.clear_dirty();
                self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
                debug!(%pid, "flushed page");
            }
        }
        Ok(())
    }

    /// Drop `pid` from the cache without writing it back, losing any
    /// unflushed changes. A no-op if the page is not resident.
    pub fn discard(&self, pid: PageId) {
        let mut inner = self.inner.lock();
        if inner.entries.remove(&pid).is_some() {
            debug!(%pid, "discarded page");
        }
        // The queue record left behind is skipped at eviction time.
    }

    /// Insert `tuple` into `table`, routing through the owning heap file.
    ///
    /// The mutated page is fetched through this cache and left resident
    /// and dirty.
    pub fn insert_tuple(&self, tx: TransactionId, table: TableId, tuple: Tuple) -> Result<()> {
        self.catalog.table(table)?.insert_tuple(tx, self, tuple)
    }

    /// Delete `tuple` from the table its record id names.
    ///
    /// # Errors
    /// `NotFound` if the tuple has no record id, the table is unknown, or
    /// the slot is no longer occupied.
    pub fn delete_tuple(&self, tx: TransactionId, tuple: &Tuple) -> Result<()> {
        let rid = tuple
            .rid()
            .ok_or_else(|| Error::not_found("tuple has no record id"))?;
        self.catalog.table(rid.page.table)?.delete_tuple(tx, self, tuple)
    }

    /// Evict the least recently touched resident page.
    ///
    /// A dirty victim is written back first; if the write-back fails the
    /// cache is left unchanged and the error propagates.
    fn evict_one(&self, inner: &mut CacheInner) -> Result<()> {
        loop {
            let (pid, stamp) = match inner.recency.front().copied() {
                Some(oldest) => oldest,
                None => {
                    return Err(Error::StorageExhausted(format!(
                        "page cache of capacity {} has nothing to evict",
                        self.capacity
                    )))
                }
            };

            let handle = match inner.entries.get(&pid) {
                Some(entry) if entry.stamp == stamp => Arc::clone(&entry.page),
                // Touched again later or discarded: stale record, skip it.
                _ => {
                    inner.recency.pop_front();
                    continue;
                }
            };

            {
                let page = handle.read();
                if page.is_dirty() {
                    self.catalog.table(pid.table)?.write_page(&page)?;
                    self.stats.pages_written.fetch_add(1, Ordering::Relaxed);
                }
            }

            inner.recency.pop_front();
            inner.entries.remove(&pid);
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(%pid, "evicted page");
            return Ok(());
        }
    }
}
