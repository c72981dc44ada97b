//! Process-wide configuration for minnowdb.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Default size of a page in bytes (4KB).
///
/// This value is chosen to match:
/// - OS page size on most systems (4096 bytes)
/// - Common database page sizes (PostgreSQL uses 8KB, but 4KB is also standard)
///
/// Every table file is a flat sequence of blocks of exactly this size, so the
/// page at number `n` lives at byte offset `n * page_size()`.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Default number of pages the cache holds before evicting.
pub const DEFAULT_CACHE_CAPACITY: usize = 50;

/// Fixed payload length of a string field, in bytes.
///
/// String fields are stored as a 4-byte little-endian length followed by the
/// UTF-8 bytes, zero-padded to this length, so every tuple image has a fixed
/// size regardless of its contents.
pub const STRING_FIELD_LEN: usize = 128;

static PAGE_SIZE: AtomicUsize = AtomicUsize::new(DEFAULT_PAGE_SIZE);

/// Current page size in bytes.
///
/// Reads a process-wide value so tests can shrink pages to force multi-page
/// tables without writing megabytes.
#[inline]
pub fn page_size() -> usize {
    PAGE_SIZE.load(Ordering::Relaxed)
}

/// Override the process-wide page size.
///
/// Intended for tests only. Changing this while any table file is open
/// invalidates page-count and offset assumptions for that file.
pub fn set_page_size(bytes: usize) {
    assert!(bytes > 0, "page size must be non-zero");
    PAGE_SIZE.store(bytes, Ordering::Relaxed);
}

/// Restore the default page size.
///
/// Intended for tests only, as the counterpart of [`set_page_size`].
pub fn reset_page_size() {
    PAGE_SIZE.store(DEFAULT_PAGE_SIZE, Ordering::Relaxed);
}
