//! Shared database context.
//!
//! A [`Database`] ties one [`Catalog`] to one [`PageCache`] so callers and
//! tests can stand up fully isolated engine instances side by side instead
//! of sharing process-wide state.

use std::path::Path;
use std::sync::Arc;

use crate::cache::PageCache;
use crate::catalog::Catalog;
use crate::common::config::DEFAULT_CACHE_CAPACITY;
use crate::common::Result;

/// One engine instance: a catalog of open tables plus the page cache that
/// fronts their storage.
pub struct Database {
    catalog: Arc<Catalog>,
    cache: Arc<PageCache>,
}

impl Database {
    /// Create an empty instance with the default cache capacity.
    pub fn new() -> Self {
        Self::with_cache_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Create an empty instance whose cache holds at most `capacity` pages.
    pub fn with_cache_capacity(capacity: usize) -> Self {
        let catalog = Arc::new(Catalog::new());
        let cache = Arc::new(PageCache::with_capacity(capacity, Arc::clone(&catalog)));
        Self { catalog, cache }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn cache(&self) -> &Arc<PageCache> {
        &self.cache
    }

    /// Populate the catalog from a schema text file (see
    /// [`Catalog::load_schema`]).
    pub fn load_schema(&self, catalog_path: impl AsRef<Path>) -> Result<()> {
        self.catalog.load_schema(catalog_path)
    }

    /// Write every dirty cached page back to its table file.
    pub fn flush_all(&self) -> Result<()> {
        self.cache.flush_all()
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}
