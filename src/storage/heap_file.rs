//! Heap files - one table's on-disk representation.
//!
//! A [`HeapFile`] owns the backing file of a single table and moves whole
//! pages between disk and memory. It deliberately knows nothing about
//! caching: the page cache calls [`HeapFile::read_page`] on a miss and
//! [`HeapFile::write_page`] on flush, while the tuple-level entry points
//! ([`HeapFile::insert_tuple`], [`HeapFile::delete_tuple`], scanning) go the
//! other way and reach every page *through* the cache.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::PageCache;
use crate::common::config::page_size;
use crate::common::{AccessMode, Error, PageId, Result, TableId, TransactionId};
use crate::storage::HeapPage;
use crate::tuple::{Schema, Tuple};

/// One table as a flat sequence of fixed-size pages.
///
/// # File Layout
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │   ...   │ Page N-1│
/// └─────────┴─────────┴─────────┴─────────┘
/// Offset:  0   P×1       ...      P×(N-1)
/// ```
/// where `P` is the page size captured when the file was opened. The file
/// only ever grows, one page at a time, and `N = file length / P`.
///
/// # Thread Safety
/// The raw file handle sits behind a mutex so page reads and writes are
/// serialized per table. Tuple-level callers additionally hold the page's
/// write lock (via the cache) around mutations.
pub struct HeapFile {
    path: PathBuf,
    table_id: TableId,
    schema: Arc<Schema>,
    page_len: usize,
    file: Mutex<File>,
}

impl HeapFile {
    /// Open the table file at `path`, creating it empty if missing.
    ///
    /// The table id is the CRC32 of the canonical path, so reopening the
    /// same location always yields the same id.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or opened.
    pub fn open<P: AsRef<Path>>(path: P, schema: Arc<Schema>) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let path = path.as_ref().canonicalize()?;
        let table_id = TableId::new(crc32fast::hash(path.to_string_lossy().as_bytes()));

        Ok(Self {
            path,
            table_id,
            schema,
            page_len: page_size(),
            file: Mutex::new(file),
        })
    }

    #[inline]
    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    #[inline]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of pages currently in the file.
    pub fn num_pages(&self) -> Result<u32> {
        let len = self.file.lock().metadata()?.len();
        Ok((len / self.page_len as u64) as u32)
    }

    /// Read and decode the page at `pid`'s offset.
    ///
    /// Does not go through the cache.
    ///
    /// # Errors
    /// `NotFound` if `pid` names another table or a page number at or past
    /// the end of the file; `Io` if the read or decode fails.
    pub fn read_page(&self, pid: PageId) -> Result<HeapPage> {
        if pid.table != self.table_id {
            return Err(Error::not_found(format!("{} is not in {}", pid, self.table_id)));
        }

        let mut file = self.file.lock();
        let len = file.metadata()?.len();
        let offset = (pid.page_no as u64) * (self.page_len as u64);
        if offset + self.page_len as u64 > len {
            return Err(Error::not_found(format!(
                "{} past end of file ({} pages)",
                pid,
                len / self.page_len as u64
            )));
        }

        file.seek(SeekFrom::Start(offset))?;
        let mut block = vec![0u8; self.page_len];
        file.read_exact(&mut block)?;
        drop(file);

        HeapPage::decode(pid, Arc::clone(&self.schema), &block)
    }

    /// Encode `page` and write it at its page-number offset, extending the
    /// file when the page number is the current page count.
    ///
    /// # Durability
    /// Follows the write with `fsync()`.
    ///
    /// # Errors
    /// `NotFound` if the page belongs to another table or would leave a hole
    /// past the end of the file.
    pub fn write_page(&self, page: &HeapPage) -> Result<()> {
        let pid = page.pid();
        if pid.table != self.table_id {
            return Err(Error::not_found(format!("{} is not in {}", pid, self.table_id)));
        }

        let mut file = self.file.lock();
        let len = file.metadata()?.len();
        let offset = (pid.page_no as u64) * (self.page_len as u64);
        if offset > len {
            return Err(Error::not_found(format!(
                "{} would leave a hole ({} pages on disk)",
                pid,
                len / self.page_len as u64
            )));
        }

        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&page.encode())?;
        file.sync_all()?;

        Ok(())
    }

    /// Insert a tuple into the first page with a free slot, appending a
    /// fresh page to the file when every existing page is full.
    ///
    /// Pages are reached through `cache`; the mutated page is marked dirty
    /// with `tx` and stays in memory until flushed or evicted.
    pub fn insert_tuple(&self, tx: TransactionId, cache: &PageCache, tuple: Tuple) -> Result<()> {
        let pages = self.num_pages()?;
        for page_no in 0..pages {
            let pid = PageId::new(self.table_id, page_no);
            let handle = cache.fetch(pid, AccessMode::ReadWrite)?;
            let mut page = handle.write();
            if page.has_free_slot() {
                page.insert(tuple)?;
                page.mark_dirty(tx);
                return Ok(());
            }
        }

        // Every page is full: extend the file with an empty page, then pull
        // it back through the cache so the insert lands on the shared copy.
        let pid = PageId::new(self.table_id, pages);
        self.write_page(&HeapPage::empty(pid, Arc::clone(&self.schema), self.page_len))?;
        debug!(%pid, "appended page");

        let handle = cache.fetch(pid, AccessMode::ReadWrite)?;
        let mut page = handle.write();
        page.insert(tuple)?;
        page.mark_dirty(tx);
        Ok(())
    }

    /// Delete a tuple using its record id to find the owning page.
    ///
    /// # Errors
    /// `NotFound` if the tuple carries no record id, names another table, or
    /// its slot is no longer occupied.
    pub fn delete_tuple(&self, tx: TransactionId, cache: &PageCache, tuple: &Tuple) -> Result<()> {
        let rid = tuple
            .rid()
            .ok_or_else(|| Error::not_found("tuple has no record id".to_string()))?;
        if rid.page.table != self.table_id {
            return Err(Error::not_found(format!("{} is not in {}", rid, self.table_id)));
        }

        let handle = cache.fetch(rid.page, AccessMode::ReadWrite)?;
        let mut page = handle.write();
        page.delete(rid)?;
        page.mark_dirty(tx);
        Ok(())
    }

    /// A scan cursor over this table, initially closed.
    pub fn scan(self: &Arc<Self>, cache: Arc<PageCache>) -> HeapScan {
        HeapScan {
            file: Arc::clone(self),
            cache,
            opened: false,
            page_no: 0,
            tuples: Vec::new(),
            pos: 0,
        }
    }
}

/// Forward-only tuple cursor over one heap file.
///
/// Holds its whole position explicitly: the current page number, a snapshot
/// of that page's live tuples, and an index into the snapshot. Pages are
/// fetched through the cache one at a time, only when the previous page is
/// exhausted, so concurrent scans of the same table share cached pages.
pub struct HeapScan {
    file: Arc<HeapFile>,
    cache: Arc<PageCache>,
    opened: bool,
    page_no: u32,
    tuples: Vec<Tuple>,
    pos: usize,
}

impl HeapScan {
    /// Start the scan at page 0. A no-op if already open.
    pub fn open(&mut self) -> Result<()> {
        if self.opened {
            return Ok(());
        }
        self.opened = true;
        self.restart()
    }

    /// Whether another tuple is available, advancing across page boundaries
    /// as needed.
    pub fn has_next(&mut self) -> Result<bool> {
        self.check_open()?;
        while self.pos >= self.tuples.len() {
            if self.page_no + 1 >= self.file.num_pages()? {
                return Ok(false);
            }
            self.page_no += 1;
            self.load_current_page()?;
        }
        Ok(true)
    }

    /// The next tuple.
    ///
    /// # Errors
    /// `NotFound` once the table is exhausted.
    pub fn next(&mut self) -> Result<Tuple> {
        if !self.has_next()? {
            return Err(Error::not_found(format!(
                "scan of {} exhausted",
                self.file.table_id()
            )));
        }
        let tuple = self.tuples[self.pos].clone();
        self.pos += 1;
        Ok(tuple)
    }

    /// Reset to page 0, re-fetching it through the cache.
    pub fn rewind(&mut self) -> Result<()> {
        self.check_open()?;
        self.restart()
    }

    /// Drop the cursor state and leave the open state.
    pub fn close(&mut self) {
        self.opened = false;
        self.tuples = Vec::new();
        self.pos = 0;
        self.page_no = 0;
    }

    /// Schema of the tuples this scan produces (the table's own schema).
    pub fn schema(&self) -> &Arc<Schema> {
        self.file.schema()
    }

    fn check_open(&self) -> Result<()> {
        if self.opened {
            Ok(())
        } else {
            Err(Error::invalid_state(format!(
                "scan of {} is not open",
                self.file.table_id()
            )))
        }
    }

    fn restart(&mut self) -> Result<()> {
        self.page_no = 0;
        self.pos = 0;
        if self.file.num_pages()? == 0 {
            self.tuples = Vec::new();
            return Ok(());
        }
        self.load_current_page()
    }

    fn load_current_page(&mut self) -> Result<()> {
        let pid = PageId::new(self.file.table_id(), self.page_no);
        let handle = self.cache.fetch(pid, AccessMode::ReadOnly)?;
        self.tuples = handle.read().live_tuples();
        self.pos = 0;
        Ok(())
    }
}
