//! Page identifier type.

use std::fmt;

use crate::common::TableId;

/// Identifies a page uniquely across the whole engine.
///
/// A page belongs to exactly one table's file and sits at byte offset
/// `page_no × page_size()` within it. Two `PageId`s are equal exactly when
/// both the table and the page number match, which makes this the key type
/// for the page cache.
///
/// # Example
/// ```
/// use minnowdb::common::{PageId, TableId};
///
/// let pid = PageId::new(TableId::new(7), 3);
/// assert_eq!(pid.table, TableId::new(7));
/// assert_eq!(pid.page_no, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    /// Owning table.
    pub table: TableId,
    /// Zero-based page number within the table's file.
    pub page_no: u32,
}

impl PageId {
    /// Create a new PageId.
    #[inline]
    pub fn new(table: TableId, page_no: u32) -> Self {
        PageId { table, page_no }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page({}:{})", self.table.0, self.page_no)
    }
}
