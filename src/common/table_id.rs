//! Table identifier type.

use std::fmt;

/// Identifies one table, and therefore one heap file.
///
/// The id is derived deterministically from the table file's canonical path
/// (CRC32 of the path bytes), so the same storage location always maps to
/// the same id across runs. Derivation happens where the file is opened; this
/// type is just the stable integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub u32);

impl TableId {
    /// Create a new TableId.
    #[inline]
    pub fn new(id: u32) -> Self {
        TableId(id)
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Table({})", self.0)
    }
}
