//! Transaction stubs.
//!
//! There is no transaction manager in this engine. These types exist so the
//! mutation path can record who last dirtied a page and so `fetch` carries a
//! declared access intent, which is where a future lock manager would hook
//! in. Nothing enforces anything yet.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TX_ID: AtomicU64 = AtomicU64::new(0);

/// Opaque identifier for one logical transaction.
///
/// Ids are unique within a process (monotonic counter) and carry no ordering
/// meaning beyond that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Allocate a fresh id.
    pub fn new() -> Self {
        TransactionId(NEXT_TX_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    #[inline]
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tx({})", self.0)
    }
}

/// Declared intent of a page fetch.
///
/// Currently informational only; a lock manager would translate this into a
/// shared or exclusive page lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}
