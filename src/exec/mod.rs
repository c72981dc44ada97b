//! Query execution - pull-based operator trees.
//!
//! Operators speak a uniform open/next protocol and compose into trees that
//! are pulled from the root:
//! - [`SeqScan`] - full-table scan with alias-qualified field names
//! - [`Insert`] - drains its child into a table, yields one count tuple
//! - [`Delete`] - drains its child, removing each tuple from its table
//! - [`Aggregate`] - grouped aggregation over its child
//!
//! # State machine
//! ```text
//!           open()                exhausted
//! Closed ──────────▶ Open ◀─────────────────┐
//!    ▲                │  next() ── tuple ───┘
//!    │                │  rewind() back to the first tuple
//!    └─── close() ────┘
//! ```
//! Calling `has_next`/`next`/`rewind` while Closed fails with
//! `InvalidState`; `next` past the last tuple fails with `NotFound`.

mod aggregate;
mod delete;
mod insert;
mod seq_scan;

pub use aggregate::{Aggregate, AggregateOp};
pub use delete::Delete;
pub use insert::Insert;
pub use seq_scan::SeqScan;

use std::sync::Arc;

use crate::common::Result;
use crate::tuple::{Schema, Tuple};

/// The iterator protocol every operator implements.
///
/// Child operators are owned by their parent as plain typed fields, so a
/// whole tree opens, rewinds, and closes through these five methods.
pub trait Operator {
    /// Transition Closed to Open. A no-op when already open.
    ///
    /// Aggregation drains its entire child here; scans stay lazy and read
    /// pages only as iteration reaches them.
    fn open(&mut self) -> Result<()>;

    /// Whether `next` would produce another tuple.
    fn has_next(&mut self) -> Result<bool>;

    /// The next output tuple.
    fn next(&mut self) -> Result<Tuple>;

    /// Reset an open operator back to its first output tuple.
    fn rewind(&mut self) -> Result<()>;

    /// Transition to Closed, propagating to any child.
    fn close(&mut self);

    /// Schema of the tuples this operator produces.
    fn schema(&self) -> &Arc<Schema>;
}
