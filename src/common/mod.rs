//! Common types and utilities shared across minnowdb.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration (page size, cache capacity)
//! - Error types
//! - Identifiers (TableId, PageId)
//! - Transaction stubs (TransactionId, AccessMode)

pub mod config;
pub mod error;
mod page_id;
mod table_id;
mod tx;

pub use error::{Error, Result};
pub use page_id::PageId;
pub use table_id::TableId;
pub use tx::{AccessMode, TransactionId};
