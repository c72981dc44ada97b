//! minnowdb - the storage and execution core of a single-node relational database.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           minnowdb                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Execution Layer (exec/)                     │   │
//! │  │     SeqScan │ Insert │ Delete │ Aggregate operators      │   │
//! │  │          (pull-based open/next/rewind/close)             │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │               Page Cache (cache/)                        │   │
//! │  │    Fixed capacity │ LRU eviction │ dirty write-back      │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │             Storage Layer (storage/)                     │   │
//! │  │        HeapFile + slotted HeapPage + HeapScan            │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                                                                 │
//! │  catalog (table registry)      histogram (selectivity stats)    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, TableId, Error, config)
//! - [`tuple`] - Fields, schemas, tuples, and record ids
//! - [`storage`] - Heap files and the slotted page format
//! - [`cache`] - Fixed-capacity page cache with LRU eviction
//! - [`catalog`] - Table registry and schema-file loading
//! - [`exec`] - Pull-based query operators
//! - [`histogram`] - Equal-population histograms for selectivity estimation
//! - [`db`] - Top-level handle wiring catalog and cache together
//!
//! # Quick Start
//! ```no_run
//! use minnowdb::db::Database;
//! use minnowdb::exec::{Operator, SeqScan};
//!
//! // Open a database and register tables from a schema file.
//! let db = Database::new();
//! db.catalog().load_schema("schema.txt").unwrap();
//!
//! // Scan a table through the page cache.
//! let users = db.catalog().table_id("users").unwrap();
//! let mut scan = SeqScan::new(&db, users, "u").unwrap();
//! scan.open().unwrap();
//! while scan.has_next().unwrap() {
//!     println!("{}", scan.next().unwrap());
//! }
//! scan.close();
//! ```

// Core modules
pub mod cache;
pub mod catalog;
pub mod common;
pub mod db;
pub mod exec;
pub mod histogram;
pub mod storage;
pub mod tuple;

// Re-export commonly used items at crate root for convenience
pub use common::config::{page_size, DEFAULT_CACHE_CAPACITY, DEFAULT_PAGE_SIZE};
pub use common::{AccessMode, Error, PageId, Result, TableId, TransactionId};

pub use cache::{CacheStats, PageCache, PageHandle, StatsSnapshot};
pub use catalog::Catalog;
pub use db::Database;
pub use exec::{Aggregate, AggregateOp, Delete, Insert, Operator, SeqScan};
pub use histogram::{CmpOp, IntHistogram};
pub use storage::{HeapFile, HeapPage, HeapScan};
pub use tuple::{Field, FieldDef, FieldType, RecordId, Schema, Tuple};
