//! Storage layer - heap files and the page format.
//!
//! This module handles persistent storage:
//! - [`HeapFile`] - one table's file, read and written a page at a time
//! - [`HeapPage`] - the decoded slotted page
//! - [`HeapScan`] - forward-only tuple cursor over one table

mod heap_file;
mod heap_page;

pub use heap_file::{HeapFile, HeapScan};
pub use heap_page::{slots_per_page, HeapPage};
