//! Tuples, fields, and schemas.
//!
//! The value layer the rest of the engine moves around:
//! - [`Field`] / [`FieldType`] - typed values with fixed-length encodings
//! - [`Schema`] / [`FieldDef`] - ordered field descriptors
//! - [`Tuple`] / [`RecordId`] - rows and their storage back-references

mod field;
mod schema;
#[allow(clippy::module_inception)]
mod tuple;

pub use field::{Field, FieldType};
pub use schema::{FieldDef, Schema};
pub use tuple::{RecordId, Tuple};
