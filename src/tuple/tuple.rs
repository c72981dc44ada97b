//! Tuples and their storage back-references.

use std::fmt;
use std::sync::Arc;

use crate::common::{Error, PageId, Result};
use crate::tuple::{Field, Schema};

/// Location of a stored tuple: which page, which slot.
///
/// Stamped on a tuple when it is inserted and consumed by delete to find the
/// owning page again. A tuple freshly built in memory has no record id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId {
    pub page: PageId,
    pub slot: usize,
}

impl RecordId {
    pub fn new(page: PageId, slot: usize) -> Self {
        RecordId { page, slot }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.page, self.slot)
    }
}

/// An ordered, fixed-arity sequence of field values matching a schema.
///
/// Tuples handed out by iterators are detached values: mutating or dropping
/// them has no effect on stored data. The optional [`RecordId`] ties a tuple
/// back to the page slot it was read from or inserted into.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    schema: Arc<Schema>,
    fields: Vec<Field>,
    rid: Option<RecordId>,
}

impl Tuple {
    /// Build a tuple, checking arity and per-position field types against
    /// the schema.
    pub fn new(schema: Arc<Schema>, fields: Vec<Field>) -> Result<Self> {
        if fields.len() != schema.len() {
            return Err(Error::invalid_state(format!(
                "tuple has {} fields, schema {} expects {}",
                fields.len(),
                schema,
                schema.len()
            )));
        }
        for (i, field) in fields.iter().enumerate() {
            let expected = schema.field_type(i).unwrap_or(field.field_type());
            if field.field_type() != expected {
                return Err(Error::invalid_state(format!(
                    "field {} is {} but schema {} expects {}",
                    i,
                    field.field_type(),
                    schema,
                    expected
                )));
            }
        }
        Ok(Tuple {
            schema,
            fields,
            rid: None,
        })
    }

    #[inline]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    #[inline]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Field at position `i`, if it exists.
    pub fn field(&self, i: usize) -> Option<&Field> {
        self.fields.get(i)
    }

    #[inline]
    pub fn rid(&self) -> Option<RecordId> {
        self.rid
    }

    pub fn set_rid(&mut self, rid: Option<RecordId>) {
        self.rid = rid;
    }

    /// Append this tuple's fixed-length encoding (all fields in order) to
    /// `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        for field in &self.fields {
            field.encode_into(out);
        }
    }

    /// Decode one tuple of `schema` from the front of `input`, advancing it.
    pub fn decode(schema: &Arc<Schema>, input: &mut &[u8]) -> Result<Tuple> {
        let mut fields = Vec::with_capacity(schema.len());
        for def in schema.fields() {
            fields.push(Field::decode(def.ty, input)?);
        }
        Ok(Tuple {
            schema: Arc::clone(schema),
            fields,
            rid: None,
        })
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, "\t")?;
            }
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}
