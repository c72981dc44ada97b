//! Tuple schemas.

use std::fmt;

use crate::tuple::FieldType;

/// One field descriptor: a type plus an optional name.
///
/// Names are optional because some tuples are synthetic (operator summary
/// rows) and never referenced by name.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub ty: FieldType,
    pub name: Option<String>,
}

impl FieldDef {
    pub fn named(ty: FieldType, name: impl Into<String>) -> Self {
        FieldDef {
            ty,
            name: Some(name.into()),
        }
    }

    pub fn unnamed(ty: FieldType) -> Self {
        FieldDef { ty, name: None }
    }
}

/// An ordered list of field descriptors describing a tuple's shape.
///
/// Equality is positional and considers field *types only* — two schemas
/// with the same types in the same order are equal even if every name
/// differs. That is what lets an operator's output (whose names may be
/// alias-qualified or synthetic) feed a table expecting the same shape.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldDef>,
}

impl Schema {
    pub fn new(fields: Vec<FieldDef>) -> Self {
        Schema { fields }
    }

    /// Schema with the given types and no names, mostly for tests and
    /// synthetic rows.
    pub fn unnamed(types: Vec<FieldType>) -> Self {
        Schema {
            fields: types.into_iter().map(FieldDef::unnamed).collect(),
        }
    }

    /// Number of fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// All field descriptors in order.
    #[inline]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Type of field `i`, if it exists.
    pub fn field_type(&self, i: usize) -> Option<FieldType> {
        self.fields.get(i).map(|f| f.ty)
    }

    /// Name of field `i`, if the field exists and is named.
    pub fn field_name(&self, i: usize) -> Option<&str> {
        self.fields.get(i).and_then(|f| f.name.as_deref())
    }

    /// Index of the first field with the given name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.name.as_deref() == Some(name))
    }

    /// Total encoded length of one tuple of this schema, in bytes.
    pub fn byte_len(&self) -> usize {
        self.fields.iter().map(|f| f.ty.encoded_len()).sum()
    }

    /// Copy of this schema with every field name qualified as
    /// `alias.name`. Unnamed fields stay unnamed.
    pub fn qualified(&self, alias: &str) -> Schema {
        Schema {
            fields: self
                .fields
                .iter()
                .map(|f| FieldDef {
                    ty: f.ty,
                    name: f.name.as_ref().map(|n| format!("{}.{}", alias, n)),
                })
                .collect(),
        }
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.ty == b.ty)
    }
}

impl Eq for Schema {}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match &field.name {
                Some(n) => write!(f, "{} {}", n, field.ty)?,
                None => write!(f, "{}", field.ty)?,
            }
        }
        write!(f, ")")
    }
}
