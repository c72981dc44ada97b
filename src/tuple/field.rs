//! Typed field values and their fixed-length binary encoding.

use std::fmt;
use std::io;

use crate::common::config::STRING_FIELD_LEN;
use crate::common::Result;

/// The type of one field in a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// 64-bit signed integer, 8-byte little-endian encoding.
    Int,
    /// UTF-8 string, encoded as a 4-byte little-endian length followed by
    /// the bytes zero-padded to [`STRING_FIELD_LEN`].
    Str,
}

impl FieldType {
    /// Number of bytes a value of this type occupies inside a page.
    ///
    /// Fixed per type, never per value; this is what makes tuple images and
    /// page slot arithmetic constant-size.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        match self {
            FieldType::Int => 8,
            FieldType::Str => 4 + STRING_FIELD_LEN,
        }
    }

    /// Parse the catalog text spelling of a type.
    pub fn parse(s: &str) -> Option<FieldType> {
        match s {
            "int" => Some(FieldType::Int),
            "string" => Some(FieldType::Str),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Int => write!(f, "int"),
            FieldType::Str => write!(f, "string"),
        }
    }
}

/// A runtime field value.
///
/// The derived ordering (ints before strings, then natural order within a
/// variant) gives aggregation a total order over group keys; comparisons
/// across variants never arise in well-typed plans.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Int(i64),
    Str(String),
}

impl Field {
    /// The type of this value.
    #[inline]
    pub fn field_type(&self) -> FieldType {
        match self {
            Field::Int(_) => FieldType::Int,
            Field::Str(_) => FieldType::Str,
        }
    }

    /// Append this value's fixed-length encoding to `out`.
    ///
    /// String payloads longer than [`STRING_FIELD_LEN`] bytes are truncated
    /// at a character boundary so the image always decodes back to valid
    /// UTF-8.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Field::Int(v) => out.extend_from_slice(&v.to_le_bytes()),
            Field::Str(s) => {
                let mut end = s.len().min(STRING_FIELD_LEN);
                while !s.is_char_boundary(end) {
                    end -= 1;
                }
                let bytes = &s.as_bytes()[..end];
                out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                out.extend_from_slice(bytes);
                out.resize(out.len() + (STRING_FIELD_LEN - bytes.len()), 0);
            }
        }
    }

    /// Decode one value of type `ty` from the front of `input`, advancing it
    /// past the fixed-length image.
    pub fn decode(ty: FieldType, input: &mut &[u8]) -> Result<Field> {
        let len = ty.encoded_len();
        if input.len() < len {
            return Err(truncated(ty).into());
        }
        let (image, rest) = input.split_at(len);
        *input = rest;
        match ty {
            FieldType::Int => {
                let raw: [u8; 8] = image.try_into().map_err(|_| truncated(ty))?;
                Ok(Field::Int(i64::from_le_bytes(raw)))
            }
            FieldType::Str => {
                let raw: [u8; 4] = image[..4].try_into().map_err(|_| truncated(ty))?;
                let n = u32::from_le_bytes(raw) as usize;
                if n > STRING_FIELD_LEN {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("string field claims {} bytes, max is {}", n, STRING_FIELD_LEN),
                    )
                    .into());
                }
                let s = std::str::from_utf8(&image[4..4 + n]).map_err(|e| {
                    io::Error::new(io::ErrorKind::InvalidData, format!("string field: {}", e))
                })?;
                Ok(Field::Str(s.to_owned()))
            }
        }
    }
}

fn truncated(ty: FieldType) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("truncated {} field image", ty),
    )
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::Str(s) => write!(f, "{}", s),
        }
    }
}
