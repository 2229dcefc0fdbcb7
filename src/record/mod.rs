//! Record Module
//!
//! Typed field values and their fixed-width encoding.
//!
//! ## Entry Format
//! ```text
//! ┌──────────────┬────────────────────────────┬─────┐
//! │ int32 (4 BE) │ string (256, NUL padded)   │ ... │
//! └──────────────┴────────────────────────────┴─────┘
//! ```
//! Fields appear in schema order; an entry is exactly `entry_size` bytes.

mod codec;

use std::fmt;
use std::num::IntErrorKind;

use crate::error::{HeapError, Result};
use crate::schema::{FieldDef, FieldType};

pub use codec::{decode, encode};

/// A single field value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Int32(i32),
    Text(String),
}

impl Value {
    /// Convert a textual token into a value of the field's type
    ///
    /// Integers outside the 32-bit range fail with `FieldOverflow`; text
    /// that is not an integer at all fails with `TypeMismatch`.
    pub fn parse(field: &FieldDef, token: &str) -> Result<Value> {
        match field.field_type {
            FieldType::Int32 => token.trim().parse::<i32>().map(Value::Int32).map_err(|e| {
                match e.kind() {
                    IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                        HeapError::FieldOverflow {
                            field: field.name.clone(),
                            value: token.to_string(),
                        }
                    }
                    _ => HeapError::TypeMismatch {
                        field: field.name.clone(),
                        expected: FieldType::Int32.to_string(),
                    },
                }
            }),
            FieldType::Text => Ok(Value::Text(token.to_string())),
        }
    }

    /// The type this value encodes as
    pub fn field_type(&self) -> FieldType {
        match self {
            Value::Int32(_) => FieldType::Int32,
            Value::Text(_) => FieldType::Text,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Int32(_) => None,
            Value::Text(s) => Some(s),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int32(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int32(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One decoded row, fields in schema order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub values: Vec<Value>,
}

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Parse one token per field according to the schema
    pub fn from_tokens(fields: &[FieldDef], tokens: &[&str]) -> Result<Self> {
        if tokens.len() != fields.len() {
            return Err(HeapError::ArityMismatch {
                expected: fields.len(),
                actual: tokens.len(),
            });
        }

        let values = fields
            .iter()
            .zip(tokens)
            .map(|(field, token)| Value::parse(field, token))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { values })
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Field values joined by single spaces
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", value)?;
        }
        Ok(())
    }
}
