//! Record codec
//!
//! Schema-driven conversion between values and fixed-width entries.
//!
//! Strings are stored NUL padded and decoded by stripping trailing NUL
//! bytes. A string that itself ends in NUL therefore loses those bytes on
//! the way back; NULs elsewhere in the string survive.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{HeapError, Result};
use crate::schema::{FieldType, TableSchema, STRING_FIELD_WIDTH};

use super::{Record, Value};

/// Encode values into exactly `schema.entry_size()` bytes
///
/// Every check happens before the first byte is produced, so a failed
/// encode never leaves a partial entry behind.
pub fn encode(schema: &TableSchema, values: &[Value]) -> Result<Vec<u8>> {
    if values.len() != schema.field_count() {
        return Err(HeapError::ArityMismatch {
            expected: schema.field_count(),
            actual: values.len(),
        });
    }

    for (field, value) in schema.fields().iter().zip(values) {
        if value.field_type() != field.field_type {
            return Err(HeapError::TypeMismatch {
                field: field.name.clone(),
                expected: field.field_type.to_string(),
            });
        }
        if let Value::Text(s) = value {
            if s.len() > STRING_FIELD_WIDTH {
                return Err(HeapError::FieldTooLong {
                    field: field.name.clone(),
                    len: s.len(),
                    max: STRING_FIELD_WIDTH,
                });
            }
        }
    }

    let mut buf = BytesMut::with_capacity(schema.entry_size());
    for value in values {
        match value {
            Value::Int32(v) => buf.put_i32(*v),
            Value::Text(s) => {
                buf.put_slice(s.as_bytes());
                buf.put_bytes(0, STRING_FIELD_WIDTH - s.len());
            }
        }
    }

    debug_assert_eq!(buf.len(), schema.entry_size());
    Ok(buf.to_vec())
}

/// Decode an entry produced by `encode`
pub fn decode(schema: &TableSchema, mut bytes: &[u8]) -> Result<Record> {
    if bytes.len() != schema.entry_size() {
        return Err(HeapError::Corrupted(format!(
            "entry for '{}' is {} bytes, expected {}",
            schema.name(),
            bytes.len(),
            schema.entry_size()
        )));
    }

    let mut values = Vec::with_capacity(schema.field_count());
    for field in schema.fields() {
        match field.field_type {
            FieldType::Int32 => values.push(Value::Int32(bytes.get_i32())),
            FieldType::Text => {
                let raw = &bytes[..STRING_FIELD_WIDTH];
                let end = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
                let text = String::from_utf8(raw[..end].to_vec()).map_err(|_| {
                    HeapError::Corrupted(format!(
                        "field '{}' of '{}' is not valid UTF-8",
                        field.name,
                        schema.name()
                    ))
                })?;
                values.push(Value::Text(text));
                bytes.advance(STRING_FIELD_WIDTH);
            }
        }
    }

    Ok(Record::new(values))
}
