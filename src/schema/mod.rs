//! Schema Module
//!
//! Table schemas, their validation rules, and the registry that stores them.
//!
//! ## Responsibilities
//! - Describe the ordered, typed field list of a table
//! - Derive fixed sizes (entry size, page size) from the field list
//! - Validate new table definitions before anything is persisted
//! - Persist schemas by table name (see `registry` and `catalog`)

mod catalog;
mod registry;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HeapError, Result};
use crate::storage::{PAGE_HEADER_SIZE, PAGE_SLOTS};

pub use catalog::FileCatalog;
pub use registry::{CatalogEntry, MemoryRegistry, SchemaRegistry};

// =============================================================================
// Limits
// =============================================================================

/// Maximum number of fields in a table
pub const MAX_FIELDS: usize = 12;

/// Maximum table name length (bytes)
pub const MAX_TABLE_NAME_LEN: usize = 12;

/// Maximum field name length (bytes)
pub const MAX_FIELD_NAME_LEN: usize = 20;

/// Encoded width of an `int32` field
pub const INT_FIELD_WIDTH: usize = 4;

/// Encoded width of a `string` field
pub const STRING_FIELD_WIDTH: usize = 256;

// =============================================================================
// Field Types
// =============================================================================

/// Supported field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// 4-byte big-endian signed integer
    Int32,
    /// 256-byte null-padded UTF-8 string
    Text,
}

impl FieldType {
    /// Fixed encoded width in bytes
    pub fn width(&self) -> usize {
        match self {
            FieldType::Int32 => INT_FIELD_WIDTH,
            FieldType::Text => STRING_FIELD_WIDTH,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Int32 => write!(f, "int"),
            FieldType::Text => write!(f, "str"),
        }
    }
}

impl FromStr for FieldType {
    type Err = HeapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "int" => Ok(FieldType::Int32),
            "str" => Ok(FieldType::Text),
            other => Err(HeapError::SchemaValidation(format!(
                "unsupported field type '{}'",
                other
            ))),
        }
    }
}

/// A single named, typed field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

// =============================================================================
// Table Schema
// =============================================================================

/// A validated, immutable table schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    name: String,
    fields: Vec<FieldDef>,
    primary_key_index: usize,
}

impl TableSchema {
    /// Build a schema, enforcing every naming and shape rule
    pub fn new(
        name: impl Into<String>,
        fields: Vec<FieldDef>,
        primary_key_index: usize,
    ) -> Result<Self> {
        let name = name.into();
        validate_identifier("table", &name, MAX_TABLE_NAME_LEN)?;

        if fields.is_empty() || fields.len() > MAX_FIELDS {
            return Err(HeapError::SchemaValidation(format!(
                "field count must be between 1 and {}, got {}",
                MAX_FIELDS,
                fields.len()
            )));
        }

        if primary_key_index >= fields.len() {
            return Err(HeapError::SchemaValidation(format!(
                "primary key index {} out of range for {} fields",
                primary_key_index,
                fields.len()
            )));
        }

        let mut seen = HashSet::new();
        for field in &fields {
            validate_identifier("field", &field.name, MAX_FIELD_NAME_LEN)?;
            if !seen.insert(field.name.as_str()) {
                return Err(HeapError::SchemaValidation(format!(
                    "duplicate field name '{}'",
                    field.name
                )));
            }
        }

        Ok(Self {
            name,
            fields,
            primary_key_index,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn primary_key_index(&self) -> usize {
        self.primary_key_index
    }

    pub fn primary_key(&self) -> &FieldDef {
        &self.fields[self.primary_key_index]
    }

    /// Sum of field widths
    pub fn entry_size(&self) -> usize {
        self.fields.iter().map(|f| f.field_type.width()).sum()
    }

    /// Slot bitmap plus `PAGE_SLOTS` entries
    pub fn page_size(&self) -> usize {
        self.entry_size() * PAGE_SLOTS + PAGE_HEADER_SIZE
    }
}

/// Table and field names: ASCII alphanumeric, bounded, not purely numeric
fn validate_identifier(kind: &str, name: &str, max_len: usize) -> Result<()> {
    if name.is_empty() || name.len() > max_len {
        return Err(HeapError::SchemaValidation(format!(
            "{} name '{}' must be 1 to {} characters",
            kind, name, max_len
        )));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(HeapError::SchemaValidation(format!(
            "{} name '{}' must be alphanumeric",
            kind, name
        )));
    }
    if name.chars().all(|c| c.is_ascii_digit()) {
        return Err(HeapError::SchemaValidation(format!(
            "{} name '{}' must not be purely numeric",
            kind, name
        )));
    }
    Ok(())
}

// =============================================================================
// Table Definition
// =============================================================================

/// Unvalidated arguments of a table creation request
///
/// Mirrors the `create type` command: a declared field count, a 1-based
/// primary key position and `(name, type)` pairs as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub name: String,
    pub field_count: usize,
    pub primary_key_position: usize,
    pub fields: Vec<(String, String)>,
}

impl TableDefinition {
    /// Validate and convert into a schema
    pub fn into_schema(self) -> Result<TableSchema> {
        if self.field_count != self.fields.len() {
            return Err(HeapError::SchemaValidation(format!(
                "declared {} fields but {} were given",
                self.field_count,
                self.fields.len()
            )));
        }
        if self.primary_key_position == 0 || self.primary_key_position > self.field_count {
            return Err(HeapError::SchemaValidation(format!(
                "primary key position {} out of range 1..={}",
                self.primary_key_position, self.field_count
            )));
        }

        let fields = self
            .fields
            .into_iter()
            .map(|(name, type_name)| Ok(FieldDef::new(name, type_name.parse()?)))
            .collect::<Result<Vec<_>>>()?;

        TableSchema::new(self.name, fields, self.primary_key_position - 1)
    }
}
