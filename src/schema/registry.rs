//! Schema Registry
//!
//! The table name → catalog entry mapping consumed by the table engine.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{HeapError, Result};

use super::{FieldDef, TableSchema};

/// Persisted description of a table
///
/// Stores the derived sizes next to the fields so that a catalog written
/// with different sizing rules is detected on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub table: String,
    pub file_count: u32,
    pub field_count: usize,
    pub primary_key_index: usize,
    pub fields: Vec<FieldDef>,
    pub entry_size: usize,
    pub page_size: usize,
}

impl CatalogEntry {
    /// Entry for a freshly created table (one file)
    pub fn new(schema: &TableSchema) -> Self {
        Self {
            table: schema.name().to_string(),
            file_count: 1,
            field_count: schema.field_count(),
            primary_key_index: schema.primary_key_index(),
            fields: schema.fields().to_vec(),
            entry_size: schema.entry_size(),
            page_size: schema.page_size(),
        }
    }

    /// Rebuild and cross-check the schema
    pub fn schema(&self) -> Result<TableSchema> {
        if self.field_count != self.fields.len() {
            return Err(HeapError::Corrupted(format!(
                "catalog entry '{}' lists {} fields but field_count is {}",
                self.table,
                self.fields.len(),
                self.field_count
            )));
        }

        let schema = TableSchema::new(
            self.table.clone(),
            self.fields.clone(),
            self.primary_key_index,
        )
        .map_err(|e| HeapError::Corrupted(format!("catalog entry '{}': {}", self.table, e)))?;

        if schema.entry_size() != self.entry_size || schema.page_size() != self.page_size {
            return Err(HeapError::Corrupted(format!(
                "catalog entry '{}' sizes ({}, {}) disagree with its fields ({}, {})",
                self.table,
                self.entry_size,
                self.page_size,
                schema.entry_size(),
                schema.page_size()
            )));
        }
        if self.file_count == 0 {
            return Err(HeapError::Corrupted(format!(
                "catalog entry '{}' has no files",
                self.table
            )));
        }

        Ok(schema)
    }
}

/// Durable key → schema mapping
///
/// Implementations must make `put` durable before returning; the engine
/// relies on it when it bumps `file_count` after adding a file.
pub trait SchemaRegistry: Send + Sync {
    /// Look up a table's entry
    fn get(&self, table: &str) -> Result<Option<CatalogEntry>>;

    /// Insert or replace a table's entry
    fn put(&self, entry: CatalogEntry) -> Result<()>;

    /// All registered table names, sorted
    fn table_names(&self) -> Result<Vec<String>>;
}

/// Volatile registry for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    entries: RwLock<BTreeMap<String, CatalogEntry>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SchemaRegistry for MemoryRegistry {
    fn get(&self, table: &str) -> Result<Option<CatalogEntry>> {
        Ok(self.entries.read().get(table).cloned())
    }

    fn put(&self, entry: CatalogEntry) -> Result<()> {
        self.entries.write().insert(entry.table.clone(), entry);
        Ok(())
    }

    fn table_names(&self) -> Result<Vec<String>> {
        Ok(self.entries.read().keys().cloned().collect())
    }
}
