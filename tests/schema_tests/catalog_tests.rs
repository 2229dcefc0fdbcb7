//! Tests for the schema registries
//!
//! These tests verify:
//! - FileCatalog put/get/table_names and persistence across reopen
//! - Detection of damaged catalog files
//! - Catalog entry cross-checks
//! - MemoryRegistry behaves like the file catalog

use std::fs;
use std::path::PathBuf;

use heapstore::schema::{
    CatalogEntry, FieldDef, FieldType, FileCatalog, MemoryRegistry, SchemaRegistry, TableSchema,
};
use heapstore::HeapError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_catalog() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("catalog.bin");
    (temp_dir, path)
}

fn users_entry() -> CatalogEntry {
    let schema = TableSchema::new(
        "users",
        vec![
            FieldDef::new("id", FieldType::Int32),
            FieldDef::new("name", FieldType::Text),
        ],
        0,
    )
    .unwrap();
    CatalogEntry::new(&schema)
}

// =============================================================================
// FileCatalog Tests
// =============================================================================

#[test]
fn test_open_missing_catalog_is_empty() {
    let (_temp, path) = setup_temp_catalog();

    let catalog = FileCatalog::open(&path).unwrap();

    assert!(catalog.get("users").unwrap().is_none());
    assert!(catalog.table_names().unwrap().is_empty());
    assert!(!path.exists());
}

#[test]
fn test_put_get() {
    let (_temp, path) = setup_temp_catalog();
    let catalog = FileCatalog::open(&path).unwrap();

    catalog.put(users_entry()).unwrap();

    let entry = catalog.get("users").unwrap().unwrap();
    assert_eq!(entry, users_entry());
    assert_eq!(entry.file_count, 1);
    assert_eq!(entry.entry_size, 260);
    assert_eq!(entry.page_size, 2081);
}

#[test]
fn test_put_replaces_entry() {
    let (_temp, path) = setup_temp_catalog();
    let catalog = FileCatalog::open(&path).unwrap();
    catalog.put(users_entry()).unwrap();

    let mut grown = users_entry();
    grown.file_count = 3;
    catalog.put(grown).unwrap();

    assert_eq!(catalog.get("users").unwrap().unwrap().file_count, 3);
    assert_eq!(catalog.table_names().unwrap(), vec!["users".to_string()]);
}

#[test]
fn test_persists_across_reopen() {
    let (_temp, path) = setup_temp_catalog();
    {
        let catalog = FileCatalog::open(&path).unwrap();
        catalog.put(users_entry()).unwrap();
    }

    let catalog = FileCatalog::open(&path).unwrap();

    assert_eq!(catalog.get("users").unwrap(), Some(users_entry()));
}

#[test]
fn test_table_names_sorted() {
    let (_temp, path) = setup_temp_catalog();
    let catalog = FileCatalog::open(&path).unwrap();

    for name in ["zeta", "alpha", "mid"] {
        let schema =
            TableSchema::new(name, vec![FieldDef::new("id", FieldType::Int32)], 0).unwrap();
        catalog.put(CatalogEntry::new(&schema)).unwrap();
    }

    assert_eq!(catalog.table_names().unwrap(), vec!["alpha", "mid", "zeta"]);
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_bad_magic() {
    let (_temp, path) = setup_temp_catalog();
    FileCatalog::open(&path).unwrap().put(users_entry()).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    bytes[0] = b'X';
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        FileCatalog::open(&path).err().unwrap(),
        HeapError::Corrupted(_)
    ));
}

#[test]
fn test_flipped_payload_byte_fails_checksum() {
    let (_temp, path) = setup_temp_catalog();
    FileCatalog::open(&path).unwrap().put(users_entry()).unwrap();

    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        FileCatalog::open(&path).err().unwrap(),
        HeapError::Corrupted(_)
    ));
}

#[test]
fn test_truncated_catalog() {
    let (_temp, path) = setup_temp_catalog();
    FileCatalog::open(&path).unwrap().put(users_entry()).unwrap();

    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    assert!(matches!(
        FileCatalog::open(&path).err().unwrap(),
        HeapError::Corrupted(_)
    ));
}

// =============================================================================
// Entry Cross-check Tests
// =============================================================================

#[test]
fn test_entry_schema_round_trip() {
    let entry = users_entry();

    let schema = entry.schema().unwrap();

    assert_eq!(schema.name(), "users");
    assert_eq!(schema.entry_size(), entry.entry_size);
}

#[test]
fn test_entry_size_mismatch_is_corrupted() {
    let mut entry = users_entry();
    entry.entry_size = 8;

    assert!(matches!(entry.schema(), Err(HeapError::Corrupted(_))));
}

#[test]
fn test_entry_field_count_mismatch_is_corrupted() {
    let mut entry = users_entry();
    entry.field_count = 5;

    assert!(matches!(entry.schema(), Err(HeapError::Corrupted(_))));
}

#[test]
fn test_entry_without_files_is_corrupted() {
    let mut entry = users_entry();
    entry.file_count = 0;

    assert!(matches!(entry.schema(), Err(HeapError::Corrupted(_))));
}

// =============================================================================
// MemoryRegistry Tests
// =============================================================================

#[test]
fn test_memory_registry() {
    let registry = MemoryRegistry::new();
    assert!(registry.get("users").unwrap().is_none());

    registry.put(users_entry()).unwrap();

    assert_eq!(registry.get("users").unwrap(), Some(users_entry()));
    assert_eq!(registry.table_names().unwrap(), vec!["users".to_string()]);
}
