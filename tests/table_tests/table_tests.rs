//! Tests for table operations
//!
//! These tests verify:
//! - insert/search/delete on the two-field users table
//! - Primary key uniqueness and key coercion
//! - First-fit placement and slot reuse after delete
//! - File growth once every slot of the last file is taken
//! - Bitmap consistency after mixed workloads
//! - Failed inserts leave no trace
//! - Concurrent inserts on one table

use std::collections::HashSet;
use std::fs;
use std::thread;

use heapstore::schema::{FieldDef, FieldType, TableSchema};
use heapstore::storage::{table_file_path, Layout, PageBitmap, SlotAddress, TableFile};
use heapstore::{Config, Engine, HeapError, Table, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

const RECORDS_PER_FILE: i32 = 256 * 8;

fn setup_temp_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp_dir.path().join("data"))
        .log_dir(temp_dir.path().join("logs"))
        .build();
    let engine = Engine::open(config).unwrap();
    (temp_dir, engine)
}

fn create_users(engine: &Engine) -> Table {
    let schema = TableSchema::new(
        "users",
        vec![
            FieldDef::new("id", FieldType::Int32),
            FieldDef::new("name", FieldType::Text),
        ],
        0,
    )
    .unwrap();
    engine.create_table_with_schema(schema).unwrap()
}

fn create_nums(engine: &Engine) -> Table {
    let schema = TableSchema::new("nums", vec![FieldDef::new("n", FieldType::Int32)], 0).unwrap();
    engine.create_table_with_schema(schema).unwrap()
}

fn user(id: i32, name: &str) -> Vec<Value> {
    vec![Value::Int32(id), Value::from(name)]
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_insert_search_delete_scenario() {
    let (_temp, engine) = setup_temp_engine();
    let users = create_users(&engine);

    let addr = users.insert(user(1, "alice")).unwrap();
    assert_eq!(addr, SlotAddress::new(1, 0, 0));

    let (record, found_at) = users.search(&Value::Int32(1)).unwrap().unwrap();
    assert_eq!(record.values, user(1, "alice"));
    assert_eq!(found_at, SlotAddress::new(1, 0, 0));

    let err = users.insert(user(1, "bob")).unwrap_err();
    assert!(matches!(err, HeapError::DuplicateKey(ref key) if key == "1"));

    assert!(users.delete(&Value::Int32(1)).unwrap());
    assert!(users.search(&Value::Int32(1)).unwrap().is_none());
    assert!(!users.delete(&Value::Int32(1)).unwrap());
}

#[test]
fn test_duplicate_among_two_records() {
    let (_temp, engine) = setup_temp_engine();
    let users = create_users(&engine);
    users.insert(user(1, "a")).unwrap();
    users.insert(user(2, "b")).unwrap();

    let err = users.insert(user(1, "c")).unwrap_err();

    assert!(matches!(err, HeapError::DuplicateKey(_)));
    assert_eq!(users.records().unwrap().len(), 2);
    let (record, _) = users.search(&Value::Int32(1)).unwrap().unwrap();
    assert_eq!(record.values, user(1, "a"));

    assert!(users.delete(&Value::Int32(1)).unwrap());
    assert!(users.search(&Value::Int32(1)).unwrap().is_none());
    assert!(!users.delete(&Value::Int32(1)).unwrap());
}

#[test]
fn test_search_missing_key() {
    let (_temp, engine) = setup_temp_engine();
    let users = create_users(&engine);
    users.insert(user(1, "alice")).unwrap();

    assert!(users.search(&Value::Int32(2)).unwrap().is_none());
}

#[test]
fn test_search_empty_table() {
    let (_temp, engine) = setup_temp_engine();
    let users = create_users(&engine);

    assert!(users.search(&Value::Int32(1)).unwrap().is_none());
    assert!(!users.delete(&Value::Int32(1)).unwrap());
}

#[test]
fn test_insert_tokens() {
    let (_temp, engine) = setup_temp_engine();
    let users = create_users(&engine);

    users.insert_tokens(&["9", "zed"]).unwrap();

    let (record, _) = users.search(&Value::Int32(9)).unwrap().unwrap();
    assert_eq!(record.to_string(), "9 zed");
}

#[test]
fn test_primary_key_on_text_field() {
    let (_temp, engine) = setup_temp_engine();
    let schema = TableSchema::new(
        "tags",
        vec![
            FieldDef::new("count", FieldType::Int32),
            FieldDef::new("tag", FieldType::Text),
        ],
        1,
    )
    .unwrap();
    let tags = engine.create_table_with_schema(schema).unwrap();

    tags.insert(vec![Value::Int32(1), Value::from("rust")]).unwrap();
    tags.insert(vec![Value::Int32(1), Value::from("42")]).unwrap();

    let err = tags
        .insert(vec![Value::Int32(2), Value::from("rust")])
        .unwrap_err();
    assert!(matches!(err, HeapError::DuplicateKey(_)));

    let (record, _) = tags.search(&Value::from("rust")).unwrap().unwrap();
    assert_eq!(record.get(0), Some(&Value::Int32(1)));

    // Integer keys compare against their decimal text
    assert!(tags.search(&Value::Int32(42)).unwrap().is_some());
}

#[test]
fn test_text_key_with_trailing_nul_is_duplicate() {
    let (_temp, engine) = setup_temp_engine();
    let schema = TableSchema::new("tags", vec![FieldDef::new("tag", FieldType::Text)], 0).unwrap();
    let tags = engine.create_table_with_schema(schema).unwrap();

    tags.insert(vec![Value::from("a")]).unwrap();

    // "a\0" is stored as "a"
    let err = tags.insert(vec![Value::from("a\0")]).unwrap_err();
    assert!(matches!(err, HeapError::DuplicateKey(_)));
    assert_eq!(tags.records().unwrap().len(), 1);

    let (record, _) = tags.search(&Value::from("a\0")).unwrap().unwrap();
    assert_eq!(record.get(0), Some(&Value::from("a")));

    // Interior NULs still distinguish keys
    tags.insert(vec![Value::from("a\0b")]).unwrap();
    assert_eq!(tags.records().unwrap().len(), 2);
}

// =============================================================================
// Key Coercion Tests
// =============================================================================

#[test]
fn test_text_key_against_int_primary_key() {
    let (_temp, engine) = setup_temp_engine();
    let users = create_users(&engine);
    users.insert(user(7, "gina")).unwrap();

    assert!(users.search(&Value::from("7")).unwrap().is_some());
    assert!(users.search(&Value::from(" 7 ")).unwrap().is_some());
    assert!(users.search(&Value::from("seven")).unwrap().is_none());
    assert!(!users.delete(&Value::from("seven")).unwrap());
    assert!(users.delete(&Value::from("7")).unwrap());
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_field_too_long_writes_nothing() {
    let (_temp, engine) = setup_temp_engine();
    let users = create_users(&engine);

    let err = users.insert(user(1, &"x".repeat(257))).unwrap_err();
    assert!(matches!(err, HeapError::FieldTooLong { len: 257, .. }));

    assert!(users.search(&Value::Int32(1)).unwrap().is_none());
    assert_eq!(users.verify().unwrap().live_records, 0);

    let path = table_file_path(engine.data_dir(), "users", 1);
    assert!(fs::read(path).unwrap().iter().all(|&b| b == 0));
}

#[test]
fn test_arity_and_type_errors() {
    let (_temp, engine) = setup_temp_engine();
    let users = create_users(&engine);

    assert!(matches!(
        users.insert(vec![Value::Int32(1)]).unwrap_err(),
        HeapError::ArityMismatch {
            expected: 2,
            actual: 1
        }
    ));
    assert!(matches!(
        users.insert(vec![Value::from("a"), Value::from("b")]).unwrap_err(),
        HeapError::TypeMismatch { .. }
    ));
    assert!(matches!(
        users.insert_tokens(&["99999999999", "big"]).unwrap_err(),
        HeapError::FieldOverflow { .. }
    ));

    assert!(users.records().unwrap().is_empty());
}

#[test]
fn test_duplicate_insert_leaves_table_unchanged() {
    let (_temp, engine) = setup_temp_engine();
    let users = create_users(&engine);
    users.insert(user(1, "alice")).unwrap();

    users.insert(user(1, "mallory")).unwrap_err();

    let records = users.records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].1.values, user(1, "alice"));
}

// =============================================================================
// Placement Tests
// =============================================================================

#[test]
fn test_first_fit_fills_page_then_next() {
    let (_temp, engine) = setup_temp_engine();
    let users = create_users(&engine);

    for id in 0..9 {
        let addr = users.insert(user(id, "u")).unwrap();
        let expected = SlotAddress::new(1, id as usize / 8, id as usize % 8);
        assert_eq!(addr, expected);
    }

    let stats = users.verify().unwrap();
    assert_eq!(stats.occupied_pages, 2);
    assert_eq!(stats.live_records, 9);
}

#[test]
fn test_delete_then_reinsert_reuses_slot() {
    let (_temp, engine) = setup_temp_engine();
    let users = create_users(&engine);
    for id in 0..3 {
        users.insert(user(id, "u")).unwrap();
    }

    let (_, freed) = users.search(&Value::Int32(1)).unwrap().unwrap();
    assert!(users.delete(&Value::Int32(1)).unwrap());

    let addr = users.insert(user(10, "new")).unwrap();
    assert_eq!(addr, freed);
    assert_eq!(addr, SlotAddress::new(1, 0, 1));
}

#[test]
fn test_delete_zeroes_slot_and_clears_empty_page() {
    let (_temp, engine) = setup_temp_engine();
    let users = create_users(&engine);
    for id in 0..9 {
        users.insert(user(id, "u")).unwrap();
    }

    // id 8 is alone on page 1
    assert!(users.delete(&Value::Int32(8)).unwrap());

    let layout = *users.layout();
    let mut file = TableFile::open(
        &table_file_path(engine.data_dir(), "users", 1),
        1,
        layout,
    )
    .unwrap();
    assert!(!file.read_file_bitmap().unwrap().get(1));
    assert!(file.read_page_bitmap(1).unwrap().is_empty());
    assert!(file.read_slot(1, 0).unwrap().iter().all(|&b| b == 0));

    assert_eq!(users.verify().unwrap().occupied_pages, 1);
}

#[test]
fn test_records_in_first_fit_order() {
    let (_temp, engine) = setup_temp_engine();
    let users = create_users(&engine);
    for id in [5, 3, 9] {
        users.insert(user(id, "u")).unwrap();
    }
    users.delete(&Value::Int32(3)).unwrap();
    users.insert(user(4, "u")).unwrap();

    let ids: Vec<Value> = users
        .records()
        .unwrap()
        .into_iter()
        .map(|(_, r)| r.values[0].clone())
        .collect();

    assert_eq!(ids, vec![Value::Int32(5), Value::Int32(4), Value::Int32(9)]);
}

// =============================================================================
// File Growth Tests
// =============================================================================

#[test]
fn test_full_file_grows_second_file() {
    let (_temp, engine) = setup_temp_engine();
    let nums = create_nums(&engine);

    for n in 0..RECORDS_PER_FILE {
        let addr = nums.insert(vec![Value::Int32(n)]).unwrap();
        assert_eq!(addr.file, 1);
    }
    assert_eq!(nums.file_count().unwrap(), 1);

    let addr = nums.insert(vec![Value::Int32(RECORDS_PER_FILE)]).unwrap();
    assert_eq!(addr, SlotAddress::new(2, 0, 0));
    assert_eq!(nums.file_count().unwrap(), 2);
    assert!(table_file_path(engine.data_dir(), "nums", 2).exists());

    // Records in both files stay reachable
    let (_, at) = nums.search(&Value::Int32(0)).unwrap().unwrap();
    assert_eq!(at, SlotAddress::new(1, 0, 0));
    let (_, at) = nums.search(&Value::Int32(RECORDS_PER_FILE)).unwrap().unwrap();
    assert_eq!(at.file, 2);

    // A hole in file 1 is preferred over file 2
    nums.delete(&Value::Int32(100)).unwrap();
    let addr = nums.insert(vec![Value::Int32(-1)]).unwrap();
    assert_eq!(addr, SlotAddress::new(1, 12, 4));

    let stats = nums.verify().unwrap();
    assert_eq!(stats.files, 2);
    assert_eq!(stats.live_records, RECORDS_PER_FILE as usize + 1);
}

#[test]
fn test_unregistered_trailing_file_is_ignored() {
    let (_temp, engine) = setup_temp_engine();
    let users = create_users(&engine);
    users.insert(user(1, "alice")).unwrap();

    fs::write(table_file_path(engine.data_dir(), "users", 2), b"junk").unwrap();

    assert!(users.search(&Value::Int32(1)).unwrap().is_some());
    assert_eq!(users.verify().unwrap().files, 1);
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_missing_file_is_corrupted() {
    let (_temp, engine) = setup_temp_engine();
    let users = create_users(&engine);

    fs::remove_file(table_file_path(engine.data_dir(), "users", 1)).unwrap();

    assert!(matches!(
        users.search(&Value::Int32(1)).unwrap_err(),
        HeapError::Corrupted(_)
    ));
}

#[test]
fn test_verify_detects_bitmap_disagreement() {
    let (_temp, engine) = setup_temp_engine();
    let users = create_users(&engine);

    let layout = Layout::for_schema(users.schema());
    let mut file = TableFile::open(
        &table_file_path(engine.data_dir(), "users", 1),
        1,
        layout,
    )
    .unwrap();
    let mut bits = PageBitmap::new();
    bits.set(0);
    file.write_page_bitmap(3, &bits).unwrap();

    assert!(matches!(users.verify().unwrap_err(), HeapError::Corrupted(_)));
}

#[test]
fn test_insert_into_slot_marked_without_file_bit_fails() {
    let (_temp, engine) = setup_temp_engine();
    let users = create_users(&engine);

    let layout = Layout::for_schema(users.schema());
    let mut file = TableFile::open(
        &table_file_path(engine.data_dir(), "users", 1),
        1,
        layout,
    )
    .unwrap();
    let mut bits = PageBitmap::new();
    bits.set(0);
    file.write_page_bitmap(0, &bits).unwrap();

    assert!(matches!(
        users.insert(user(1, "alice")).unwrap_err(),
        HeapError::AllocatorInvariantViolation(_)
    ));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_inserts() {
    let (_temp, engine) = setup_temp_engine();
    create_users(&engine);

    thread::scope(|s| {
        for t in 0..4 {
            let engine = &engine;
            s.spawn(move || {
                let users = engine.table("users").unwrap();
                for i in 0..25 {
                    users.insert(user(t * 100 + i, "worker")).unwrap();
                }
            });
        }
    });

    let users = engine.table("users").unwrap();
    let records = users.records().unwrap();
    assert_eq!(records.len(), 100);

    let addrs: HashSet<SlotAddress> = records.iter().map(|(a, _)| *a).collect();
    assert_eq!(addrs.len(), 100);

    let stats = users.verify().unwrap();
    assert_eq!(stats.live_records, 100);
    assert_eq!(stats.occupied_pages, 13);
}

#[test]
fn test_concurrent_duplicate_inserts_admit_one() {
    let (_temp, engine) = setup_temp_engine();
    create_users(&engine);

    let successes: usize = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = &engine;
                s.spawn(move || {
                    let users = engine.table("users").unwrap();
                    usize::from(users.insert(user(1, "race")).is_ok())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    assert_eq!(successes, 1);
    assert_eq!(engine.table("users").unwrap().records().unwrap().len(), 1);
}
