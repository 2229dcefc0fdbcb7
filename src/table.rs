//! Table Module
//!
//! Insert, point search and delete over a table's heap files.
//!
//! ## Responsibilities
//! - Enforce primary-key uniqueness on insert
//! - Locate records by a linear scan guided by the bitmaps
//! - Allocate first-fit slots and grow the file set when it is full
//! - Keep the file bitmap and page bitmaps consistent on every mutation
//!
//! ## Concurrency
//! Every handle for the same table shares one `RwLock`. Mutations hold it
//! exclusively, scans hold it shared, for the whole operation. Nothing is
//! cached between operations: the file count is re-read from the registry
//! and every byte is re-read from disk under the lock.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{HeapError, Result};
use crate::record::{self, Record, Value};
use crate::schema::{CatalogEntry, FieldType, SchemaRegistry, TableSchema};
use crate::storage::{
    allocator, create_table_file, discover_files, table_file_path, Layout, SlotAddress, TableFile,
    PAGES_PER_FILE,
};

/// Shape of a table as seen by `Table::verify`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableStats {
    pub files: u32,
    pub occupied_pages: usize,
    pub live_records: usize,
}

/// Handle to one table
pub struct Table {
    schema: TableSchema,
    layout: Layout,
    data_dir: PathBuf,
    registry: Arc<dyn SchemaRegistry>,
    lock: Arc<RwLock<()>>,
    lock_timeout: Option<Duration>,
}

impl Table {
    /// Load the table's schema from the registry
    pub fn open(
        name: &str,
        data_dir: &Path,
        registry: Arc<dyn SchemaRegistry>,
        lock: Arc<RwLock<()>>,
        lock_timeout: Option<Duration>,
    ) -> Result<Self> {
        let entry = registry
            .get(name)?
            .ok_or_else(|| HeapError::TableNotFound(name.to_string()))?;
        let schema = entry.schema()?;

        Ok(Self {
            layout: Layout::for_schema(&schema),
            schema,
            data_dir: data_dir.to_path_buf(),
            registry,
            lock,
            lock_timeout,
        })
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Current number of files, as recorded in the registry
    pub fn file_count(&self) -> Result<u32> {
        let _guard = self.read_guard()?;
        Ok(self.catalog_entry()?.file_count)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Insert a record, returning where it was stored
    ///
    /// Steps:
    /// 1. Encode (validates arity, types and lengths before any I/O)
    /// 2. Reject a duplicate primary key
    /// 3. Claim the first free slot, growing the file set if needed
    /// 4. Write the entry, then the slot bit, then the file bit
    pub fn insert(&self, values: Vec<Value>) -> Result<SlotAddress> {
        let entry_bytes = record::encode(&self.schema, &values)?;
        // Compare the key as it will read back from disk
        let key = stored_form(&values[self.schema.primary_key_index()]);

        let _guard = self.write_guard()?;
        let mut entry = self.catalog_entry()?;
        let mut files = self.open_files(&entry)?;

        if self.find_locked(&mut files, &key)?.is_some() {
            return Err(HeapError::DuplicateKey(key.to_string()));
        }

        let addr = self.find_free_slot(&mut files, &mut entry)?;
        let file = &mut files[(addr.file - 1) as usize];

        allocator::ensure_free(file, addr.page, addr.slot)?;
        file.write_slot(addr.page, addr.slot, &entry_bytes)?;
        allocator::occupy_slot(file, addr.page, addr.slot)?;

        Ok(addr)
    }

    /// Insert from textual field values, one token per field
    pub fn insert_tokens(&self, tokens: &[&str]) -> Result<SlotAddress> {
        let record = Record::from_tokens(self.schema.fields(), tokens)?;
        self.insert(record.values)
    }

    /// Find the record whose primary key equals `key`
    ///
    /// A text key against an integer primary key is parsed first; if it does
    /// not parse the result is "not found", not an error.
    pub fn search(&self, key: &Value) -> Result<Option<(Record, SlotAddress)>> {
        let Some(key) = self.coerce_key(key) else {
            return Ok(None);
        };

        let _guard = self.read_guard()?;
        let entry = self.catalog_entry()?;
        let mut files = self.open_files(&entry)?;
        self.find_locked(&mut files, &key)
    }

    /// Remove the record whose primary key equals `key`
    ///
    /// Returns `false` when no such record exists.
    pub fn delete(&self, key: &Value) -> Result<bool> {
        let Some(key) = self.coerce_key(key) else {
            return Ok(false);
        };

        let _guard = self.write_guard()?;
        let entry = self.catalog_entry()?;
        let mut files = self.open_files(&entry)?;

        let Some((_, addr)) = self.find_locked(&mut files, &key)? else {
            return Ok(false);
        };

        let file = &mut files[(addr.file - 1) as usize];
        file.zero_slot(addr.page, addr.slot)?;
        allocator::release_slot(file, addr.page, addr.slot)?;

        Ok(true)
    }

    /// Every live record in first-fit order
    pub fn records(&self) -> Result<Vec<(SlotAddress, Record)>> {
        let _guard = self.read_guard()?;
        let entry = self.catalog_entry()?;
        let mut files = self.open_files(&entry)?;

        let mut out = Vec::new();
        self.scan_live(&mut files, |addr, record| {
            out.push((addr, record));
            true
        })?;
        Ok(out)
    }

    /// Check that every page's file bit matches its slot bitmap
    pub fn verify(&self) -> Result<TableStats> {
        let _guard = self.read_guard()?;
        let entry = self.catalog_entry()?;
        let mut files = self.open_files(&entry)?;

        let mut stats = TableStats {
            files: entry.file_count,
            occupied_pages: 0,
            live_records: 0,
        };

        for file in files.iter_mut() {
            let file_bits = file.read_file_bitmap()?;
            for page in 0..PAGES_PER_FILE {
                let page_bits = file.read_page_bitmap(page)?;
                if file_bits.get(page) == page_bits.is_empty() {
                    return Err(HeapError::Corrupted(format!(
                        "{} page {}: file bit is {} but page has {} occupied slots",
                        file.path().display(),
                        page,
                        u8::from(file_bits.get(page)),
                        page_bits.count_ones()
                    )));
                }
                if !page_bits.is_empty() {
                    stats.occupied_pages += 1;
                    stats.live_records += page_bits.count_ones();
                }
            }
        }

        Ok(stats)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn write_guard(&self) -> Result<RwLockWriteGuard<'_, ()>> {
        lock_exclusive(&self.lock, self.lock_timeout, self.name())
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, ()>> {
        lock_shared(&self.lock, self.lock_timeout, self.name())
    }

    fn catalog_entry(&self) -> Result<CatalogEntry> {
        self.registry
            .get(self.name())?
            .ok_or_else(|| HeapError::TableNotFound(self.name().to_string()))
    }

    /// Open files `1..=file_count`
    ///
    /// Higher-indexed files are leftovers of a grow that never reached the
    /// registry; they hold no records and are ignored here.
    fn open_files(&self, entry: &CatalogEntry) -> Result<Vec<TableFile>> {
        let discovered = discover_files(&self.data_dir, self.name())?;

        let mut files = Vec::with_capacity(entry.file_count as usize);
        for (expected, (index, path)) in (1..=entry.file_count).zip(&discovered) {
            if *index != expected {
                return Err(HeapError::Corrupted(format!(
                    "table '{}' is missing file {}",
                    self.name(),
                    expected
                )));
            }
            files.push(TableFile::open(path, *index, self.layout)?);
        }

        if files.len() < entry.file_count as usize {
            return Err(HeapError::Corrupted(format!(
                "table '{}' has {} files on disk, catalog records {}",
                self.name(),
                files.len(),
                entry.file_count
            )));
        }

        Ok(files)
    }

    /// Apply the primary-key coercion rule; `None` means "cannot match"
    fn coerce_key(&self, key: &Value) -> Option<Value> {
        match (self.schema.primary_key().field_type, key) {
            (FieldType::Int32, Value::Text(s)) => s.trim().parse().ok().map(Value::Int32),
            (FieldType::Text, Value::Int32(v)) => Some(Value::Text(v.to_string())),
            _ => Some(stored_form(key)),
        }
    }

    /// Linear scan for a primary key; caller holds the lock
    fn find_locked(
        &self,
        files: &mut [TableFile],
        key: &Value,
    ) -> Result<Option<(Record, SlotAddress)>> {
        let pk = self.schema.primary_key_index();
        let mut found = None;

        self.scan_live(files, |addr, record| {
            if record.get(pk) == Some(key) {
                found = Some((record, addr));
                false
            } else {
                true
            }
        })?;

        Ok(found)
    }

    /// Visit live records in (file, page, slot) order until `visit` returns false
    fn scan_live<F>(&self, files: &mut [TableFile], mut visit: F) -> Result<()>
    where
        F: FnMut(SlotAddress, Record) -> bool,
    {
        for file in files.iter_mut() {
            let file_bits = file.read_file_bitmap()?;

            for page in file_bits.iter_ones() {
                let (page_bits, entries) = file.read_page(page)?;

                for slot in page_bits.iter_ones() {
                    let record = record::decode(&self.schema, &entries[slot])?;
                    if !visit(SlotAddress::new(file.index(), page, slot), record) {
                        return Ok(());
                    }
                }
            }
        }
        Ok(())
    }

    /// First free slot across all files, adding a file when all are full
    fn find_free_slot(
        &self,
        files: &mut Vec<TableFile>,
        entry: &mut CatalogEntry,
    ) -> Result<SlotAddress> {
        for file in files.iter_mut() {
            if let Some((page, slot)) = allocator::first_free_slot(file)? {
                return Ok(SlotAddress::new(file.index(), page, slot));
            }
        }

        let file = self.grow(entry)?;
        let addr = SlotAddress::new(file.index(), 0, 0);
        files.push(file);
        Ok(addr)
    }

    /// Create the next file and record it in the registry
    fn grow(&self, entry: &mut CatalogEntry) -> Result<TableFile> {
        let index = entry.file_count + 1;
        let path = table_file_path(&self.data_dir, self.name(), index);

        if path.exists() {
            tracing::warn!(
                "removing unregistered file {} left by an interrupted grow",
                path.display()
            );
            fs::remove_file(&path)?;
        }

        create_table_file(&path, &self.layout)?;

        let mut updated = entry.clone();
        updated.file_count = index;
        if let Err(e) = self.registry.put(updated.clone()) {
            let _ = fs::remove_file(&path);
            return Err(e);
        }
        *entry = updated;

        tracing::debug!("table '{}' grew to {} files", self.name(), index);
        TableFile::open(&path, index, self.layout)
    }
}

/// A value as it decodes after a write: strings lose trailing NULs
fn stored_form(value: &Value) -> Value {
    match value {
        Value::Text(s) => Value::Text(s.trim_end_matches('\0').to_string()),
        other => other.clone(),
    }
}

// =============================================================================
// Table Locks
// =============================================================================

/// Take a table lock exclusively, waiting at most `timeout` if one is set
pub(crate) fn lock_exclusive<'a>(
    lock: &'a RwLock<()>,
    timeout: Option<Duration>,
    table: &str,
) -> Result<RwLockWriteGuard<'a, ()>> {
    match timeout {
        Some(timeout) => lock
            .try_write_for(timeout)
            .ok_or_else(|| HeapError::LockTimeout(table.to_string())),
        None => Ok(lock.write()),
    }
}

/// Take a table lock shared, waiting at most `timeout` if one is set
pub(crate) fn lock_shared<'a>(
    lock: &'a RwLock<()>,
    timeout: Option<Duration>,
    table: &str,
) -> Result<RwLockReadGuard<'a, ()>> {
    match timeout {
        Some(timeout) => lock
            .try_read_for(timeout)
            .ok_or_else(|| HeapError::LockTimeout(table.to_string())),
        None => Ok(lock.read()),
    }
}
