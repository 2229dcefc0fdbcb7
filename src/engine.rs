//! Engine Module
//!
//! Entry point that ties the schema registry, table files and locks together.
//!
//! ## Responsibilities
//! - Open the data directory and its catalog
//! - Create tables (first file, then catalog entry)
//! - Hand out `Table` handles that share one lock per table
//! - Execute parsed commands

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::command::{Command, Outcome};
use crate::config::Config;
use crate::error::{HeapError, Result};
use crate::record::{Record, Value};
use crate::schema::{CatalogEntry, FileCatalog, SchemaRegistry, TableDefinition, TableSchema};
use crate::storage::{create_table_file, table_file_path, Layout, SlotAddress};
use crate::table::{self, Table};

/// The heap-file storage engine
///
/// ## Concurrency Model
///
/// One `RwLock<()>` per table name, created on first use and shared by every
/// `Table` handle for that name:
/// - insert/delete hold it exclusively
/// - search/records/verify hold it shared
/// - create_table holds the new name's lock exclusively
///
/// Operations never touch more than one table, so locks are never nested.
pub struct Engine {
    config: Config,

    /// Table name → catalog entry
    registry: Arc<dyn SchemaRegistry>,

    /// Table name → table lock
    locks: Mutex<HashMap<String, Arc<RwLock<()>>>>,
}

impl Engine {
    const CATALOG_FILENAME: &'static str = "catalog.bin";

    /// Open or create an engine backed by `<data_dir>/catalog.bin`
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let catalog = FileCatalog::open(&config.data_dir.join(Self::CATALOG_FILENAME))?;
        tracing::debug!(
            "opened catalog {} with {} tables",
            catalog.path().display(),
            catalog.table_names()?.len()
        );

        Ok(Self::build(config, Arc::new(catalog)))
    }

    /// Open with a caller-supplied registry
    pub fn with_registry(config: Config, registry: Arc<dyn SchemaRegistry>) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self::build(config, registry))
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    fn build(config: Config, registry: Arc<dyn SchemaRegistry>) -> Self {
        Self {
            config,
            registry,
            locks: Mutex::new(HashMap::new()),
        }
    }

    // =========================================================================
    // Tables
    // =========================================================================

    /// Validate a table definition and create the table
    pub fn create_table(&self, definition: TableDefinition) -> Result<Table> {
        let schema = definition.into_schema()?;
        self.create_table_with_schema(schema)
    }

    /// Create a table from an already validated schema
    ///
    /// Steps:
    /// 1. Lock the table name
    /// 2. Reject a registered name
    /// 3. Write the pre-zeroed first file
    /// 4. Register the schema (removing the file if that fails)
    pub fn create_table_with_schema(&self, schema: TableSchema) -> Result<Table> {
        let name = schema.name().to_string();
        let lock = self.table_lock(&name);

        {
            let _guard = table::lock_exclusive(&lock, self.config.lock_timeout(), &name)?;

            if self.registry.get(&name)?.is_some() {
                return Err(HeapError::TableAlreadyExists(name));
            }

            let path = table_file_path(&self.config.data_dir, &name, 1);
            if path.exists() {
                tracing::warn!(
                    "removing unregistered file {} before creating '{}'",
                    path.display(),
                    name
                );
                fs::remove_file(&path)?;
            }

            let layout = Layout::for_schema(&schema);
            create_table_file(&path, &layout)?;

            if let Err(e) = self.registry.put(CatalogEntry::new(&schema)) {
                let _ = fs::remove_file(&path);
                return Err(e);
            }

            tracing::debug!(
                "created table '{}' ({} fields, entry {} bytes, file {} bytes)",
                name,
                schema.field_count(),
                layout.entry_size(),
                layout.file_size()
            );
        }

        self.table(&name)
    }

    /// Handle to an existing table
    pub fn table(&self, name: &str) -> Result<Table> {
        // No lock entry for names that were never created
        if self.registry.get(name)?.is_none() {
            return Err(HeapError::TableNotFound(name.to_string()));
        }

        Table::open(
            name,
            &self.config.data_dir,
            Arc::clone(&self.registry),
            self.table_lock(name),
            self.config.lock_timeout(),
        )
    }

    /// All registered table names, sorted
    pub fn table_names(&self) -> Result<Vec<String>> {
        self.registry.table_names()
    }

    // =========================================================================
    // Records
    // =========================================================================

    pub fn insert(&self, table: &str, values: Vec<Value>) -> Result<SlotAddress> {
        self.table(table)?.insert(values)
    }

    pub fn search(&self, table: &str, key: &Value) -> Result<Option<(Record, SlotAddress)>> {
        self.table(table)?.search(key)
    }

    pub fn delete(&self, table: &str, key: &Value) -> Result<bool> {
        self.table(table)?.delete(key)
    }

    /// Execute a command
    ///
    /// Command arguments are text; keys are coerced to the primary key type
    /// by the table.
    pub fn execute(&self, command: Command) -> Result<Outcome> {
        match command {
            Command::CreateType(definition) => {
                self.create_table(definition)?;
                Ok(Outcome::Created)
            }
            Command::CreateRecord { table, values } => {
                let tokens: Vec<&str> = values.iter().map(String::as_str).collect();
                let addr = self.table(&table)?.insert_tokens(&tokens)?;
                Ok(Outcome::Inserted(addr))
            }
            Command::SearchRecord { table, key } => {
                match self.table(&table)?.search(&Value::Text(key))? {
                    Some((record, addr)) => Ok(Outcome::Found(record, addr)),
                    None => Ok(Outcome::NotFound),
                }
            }
            Command::DeleteRecord { table, key } => {
                if self.table(&table)?.delete(&Value::Text(key))? {
                    Ok(Outcome::Deleted)
                } else {
                    Ok(Outcome::Missing)
                }
            }
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Arc<dyn SchemaRegistry> {
        &self.registry
    }

    /// Number of table locks handed out so far
    pub fn lock_count(&self) -> usize {
        self.locks.lock().len()
    }

    fn table_lock(&self, name: &str) -> Arc<RwLock<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(name.to_string()).or_default())
    }
}
