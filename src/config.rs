//! Configuration for heapstore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{HeapError, Result};

/// Main configuration for a heapstore instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for the catalog and all table files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── catalog.bin      (schema catalog)
    ///     ├── <table>_1.tbl    (first file of a table)
    ///     └── <table>_2.tbl    (added when file 1 is full)
    pub data_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Command Log Configuration
    // -------------------------------------------------------------------------
    /// Directory holding `log.csv` (BEGIN/SUCCESS/FAILURE per command)
    pub log_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Concurrency Configuration
    // -------------------------------------------------------------------------
    /// How long an operation waits for its table lock (milliseconds).
    /// 0 means wait indefinitely.
    pub lock_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./heapstore_data"),
            log_dir: PathBuf::from("./heapstore_logs"),
            lock_timeout_ms: 0,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Lock acquisition deadline, `None` when unbounded
    pub fn lock_timeout(&self) -> Option<Duration> {
        if self.lock_timeout_ms > 0 {
            Some(Duration::from_millis(self.lock_timeout_ms))
        } else {
            None
        }
    }

    /// Reject configurations that cannot work
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(HeapError::Config("data_dir must not be empty".to_string()));
        }
        if self.log_dir.as_os_str().is_empty() {
            return Err(HeapError::Config("log_dir must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (catalog and table files)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the command log directory
    pub fn log_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_dir = path.into();
        self
    }

    /// Set the table lock timeout (in milliseconds, 0 = block)
    pub fn lock_timeout_ms(mut self, ms: u64) -> Self {
        self.config.lock_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
