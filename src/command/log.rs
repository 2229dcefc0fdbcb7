//! Command log
//!
//! Append-only CSV of command lifecycle events:
//!
//! ```text
//! 1718000000, create record users 1 alice, BEGIN
//! 1718000000, create record users 1 alice, SUCCESS
//! ```

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Result;

/// File name of the log inside the log directory
pub const LOG_FILENAME: &str = "log.csv";

/// Lifecycle event of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStatus {
    Begin,
    Success,
    Failure,
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogStatus::Begin => write!(f, "BEGIN"),
            LogStatus::Success => write!(f, "SUCCESS"),
            LogStatus::Failure => write!(f, "FAILURE"),
        }
    }
}

pub struct CommandLog {
    path: PathBuf,
    file: File,
}

impl CommandLog {
    /// Open (or create) `<dir>/log.csv` for appending
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(LOG_FILENAME);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn begin(&mut self, command: &str) -> Result<()> {
        self.append(command, LogStatus::Begin)
    }

    pub fn finish(&mut self, command: &str, success: bool) -> Result<()> {
        let status = if success {
            LogStatus::Success
        } else {
            LogStatus::Failure
        };
        self.append(command, status)
    }

    pub fn append(&mut self, command: &str, status: LogStatus) -> Result<()> {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        writeln!(self.file, "{}, {}, {}", secs, command.trim(), status)?;
        self.file.flush()?;
        Ok(())
    }
}
