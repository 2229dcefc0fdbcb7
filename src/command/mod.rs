//! Command Module
//!
//! The line-oriented command language and the script runner.
//!
//! ## Responsibilities
//! - Parse `create type`, `create record`, `search record`, `delete record`
//! - Execute commands against an `Engine` (see `Engine::execute`)
//! - Append BEGIN/SUCCESS/FAILURE events to the command log

mod log;
mod parser;
mod runner;

use std::fmt;

use crate::record::Record;
use crate::schema::TableDefinition;
use crate::storage::SlotAddress;

pub use log::{CommandLog, LogStatus, LOG_FILENAME};
pub use parser::parse;
pub use runner::{RunSummary, Runner};

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `create type <table> <count> <pk> <name> <type> ...`
    CreateType(TableDefinition),

    /// `create record <table> <value> ...`
    CreateRecord { table: String, values: Vec<String> },

    /// `search record <table> <key>`
    SearchRecord { table: String, key: String },

    /// `delete record <table> <key>`
    DeleteRecord { table: String, key: String },
}

impl Command {
    /// Name of the table the command targets
    pub fn table(&self) -> &str {
        match self {
            Command::CreateType(def) => &def.name,
            Command::CreateRecord { table, .. }
            | Command::SearchRecord { table, .. }
            | Command::DeleteRecord { table, .. } => table,
        }
    }
}

/// Result of a successfully executed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Inserted(SlotAddress),
    Found(Record, SlotAddress),
    NotFound,
    Deleted,
    Missing,
}

impl Outcome {
    /// Whether the command had its intended effect
    ///
    /// A search that finds nothing and a delete of a missing key are not
    /// errors, but they are logged as failures.
    pub fn took_effect(&self) -> bool {
        !matches!(self, Outcome::NotFound | Outcome::Missing)
    }

    /// Text printed for the command, if any
    pub fn output(&self) -> Option<String> {
        match self {
            Outcome::Found(record, _) => Some(record.to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created => write!(f, "created"),
            Outcome::Inserted(addr) => write!(f, "inserted at {}", addr),
            Outcome::Found(_, addr) => write!(f, "found at {}", addr),
            Outcome::NotFound => write!(f, "not found"),
            Outcome::Deleted => write!(f, "deleted"),
            Outcome::Missing => write!(f, "no such key"),
        }
    }
}
