//! # heapstore
//!
//! A paginated heap-file table store with:
//! - Fixed-width records (4-byte integers, 256-byte strings)
//! - Two-level bitmap free-space tracking (file → page → slot)
//! - First-fit allocation with on-demand file growth
//! - Primary-key uniqueness, point search and delete
//! - A persistent, checksummed schema catalog
//! - A line-oriented command language with a CSV command log
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │               Command Runner (script input)                 │
//! │            parse → execute → log.csv BEGIN/END              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Engine                               │
//! │        (create_table, per-table RwLock, handles)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Catalog   │          │    Table    │
//!   │ (registry)  │          │ insert/find │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                      ┌────────────────────────┐
//!                      │  Storage + Allocator   │
//!                      │ <table>_<n>.tbl files  │
//!                      └────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod schema;
pub mod record;
pub mod storage;
pub mod table;
pub mod engine;
pub mod command;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{HeapError, Result};
pub use config::Config;
pub use engine::Engine;
pub use record::{Record, Value};
pub use schema::{FieldDef, FieldType, TableDefinition, TableSchema};
pub use storage::SlotAddress;
pub use table::{Table, TableStats};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of heapstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
