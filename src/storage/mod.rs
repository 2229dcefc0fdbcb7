//! Storage Module
//!
//! Paginated heap files with two-level bitmap free-space tracking.
//!
//! ## Responsibilities
//! - Compute page and slot offsets from a table's entry size
//! - Create fully pre-zeroed table files and discover existing ones
//! - Track page occupancy (file bitmap) and slot occupancy (page bitmaps)
//! - First-fit slot allocation and slot reclamation
//!
//! ## File Format
//! ```text
//! ┌────────────────────────────────────────┐
//! │ File Header (32 bytes)                 │
//! │   page bitmap, bit n = page n nonempty │
//! ├────────────────────────────────────────┤
//! │ Page 0                                 │
//! │ ┌────────┬────────┬────────┬─────────┐ │
//! │ │Bits (1)│ Slot 0 │  ...   │ Slot 7  │ │
//! │ └────────┴────────┴────────┴─────────┘ │
//! ├────────────────────────────────────────┤
//! │ ... (256 pages)                        │
//! └────────────────────────────────────────┘
//! ```

pub mod allocator;
mod bitmap;
mod file;
mod layout;

use std::fmt;

pub use bitmap::{Bitmap, FileBitmap, PageBitmap};
pub use file::TableFile;
pub use layout::{create_table_file, discover_files, table_file_path, Layout};

// =============================================================================
// Format Constants
// =============================================================================

/// Record slots per page
pub const PAGE_SLOTS: usize = 8;

/// Pages per table file
pub const PAGES_PER_FILE: usize = 256;

/// Page header: one bit per slot
pub const PAGE_HEADER_SIZE: usize = PAGE_SLOTS / 8;

/// File header: one bit per page
pub const FILE_HEADER_SIZE: usize = PAGES_PER_FILE / 8;

/// Extension of table files (`<table>_<index>.tbl`)
pub const FILE_EXTENSION: &str = "tbl";

// =============================================================================
// Slot Address
// =============================================================================

/// Physical location of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotAddress {
    /// 1-based file index
    pub file: u32,
    pub page: usize,
    pub slot: usize,
}

impl SlotAddress {
    pub fn new(file: u32, page: usize, slot: usize) -> Self {
        Self { file, page, slot }
    }
}

impl fmt::Display for SlotAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file {} page {} slot {}", self.file, self.page, self.slot)
    }
}
