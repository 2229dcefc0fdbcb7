//! Page/file geometry, file naming and file creation.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{HeapError, Result};
use crate::schema::TableSchema;

use super::{FILE_EXTENSION, FILE_HEADER_SIZE, PAGES_PER_FILE, PAGE_HEADER_SIZE, PAGE_SLOTS};

/// Byte geometry of every file of one table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    entry_size: usize,
}

impl Layout {
    pub fn new(entry_size: usize) -> Self {
        Self { entry_size }
    }

    pub fn for_schema(schema: &TableSchema) -> Self {
        Self::new(schema.entry_size())
    }

    pub fn entry_size(&self) -> usize {
        self.entry_size
    }

    pub fn page_size(&self) -> usize {
        self.entry_size * PAGE_SLOTS + PAGE_HEADER_SIZE
    }

    pub fn file_size(&self) -> u64 {
        (FILE_HEADER_SIZE + PAGES_PER_FILE * self.page_size()) as u64
    }

    pub fn page_offset(&self, page: usize) -> u64 {
        debug_assert!(page < PAGES_PER_FILE);
        (FILE_HEADER_SIZE + page * self.page_size()) as u64
    }

    pub fn slot_offset(&self, page: usize, slot: usize) -> u64 {
        debug_assert!(slot < PAGE_SLOTS);
        self.page_offset(page) + (PAGE_HEADER_SIZE + slot * self.entry_size) as u64
    }
}

// =============================================================================
// File Naming
// =============================================================================

/// "<dir>/<table>_<index>.tbl"
pub fn table_file_path(dir: &Path, table: &str, index: u32) -> PathBuf {
    dir.join(format!("{}_{}.{}", table, index, FILE_EXTENSION))
}

/// Parse the file index from a table file name
/// "users_12.tbl" → Some(12)
fn parse_file_index(path: &Path, table: &str) -> Option<u32> {
    if path.extension()?.to_str()? != FILE_EXTENSION {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let index = stem.strip_prefix(table)?.strip_prefix('_')?;
    if index.is_empty() || !index.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    index.parse().ok()
}

/// All files of `table` in `dir`, ordered by index
pub fn discover_files(dir: &Path, table: &str) -> Result<Vec<(u32, PathBuf)>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() {
            if let Some(index) = parse_file_index(&path, table) {
                files.push((index, path));
            }
        }
    }

    files.sort_by_key(|(index, _)| *index);
    Ok(files)
}

// =============================================================================
// File Creation
// =============================================================================

/// Write a zero-filled table file at `path`
///
/// The full image is written to a sibling temporary file, synced, then
/// renamed into place, so the target either does not exist or is complete.
/// Fails with `AlreadyExists` if `path` is taken.
pub fn create_table_file(path: &Path, layout: &Layout) -> Result<()> {
    if path.exists() {
        return Err(HeapError::Io(std::io::Error::new(
            ErrorKind::AlreadyExists,
            format!("table file {} already exists", path.display()),
        )));
    }

    let tmp_path = path.with_extension(format!("{}.tmp", FILE_EXTENSION));
    let image = vec![0u8; layout.file_size() as usize];

    let written = write_image(&tmp_path, &image).and_then(|()| fs::rename(&tmp_path, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    Ok(())
}

fn write_image(path: &Path, image: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    file.write_all(image)?;
    file.sync_all()
}
