//! Table File
//!
//! Positioned reads and writes of headers and slots in one table file.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{HeapError, Result};

use super::{FileBitmap, Layout, PageBitmap, FILE_HEADER_SIZE, PAGE_HEADER_SIZE, PAGE_SLOTS};

/// An open table file
pub struct TableFile {
    /// 1-based position in the table's file sequence
    index: u32,
    path: PathBuf,
    file: File,
    layout: Layout,
}

impl TableFile {
    /// Open an existing file, checking its size against the layout
    pub fn open(path: &Path, index: u32, layout: Layout) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;

        let len = file.metadata()?.len();
        if len != layout.file_size() {
            return Err(HeapError::Corrupted(format!(
                "table file {} is {} bytes, expected {}",
                path.display(),
                len,
                layout.file_size()
            )));
        }

        Ok(Self {
            index,
            path: path.to_path_buf(),
            file,
            layout,
        })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    // =========================================================================
    // Headers
    // =========================================================================

    pub fn read_file_bitmap(&mut self) -> Result<FileBitmap> {
        let mut buf = [0u8; FILE_HEADER_SIZE];
        self.read_at(0, &mut buf)?;
        Ok(FileBitmap::from_bytes(buf))
    }

    pub fn write_file_bitmap(&mut self, bitmap: &FileBitmap) -> Result<()> {
        self.write_at(0, bitmap.as_bytes())
    }

    pub fn read_page_bitmap(&mut self, page: usize) -> Result<PageBitmap> {
        let mut buf = [0u8; PAGE_HEADER_SIZE];
        self.read_at(self.layout.page_offset(page), &mut buf)?;
        Ok(PageBitmap::from_bytes(buf))
    }

    pub fn write_page_bitmap(&mut self, page: usize, bitmap: &PageBitmap) -> Result<()> {
        self.write_at(self.layout.page_offset(page), bitmap.as_bytes())
    }

    // =========================================================================
    // Pages and Slots
    // =========================================================================

    /// Read a whole page in one call: its bitmap and all slot entries
    pub fn read_page(&mut self, page: usize) -> Result<(PageBitmap, Vec<Vec<u8>>)> {
        let mut buf = vec![0u8; self.layout.page_size()];
        self.read_at(self.layout.page_offset(page), &mut buf)?;

        let bitmap = PageBitmap::from_slice(&buf[..PAGE_HEADER_SIZE])?;
        let entries = buf[PAGE_HEADER_SIZE..]
            .chunks_exact(self.layout.entry_size())
            .take(PAGE_SLOTS)
            .map(<[u8]>::to_vec)
            .collect();
        Ok((bitmap, entries))
    }

    pub fn read_slot(&mut self, page: usize, slot: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; self.layout.entry_size()];
        self.read_at(self.layout.slot_offset(page, slot), &mut buf)?;
        Ok(buf)
    }

    pub fn write_slot(&mut self, page: usize, slot: usize, entry: &[u8]) -> Result<()> {
        if entry.len() != self.layout.entry_size() {
            return Err(HeapError::Corrupted(format!(
                "entry is {} bytes, slot holds {}",
                entry.len(),
                self.layout.entry_size()
            )));
        }
        self.write_at(self.layout.slot_offset(page, slot), entry)
    }

    /// Overwrite a slot with zeros
    pub fn zero_slot(&mut self, page: usize, slot: usize) -> Result<()> {
        let zeros = vec![0u8; self.layout.entry_size()];
        self.write_at(self.layout.slot_offset(page, slot), &zeros)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(bytes)?;
        self.file.flush()?;
        Ok(())
    }
}
