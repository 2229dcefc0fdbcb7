//! Free-space allocator
//!
//! First-fit search over the two bitmap levels and the read-modify-write
//! primitives that keep them consistent.
//!
//! A set file bit only means "page is nonempty"; it never means "page is
//! full". The slot bitmap is always consulted for pages whose file bit is
//! set.

use crate::error::{HeapError, Result};

use super::{TableFile, PAGES_PER_FILE};

/// First free `(page, slot)` in a file, if any
pub fn first_free_slot(file: &mut TableFile) -> Result<Option<(usize, usize)>> {
    let file_bits = file.read_file_bitmap()?;

    for page in 0..PAGES_PER_FILE {
        if !file_bits.get(page) {
            return Ok(Some((page, 0)));
        }

        let page_bits = file.read_page_bitmap(page)?;
        if let Some(slot) = page_bits.first_zero() {
            return Ok(Some((page, slot)));
        }
    }

    Ok(None)
}

/// Fail unless `slot` of `page` is currently free
///
/// Called before writing into a slot returned by `first_free_slot`; a set
/// bit here means the bitmaps disagree with each other.
pub fn ensure_free(file: &mut TableFile, page: usize, slot: usize) -> Result<()> {
    let page_bits = file.read_page_bitmap(page)?;
    if page_bits.get(slot) {
        return Err(HeapError::AllocatorInvariantViolation(format!(
            "{} page {} slot {} offered as free but is occupied (page bits {:08b})",
            file.path().display(),
            page,
            slot,
            page_bits.as_bytes()[0]
        )));
    }
    Ok(())
}

/// Mark a slot occupied: slot bit first, then the page's file bit
pub fn occupy_slot(file: &mut TableFile, page: usize, slot: usize) -> Result<()> {
    let mut page_bits = file.read_page_bitmap(page)?;
    if page_bits.get(slot) {
        return Err(HeapError::AllocatorInvariantViolation(format!(
            "{} page {} slot {} is already occupied",
            file.path().display(),
            page,
            slot
        )));
    }
    page_bits.set(slot);
    file.write_page_bitmap(page, &page_bits)?;

    let mut file_bits = file.read_file_bitmap()?;
    if !file_bits.get(page) {
        file_bits.set(page);
        file.write_file_bitmap(&file_bits)?;
    }

    tracing::trace!("occupied {} page {} slot {}", file.index(), page, slot);
    Ok(())
}

/// Mark a slot free; clears the file bit when the page becomes empty
///
/// Returns whether the page is now empty.
pub fn release_slot(file: &mut TableFile, page: usize, slot: usize) -> Result<bool> {
    let mut page_bits = file.read_page_bitmap(page)?;
    page_bits.clear(slot);
    file.write_page_bitmap(page, &page_bits)?;

    let emptied = page_bits.is_empty();
    if emptied {
        let mut file_bits = file.read_file_bitmap()?;
        if file_bits.get(page) {
            file_bits.clear(page);
            file.write_file_bitmap(&file_bits)?;
        }
    }

    tracing::trace!(
        "released {} page {} slot {} (page empty: {})",
        file.index(),
        page,
        slot,
        emptied
    );
    Ok(emptied)
}
