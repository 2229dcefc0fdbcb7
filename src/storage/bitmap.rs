//! Fixed-width occupancy bitmaps.
//!
//! The bytes are read as one unsigned big-endian integer and bit `n` is its
//! n-th least significant bit. Bit 0 therefore lives in the last byte.

use crate::error::{HeapError, Result};

use super::{FILE_HEADER_SIZE, PAGE_HEADER_SIZE};

/// Page occupancy of one file
pub type FileBitmap = Bitmap<FILE_HEADER_SIZE>;

/// Slot occupancy of one page
pub type PageBitmap = Bitmap<PAGE_HEADER_SIZE>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bitmap<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> Default for Bitmap<N> {
    fn default() -> Self {
        Self { bytes: [0; N] }
    }
}

impl<const N: usize> Bitmap<N> {
    /// Number of addressable bits
    pub const BITS: usize = N * 8;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: [u8; N]) -> Self {
        Self { bytes }
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; N] = bytes.try_into().map_err(|_| {
            HeapError::Corrupted(format!(
                "bitmap needs {} bytes, got {}",
                N,
                bytes.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    /// Byte index and mask of a bit; panics past `BITS`
    fn locate(bit: usize) -> (usize, u8) {
        assert!(bit < Self::BITS, "bit {} out of range for {}-bit map", bit, Self::BITS);
        (N - 1 - bit / 8, 1 << (bit % 8))
    }

    pub fn get(&self, bit: usize) -> bool {
        let (byte, mask) = Self::locate(bit);
        self.bytes[byte] & mask != 0
    }

    pub fn set(&mut self, bit: usize) {
        let (byte, mask) = Self::locate(bit);
        self.bytes[byte] |= mask;
    }

    pub fn clear(&mut self, bit: usize) {
        let (byte, mask) = Self::locate(bit);
        self.bytes[byte] &= !mask;
    }

    /// Lowest clear bit
    pub fn first_zero(&self) -> Option<usize> {
        (0..Self::BITS).find(|&bit| !self.get(bit))
    }

    pub fn is_full(&self) -> bool {
        self.bytes.iter().all(|&b| b == u8::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }

    pub fn count_ones(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Set bits in ascending order
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..Self::BITS).filter(move |&bit| self.get(bit))
    }
}
