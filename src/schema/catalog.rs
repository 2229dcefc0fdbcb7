//! File Catalog
//!
//! Persistent `SchemaRegistry` stored as a single checksummed file.
//!
//! ## File Format
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Header (14 bytes)                                            │
//! │   Magic: "HSCT" (4) | Version: u16 (2) | Len: u32 (4) | CRC (4)│
//! ├──────────────────────────────────────────────────────────────┤
//! │ Payload (Len bytes)                                          │
//! │   bincode(BTreeMap<String, CatalogEntry>)                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every `get` re-reads the file; every `put` rewrites it through a
//! temporary file and a rename, so readers never see a torn catalog.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{HeapError, Result};

use super::{CatalogEntry, SchemaRegistry};

/// Magic bytes identifying a heapstore catalog
const MAGIC: &[u8; 4] = b"HSCT";

/// Current catalog format version
const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + Len (4) + CRC (4) = 14 bytes
const HEADER_SIZE: usize = 14;

type Catalog = BTreeMap<String, CatalogEntry>;

/// Catalog persisted at a fixed path
pub struct FileCatalog {
    path: PathBuf,
    /// Serializes read-modify-write cycles of `put`
    write_lock: Mutex<()>,
}

impl FileCatalog {
    /// Open the catalog at `path`; the file is created lazily on first `put`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let catalog = Self {
            path: path.to_path_buf(),
            write_lock: Mutex::new(()),
        };
        // Fail fast on a damaged catalog
        catalog.load()?;
        Ok(catalog)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Catalog> {
        let mut file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Catalog::new()),
            Err(e) => return Err(e.into()),
        };

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        decode_catalog(&bytes)
    }

    fn store(&self, catalog: &Catalog) -> Result<()> {
        let bytes = encode_catalog(catalog)?;
        let tmp_path = self.path.with_extension("bin.tmp");

        {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl SchemaRegistry for FileCatalog {
    fn get(&self, table: &str) -> Result<Option<CatalogEntry>> {
        Ok(self.load()?.remove(table))
    }

    fn put(&self, entry: CatalogEntry) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut catalog = self.load()?;
        catalog.insert(entry.table.clone(), entry);
        self.store(&catalog)
    }

    fn table_names(&self) -> Result<Vec<String>> {
        Ok(self.load()?.into_keys().collect())
    }
}

// =============================================================================
// Encoding
// =============================================================================

fn encode_catalog(catalog: &Catalog) -> Result<Vec<u8>> {
    let payload = bincode::serialize(catalog)?;
    let payload_len = u32::try_from(payload.len())
        .map_err(|_| HeapError::Serialization("catalog too large".to_string()))?;

    let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&VERSION.to_le_bytes());
    bytes.extend_from_slice(&payload_len.to_le_bytes());
    bytes.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

fn decode_catalog(bytes: &[u8]) -> Result<Catalog> {
    if bytes.len() < HEADER_SIZE {
        return Err(HeapError::Corrupted(format!(
            "catalog header truncated: {} bytes",
            bytes.len()
        )));
    }

    if &bytes[0..4] != MAGIC {
        return Err(HeapError::Corrupted(format!(
            "invalid catalog magic: expected HSCT, got {:?}",
            &bytes[0..4]
        )));
    }

    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != VERSION {
        return Err(HeapError::Corrupted(format!(
            "unsupported catalog version: {}",
            version
        )));
    }

    let payload_len = u32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]) as usize;
    let expected_crc = u32::from_le_bytes([bytes[10], bytes[11], bytes[12], bytes[13]]);

    let payload = &bytes[HEADER_SIZE..];
    if payload.len() != payload_len {
        return Err(HeapError::Corrupted(format!(
            "catalog payload length mismatch: header says {}, found {}",
            payload_len,
            payload.len()
        )));
    }

    let actual_crc = crc32fast::hash(payload);
    if actual_crc != expected_crc {
        return Err(HeapError::Corrupted(format!(
            "catalog checksum mismatch: expected {:08x}, got {:08x}",
            expected_crc, actual_crc
        )));
    }

    Ok(bincode::deserialize(payload)?)
}
