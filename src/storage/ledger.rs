//! JSON progress ledger
//!
//! The ledger is a single JSON object mapping seller ids to their
//! [`ProgressEntry`]. It is loaded once at start-up, updated in memory as
//! outcomes arrive and rewritten atomically (temp file, then rename) on flush.

use crate::state::ProgressEntry;
use crate::storage::traits::{ProgressStore, StorageError, StorageResult};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// File-backed progress ledger
#[derive(Debug)]
pub struct JsonLedger {
    path: PathBuf,
    entries: BTreeMap<u64, ProgressEntry>,
    dirty: bool,
}

impl JsonLedger {
    /// Opens the ledger at `path`
    ///
    /// A missing or blank file yields an empty ledger. A file that does not
    /// parse is an error rather than a silent reset, so earlier progress is
    /// never overwritten.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|source| StorageError::CorruptLedger {
                    path: path.clone(),
                    source,
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StorageError::io(&path, e)),
        };

        tracing::debug!("Loaded {} ledger entries from {}", entries.len(), path.display());

        Ok(Self {
            path,
            entries,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, id: u64) -> Option<&ProgressEntry> {
        self.entries.get(&id)
    }

    /// All entries in id order
    pub fn entries(&self) -> &BTreeMap<u64, ProgressEntry> {
        &self.entries
    }

    /// Whether there are recorded entries not yet flushed
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl ProgressStore for JsonLedger {
    fn has(&self, id: u64) -> bool {
        self.entries.contains_key(&id)
    }

    fn record(&mut self, id: u64, entry: ProgressEntry) {
        self.entries.insert(id, entry);
        self.dirty = true;
    }

    fn flush(&mut self) -> StorageResult<()> {
        if !self.dirty {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let json = serde_json::to_vec_pretty(&self.entries)?;
        let temp = self.temp_path();
        fs::write(&temp, json).map_err(|e| StorageError::io(&temp, e))?;
        fs::rename(&temp, &self.path).map_err(|e| StorageError::io(&self.path, e))?;

        self.dirty = false;
        tracing::debug!("Flushed {} ledger entries", self.entries.len());
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
