//! Storage traits and error types
//!
//! This module defines the two persistence seams of a harvest run: the
//! progress ledger that makes runs resumable, and the sink that receives
//! found seller rows.

use crate::state::{ProgressEntry, SellerRecord};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt progress ledger {path}: {source}")]
    CorruptLedger {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable per-id progress
///
/// Any id with an entry is considered processed and is skipped by later runs,
/// whatever its status.
pub trait ProgressStore {
    /// Whether an id already has an entry
    fn has(&self, id: u64) -> bool;

    /// Stores (or overwrites) an id's entry in memory
    fn record(&mut self, id: u64, entry: ProgressEntry);

    /// Makes every recorded entry durable
    fn flush(&mut self) -> StorageResult<()>;

    /// Number of ids with an entry
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Destination for found seller rows
pub trait ResultSink {
    /// Appends one row; the row must be durable when this returns
    fn append(&mut self, record: &SellerRecord) -> StorageResult<()>;
}
