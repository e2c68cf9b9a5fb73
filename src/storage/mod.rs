//! Storage module for persisting harvest progress and results
//!
//! This module handles everything a run writes to disk:
//! - The JSON progress ledger that makes runs resumable
//! - The append-only CSV result file
//! - Raw page dumps kept for diagnosing blocked or empty pages

mod csv_sink;
mod diagnostics;
mod ledger;
mod traits;

pub use csv_sink::CsvSink;
pub use diagnostics::DiagnosticStore;
pub use ledger::JsonLedger;
pub use traits::{ProgressStore, ResultSink, StorageError, StorageResult};
