//! Reporting for harvest runs
//!
//! This module produces what a person reads after (or instead of) a run:
//! - The end-of-run summary with counts and throughput
//! - Ledger statistics for `--stats`

mod stats;
mod summary;

pub use stats::{ledger_statistics, print_statistics, LedgerStatistics};
pub use summary::RunSummary;
