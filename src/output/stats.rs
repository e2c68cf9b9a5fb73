//! Statistics over the progress ledger
//!
//! Backs `--stats`: reads the ledger without fetching anything and reports
//! how far the census has come.

use crate::state::{EntryStatus, ProgressEntry};
use std::collections::{BTreeMap, HashMap};

/// How many distinct error reasons are listed
const TOP_ERRORS: usize = 5;

/// Ledger statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerStatistics {
    /// Total number of ids with an entry
    pub total: usize,

    /// Count of entries by status
    pub by_status: HashMap<EntryStatus, usize>,

    /// Lowest and highest recorded id
    pub id_span: Option<(u64, u64)>,

    /// Most frequent error reasons, most frequent first
    pub top_errors: Vec<(String, usize)>,
}

impl LedgerStatistics {
    pub fn count(&self, status: EntryStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

/// Computes statistics from ledger entries
pub fn ledger_statistics(entries: &BTreeMap<u64, ProgressEntry>) -> LedgerStatistics {
    let mut by_status = HashMap::new();
    let mut reasons: HashMap<&str, usize> = HashMap::new();

    for entry in entries.values() {
        *by_status.entry(entry.status).or_insert(0) += 1;
        if entry.status == EntryStatus::Error {
            let reason = entry.error.as_deref().unwrap_or("unknown");
            *reasons.entry(reason).or_insert(0) += 1;
        }
    }

    let mut top_errors: Vec<(String, usize)> = reasons
        .into_iter()
        .map(|(reason, count)| (reason.to_string(), count))
        .collect();
    top_errors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_errors.truncate(TOP_ERRORS);

    let id_span = entries
        .keys()
        .next()
        .zip(entries.keys().next_back())
        .map(|(first, last)| (*first, *last));

    LedgerStatistics {
        total: entries.len(),
        by_status,
        id_span,
        top_errors,
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &LedgerStatistics) {
    println!("=== Ledger Statistics ===\n");

    println!("Overview:");
    println!("  Ids recorded: {}", stats.total);
    if let Some((first, last)) = stats.id_span {
        println!("  Id span: {} - {}", first, last);
    }
    println!();

    println!("Entries by Status:");
    for status in [EntryStatus::Ok, EntryStatus::Empty, EntryStatus::Error] {
        let count = stats.count(status);
        let percentage = if stats.total > 0 {
            (count as f64 / stats.total as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", status, count, percentage);
    }
    println!();

    if !stats.top_errors.is_empty() {
        println!("Most Frequent Errors:");
        for (reason, count) in &stats.top_errors {
            println!("  {:>6}  {}", count, reason);
        }
        println!();
    }
}
