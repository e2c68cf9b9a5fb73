//! Pending-id computation and batching

use crate::config::Config;
use crate::storage::ProgressStore;
use std::ops::RangeInclusive;
use std::time::Duration;

/// What a run walks and how fast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub range: RangeInclusive<u64>,

    /// Fetches in flight per batch; 1 means serial
    pub concurrency: usize,

    /// Pause between batches
    pub delay: Duration,

    /// Ledger flush interval, in processed ids
    pub flush_every: usize,
}

impl RunPlan {
    pub fn from_config(config: &Config) -> Self {
        Self {
            range: config.range.from..=config.range.to,
            concurrency: config.pacing.concurrency,
            delay: config.pacing.delay(),
            flush_every: config.pacing.flush_every,
        }
    }

    /// Number of ids in the range
    pub fn range_len(&self) -> u64 {
        if self.range.is_empty() {
            0
        } else {
            self.range.end() - self.range.start() + 1
        }
    }
}

/// Ids in `range` that have no ledger entry yet, in increasing order
pub fn pending_ids<L: ProgressStore + ?Sized>(range: RangeInclusive<u64>, ledger: &L) -> Vec<u64> {
    range.filter(|id| !ledger.has(*id)).collect()
}

/// Splits pending ids into dispatch batches of at most `size`
pub fn batches(ids: &[u64], size: usize) -> std::slice::Chunks<'_, u64> {
    ids.chunks(size.max(1))
}
