//! Batch controller
//!
//! Owns the ledger and the result sink for the whole run and walks the
//! pending ids through a [`Fetcher`]:
//!
//! `Init → Running → (Draining) → Flushed → Done`
//!
//! Within a batch every fetch runs concurrently and the controller waits for
//! all of them before touching the ledger. Outcomes are applied in completion
//! order: a found row is appended to the sink before its ledger entry is
//! recorded, so a crash can at worst duplicate a row on the next run, never
//! lose one.

use crate::config::Config;
use crate::fetch::Fetcher;
use crate::harvest::scheduler::{batches, pending_ids, RunPlan};
use crate::harvest::shutdown::ShutdownSignal;
use crate::output::RunSummary;
use crate::state::FetchOutcome;
use crate::storage::{CsvSink, JsonLedger, ProgressStore, ResultSink};
use crate::CensusError;
use futures::stream::{FuturesUnordered, StreamExt};
use std::ops::{Deref, DerefMut};
use std::time::Instant;

/// Where a run is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Init,
    Running,
    Draining,
    Flushed,
    Done,
}

/// Flushes the wrapped ledger when dropped
///
/// Covers early returns and panics; the happy path flushes explicitly.
#[derive(Debug)]
pub struct FlushOnDrop<L: ProgressStore>(L);

impl<L: ProgressStore> Deref for FlushOnDrop<L> {
    type Target = L;

    fn deref(&self) -> &L {
        &self.0
    }
}

impl<L: ProgressStore> DerefMut for FlushOnDrop<L> {
    fn deref_mut(&mut self) -> &mut L {
        &mut self.0
    }
}

impl<L: ProgressStore> Drop for FlushOnDrop<L> {
    fn drop(&mut self) {
        if let Err(e) = self.0.flush() {
            tracing::error!("Failed to flush progress ledger on exit: {}", e);
        }
    }
}

/// Drives one harvest run
pub struct HarvestController<F, L: ProgressStore = JsonLedger, K = CsvSink> {
    fetcher: F,
    ledger: FlushOnDrop<L>,
    sink: K,
    plan: RunPlan,
    shutdown: ShutdownSignal,
    phase: RunPhase,
}

impl<F: Fetcher> HarvestController<F, JsonLedger, CsvSink> {
    /// Opens the configured ledger and result file
    ///
    /// Either failing aborts the run before any id is fetched.
    pub fn open(fetcher: F, config: &Config, shutdown: ShutdownSignal) -> Result<Self, CensusError> {
        let ledger = JsonLedger::open(&config.output.progress_path)?;
        let sink = CsvSink::open(&config.output.csv_path)?;

        tracing::info!(
            "Ledger {} has {} entries, writing rows to {}",
            ledger.path().display(),
            ledger.len(),
            sink.path().display()
        );

        Ok(Self::new(
            fetcher,
            ledger,
            sink,
            RunPlan::from_config(config),
            shutdown,
        ))
    }
}

impl<F, L, K> HarvestController<F, L, K>
where
    F: Fetcher,
    L: ProgressStore,
    K: ResultSink,
{
    pub fn new(fetcher: F, ledger: L, sink: K, plan: RunPlan, shutdown: ShutdownSignal) -> Self {
        Self {
            fetcher,
            ledger: FlushOnDrop(ledger),
            sink,
            plan,
            shutdown,
            phase: RunPhase::Init,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Runs until every pending id is processed or shutdown is requested
    ///
    /// Per-id failures end up in the ledger; only ledger or sink I/O errors
    /// are returned.
    pub async fn run(&mut self) -> Result<RunSummary, CensusError> {
        let started = Instant::now();

        let pending = pending_ids(self.plan.range.clone(), &*self.ledger);
        let skipped = self.plan.range_len() - pending.len() as u64;
        let mut summary = RunSummary::new(pending.len(), skipped);

        tracing::info!(
            "Starting harvest of ids {}..={}: {} pending, {} already recorded",
            self.plan.range.start(),
            self.plan.range.end(),
            pending.len(),
            skipped
        );

        self.phase = RunPhase::Running;
        let mut since_flush = 0usize;
        let mut chunks = batches(&pending, self.plan.concurrency).peekable();

        while let Some(batch) = chunks.next() {
            if self.shutdown.is_triggered() {
                self.phase = RunPhase::Draining;
                break;
            }

            let settled = settle_batch(&self.fetcher, batch).await;

            for (id, outcome) in settled {
                if let FetchOutcome::Found(record) = &outcome {
                    self.sink.append(record)?;
                }
                self.ledger.record(id, outcome.to_progress_entry());
                summary.observe(&outcome);

                match outcome.reason() {
                    Some(reason) => tracing::info!(
                        "[{:5.1}%] {} {} ({})",
                        summary.percent_complete(),
                        id,
                        outcome,
                        reason
                    ),
                    None => tracing::info!(
                        "[{:5.1}%] {} {}",
                        summary.percent_complete(),
                        id,
                        outcome
                    ),
                }

                since_flush += 1;
                if since_flush >= self.plan.flush_every {
                    self.ledger.flush()?;
                    since_flush = 0;
                }
            }

            if chunks.peek().is_some() && !self.plan.delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.plan.delay) => {}
                    _ = self.shutdown.triggered() => {}
                }
            }
        }

        if self.phase == RunPhase::Draining {
            tracing::warn!(
                "Shutdown requested; stopped with {} of {} pending ids processed",
                summary.processed,
                summary.pending
            );
            summary.interrupted = true;
        }

        self.ledger.flush()?;
        self.phase = RunPhase::Flushed;

        summary.elapsed = started.elapsed();
        self.phase = RunPhase::Done;
        tracing::info!("Harvest finished: {}", summary);

        Ok(summary)
    }
}

/// Fetches a batch concurrently and returns outcomes in completion order
async fn settle_batch<F: Fetcher>(fetcher: &F, batch: &[u64]) -> Vec<(u64, FetchOutcome)> {
    let mut in_flight: FuturesUnordered<_> = batch
        .iter()
        .map(|&id| async move { (id, fetcher.fetch(id).await) })
        .collect();

    let mut settled = Vec::with_capacity(batch.len());
    while let Some(result) = in_flight.next().await {
        settled.push(result);
    }
    settled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{EntryStatus, SellerRecord};
    use crate::storage::StorageResult;
    use std::future::Future;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Even ids are found, multiples of 5 are empty, the rest time out
    #[derive(Default)]
    struct FakeFetcher {
        calls: Mutex<Vec<u64>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        stop_after: Option<(usize, ShutdownSignal)>,
        /// When set, the on-disk ledger size is captured as each fetch starts
        ledger_path: Option<PathBuf>,
        on_disk: Mutex<Vec<(u64, usize)>>,
    }

    impl Fetcher for FakeFetcher {
        fn fetch(&self, id: u64) -> impl Future<Output = FetchOutcome> + Send {
            async move {
                if let Some(path) = &self.ledger_path {
                    let stored = JsonLedger::open(path).unwrap().len();
                    self.on_disk.lock().unwrap().push((id, stored));
                }

                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_in_flight.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);

                let calls = {
                    let mut calls = self.calls.lock().unwrap();
                    calls.push(id);
                    calls.len()
                };
                if let Some((limit, signal)) = &self.stop_after {
                    if calls >= *limit {
                        signal.trigger();
                    }
                }

                if id % 5 == 0 {
                    FetchOutcome::Empty(format!("seller/{}", id))
                } else if id % 2 == 0 {
                    let mut record = SellerRecord::new(id, format!("seller/{}", id));
                    record.business_name = format!("Seller {}", id);
                    FetchOutcome::Found(record)
                } else {
                    FetchOutcome::TransientError("timeout after 3 attempts".to_string())
                }
            }
        }
    }

    #[derive(Default, Clone)]
    struct MemorySink {
        rows: Arc<Mutex<Vec<u64>>>,
    }

    impl ResultSink for MemorySink {
        fn append(&mut self, record: &SellerRecord) -> StorageResult<()> {
            self.rows.lock().unwrap().push(record.id);
            Ok(())
        }
    }

    fn plan(range: std::ops::RangeInclusive<u64>, concurrency: usize) -> RunPlan {
        RunPlan {
            range,
            concurrency,
            delay: Duration::ZERO,
            flush_every: 3,
        }
    }

    #[tokio::test]
    async fn test_run_records_every_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");
        let ledger = JsonLedger::open(&path).unwrap();
        let sink = MemorySink::default();

        let mut controller = HarvestController::new(
            FakeFetcher::default(),
            ledger,
            sink.clone(),
            plan(1..=10, 1),
            ShutdownSignal::new(),
        );
        let summary = controller.run().await.unwrap();

        assert_eq!(controller.phase(), RunPhase::Done);
        assert_eq!(summary.processed, 10);
        assert_eq!(summary.found, 4);
        assert_eq!(summary.empty, 2);
        assert_eq!(summary.errored, 4);
        assert_eq!(*sink.rows.lock().unwrap(), vec![2, 4, 6, 8]);

        let reloaded = JsonLedger::open(&path).unwrap();
        assert_eq!(reloaded.len(), 10);
        assert_eq!(reloaded.get(10).unwrap().status, EntryStatus::Empty);
        assert_eq!(reloaded.get(3).unwrap().status, EntryStatus::Error);
    }

    #[tokio::test]
    async fn test_ledger_flushed_periodically_during_run() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");
        let ledger = JsonLedger::open(&path).unwrap();

        let fetcher = FakeFetcher {
            ledger_path: Some(path.clone()),
            ..Default::default()
        };
        let mut controller = HarvestController::new(
            fetcher,
            ledger,
            MemorySink::default(),
            plan(1..=10, 1),
            ShutdownSignal::new(),
        );
        controller.run().await.unwrap();

        // flush_every is 3: ids 1-3 are on disk before id 4 starts, and so on
        let on_disk = controller.fetcher.on_disk.lock().unwrap().clone();
        let expected: Vec<(u64, usize)> = (1..=10u64)
            .map(|id| (id, ((id as usize - 1) / 3) * 3))
            .collect();
        assert_eq!(on_disk, expected);
    }

    #[tokio::test]
    async fn test_resume_skips_recorded_ids() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");
        let mut ledger = JsonLedger::open(&path).unwrap();
        for id in 1..=5 {
            ledger.record(id, crate::state::ProgressEntry::error("earlier failure"));
        }
        let sink = MemorySink::default();

        let mut controller = HarvestController::new(
            FakeFetcher::default(),
            ledger,
            sink.clone(),
            plan(1..=8, 2),
            ShutdownSignal::new(),
        );
        let summary = controller.run().await.unwrap();

        assert_eq!(summary.skipped, 5);
        assert_eq!(summary.processed, 3);
        let mut calls = controller.fetcher.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, vec![6, 7, 8]);
        assert_eq!(
            controller.ledger().get(1).unwrap().error.as_deref(),
            Some("earlier failure")
        );
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_batch_size() {
        let dir = TempDir::new().unwrap();
        let ledger = JsonLedger::open(dir.path().join("p.json")).unwrap();

        let mut controller = HarvestController::new(
            FakeFetcher::default(),
            ledger,
            MemorySink::default(),
            plan(1..=20, 4),
            ShutdownSignal::new(),
        );
        controller.run().await.unwrap();

        let max = controller.fetcher.max_in_flight.load(Ordering::SeqCst);
        assert!(max <= 4, "max in flight was {}", max);
    }

    #[tokio::test]
    async fn test_shutdown_stops_at_batch_boundary_and_flushes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");
        let ledger = JsonLedger::open(&path).unwrap();
        let shutdown = ShutdownSignal::new();

        let fetcher = FakeFetcher {
            stop_after: Some((3, shutdown.clone())),
            ..Default::default()
        };
        let mut controller = HarvestController::new(
            fetcher,
            ledger,
            MemorySink::default(),
            plan(1..=20, 2),
            shutdown,
        );
        let summary = controller.run().await.unwrap();

        assert!(summary.interrupted);
        // The batch that raised the flag still completes
        assert_eq!(summary.processed, 4);
        assert_eq!(JsonLedger::open(&path).unwrap().len(), 4);
    }

    #[test]
    fn test_drop_flushes_ledger() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("progress.json");

        {
            let mut ledger = FlushOnDrop(JsonLedger::open(&path).unwrap());
            ledger.record(42, crate::state::ProgressEntry::ok());
        }

        assert!(JsonLedger::open(&path).unwrap().has(42));
    }
}
