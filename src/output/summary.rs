//! End-of-run summary

use crate::state::FetchOutcome;
use std::fmt;
use std::time::Duration;

/// Counts gathered while a run processes ids
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Ids the run set out to process
    pub pending: usize,

    /// Ids in range skipped because the ledger already had them
    pub skipped: u64,

    pub processed: usize,
    pub found: usize,
    pub empty: usize,

    /// Blocked, transient and fatal outcomes together
    pub errored: usize,

    /// The blocked share of `errored`
    pub blocked: usize,

    /// True when a shutdown request cut the run short
    pub interrupted: bool,

    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new(pending: usize, skipped: u64) -> Self {
        Self {
            pending,
            skipped,
            ..Default::default()
        }
    }

    /// Counts one settled outcome
    pub fn observe(&mut self, outcome: &FetchOutcome) {
        self.processed += 1;
        match outcome {
            FetchOutcome::Found(_) => self.found += 1,
            FetchOutcome::Empty(_) => self.empty += 1,
            FetchOutcome::Blocked(_) => {
                self.blocked += 1;
                self.errored += 1;
            }
            FetchOutcome::TransientError(_) | FetchOutcome::FatalError(_) => self.errored += 1,
        }
    }

    /// Share of pending ids processed so far, in percent
    pub fn percent_complete(&self) -> f64 {
        if self.pending == 0 {
            100.0
        } else {
            self.processed as f64 / self.pending as f64 * 100.0
        }
    }

    /// Ids per second
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.processed as f64 / secs
        } else {
            0.0
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed {} of {} pending ({} found, {} empty, {} errors of which {} blocked) in {:.1}s, {:.2} ids/sec",
            self.processed,
            self.pending,
            self.found,
            self.empty,
            self.errored,
            self.blocked,
            self.elapsed.as_secs_f64(),
            self.rate()
        )?;
        if self.interrupted {
            write!(f, " [interrupted]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SellerRecord;

    #[test]
    fn test_observe() {
        let mut summary = RunSummary::new(4, 0);
        summary.observe(&FetchOutcome::Found(SellerRecord::new(1, "r")));
        summary.observe(&FetchOutcome::Empty("r".to_string()));
        summary.observe(&FetchOutcome::Blocked("captcha".to_string()));
        summary.observe(&FetchOutcome::TransientError("HTTP 503".to_string()));

        assert_eq!(summary.processed, 4);
        assert_eq!(summary.found, 1);
        assert_eq!(summary.empty, 1);
        assert_eq!(summary.errored, 2);
        assert_eq!(summary.blocked, 1);
        assert_eq!(summary.percent_complete(), 100.0);
    }

    #[test]
    fn test_rate_without_elapsed_time() {
        let summary = RunSummary::new(0, 0);
        assert_eq!(summary.rate(), 0.0);
        assert_eq!(summary.percent_complete(), 100.0);
    }
}
