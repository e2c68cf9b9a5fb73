/// Classified result of fetching a single seller id
use crate::state::progress::ProgressEntry;
use crate::state::record::SellerRecord;
use std::fmt;

/// What one identifier produced once its retry budget settled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    // ===== Terminal Success =====
    /// A seller with at least one populated field
    Found(SellerRecord),

    /// No seller lives at this id; carries the locator that was checked
    Empty(String),

    // ===== Degraded =====
    /// The upstream served a challenge or denial page
    Blocked(String),

    /// Retryable failures exhausted the attempt budget
    TransientError(String),

    /// A failure that retrying cannot fix
    FatalError(String),
}

impl FetchOutcome {
    /// Returns the human-readable reason for degraded outcomes
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Blocked(reason) | Self::TransientError(reason) | Self::FatalError(reason) => {
                Some(reason)
            }
            Self::Found(_) | Self::Empty(_) => None,
        }
    }

    /// Collapses the outcome into what the progress ledger stores
    ///
    /// All three degraded kinds become an `error` entry with the reason kept.
    pub fn to_progress_entry(&self) -> ProgressEntry {
        match self {
            Self::Found(_) => ProgressEntry::ok(),
            Self::Empty(_) => ProgressEntry::empty(),
            Self::Blocked(reason) => ProgressEntry::error(format!("blocked: {}", reason)),
            Self::TransientError(reason) => ProgressEntry::error(reason.clone()),
            Self::FatalError(reason) => ProgressEntry::error(format!("fatal: {}", reason)),
        }
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(_) => write!(f, "found"),
            Self::Empty(_) => write!(f, "empty"),
            Self::Blocked(_) => write!(f, "blocked"),
            Self::TransientError(_) => write!(f, "error"),
            Self::FatalError(_) => write!(f, "fatal"),
        }
    }
}
