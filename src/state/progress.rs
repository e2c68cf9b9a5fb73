/// Per-id progress ledger entries
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal status remembered for a seller id
///
/// Every status is sticky: an id with any entry is skipped by later runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// A seller record was written to the result sink
    Ok,
    /// No seller exists at this id
    Empty,
    /// The fetch ended degraded (blocked, transient or fatal)
    Error,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Empty => "empty",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ledger value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub status: EntryStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProgressEntry {
    pub fn ok() -> Self {
        Self {
            status: EntryStatus::Ok,
            error: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            status: EntryStatus::Empty,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: EntryStatus::Error,
            error: Some(message.into()),
        }
    }
}
