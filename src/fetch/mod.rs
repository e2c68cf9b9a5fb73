//! Fetching seller data from an upstream
//!
//! This module handles every network interaction of a run, including:
//! - Building the HTTP client with the configured user agent
//! - The JSON API and rendered-page upstreams
//! - Block and not-found detection for rendered pages
//! - Retry budgets with per-failure-kind backoff

pub mod api;
pub mod block;
mod client;
pub mod page;
pub mod retry;
pub mod source;

pub use client::{build_http_client, FetchClient, Fetcher};
pub use retry::{Backoff, RetryPolicy, Sleeper, TokioSleeper};
pub use source::{Retrieved, SellerSource, Upstream};

use crate::state::FetchOutcome;
use std::fmt;
use std::time::Duration;

/// Why a single attempt did not produce a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// The upstream says the seller does not exist; never retried
    NotFound,

    /// HTTP 429, with the server's suggested wait if it sent one
    RateLimited { retry_after: Option<Duration> },

    /// A challenge or denial page; retried once
    Blocked { reason: String },

    /// Timeout, connection or DNS failure
    TransientTransport { message: String },

    /// Any other non-success status
    UnexpectedStatus { status: u16 },

    /// A page with neither fields, block signals nor not-found wording
    Anomaly { reason: String },

    /// Retrying cannot help (rejected credentials, undecodable response)
    Fatal { reason: String },
}

impl FetchFailure {
    /// Classifies a reqwest error raised while sending or reading
    pub fn from_transport(error: &reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            "timeout"
        } else if error.is_connect() {
            "connection failed"
        } else {
            "transport error"
        };
        Self::TransientTransport {
            message: format!("{}: {}", kind, error),
        }
    }

    /// The terminal outcome once the retry budget is spent
    pub fn into_outcome(self, attempts: u32) -> FetchOutcome {
        match self {
            Self::Blocked { reason } => FetchOutcome::Blocked(reason),
            Self::Fatal { reason } => FetchOutcome::FatalError(reason),
            other => FetchOutcome::TransientError(format!("{} after {} attempts", other, attempts)),
        }
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::RateLimited { .. } => write!(f, "rate limited (HTTP 429)"),
            Self::Blocked { reason } => write!(f, "blocked: {}", reason),
            Self::TransientTransport { message } => write!(f, "{}", message),
            Self::UnexpectedStatus { status } => write!(f, "HTTP {}", status),
            Self::Anomaly { reason } => write!(f, "{}", reason),
            Self::Fatal { reason } => write!(f, "fatal: {}", reason),
        }
    }
}
