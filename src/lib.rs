//! Seller-Census: a resumable marketplace seller directory harvester
//!
//! This crate walks a numeric seller-id range, fetches each seller's business
//! details from either a JSON API or the rendered seller page, and appends the
//! results to a CSV file while keeping a resumable progress ledger.

pub mod config;
pub mod extract;
pub mod fetch;
pub mod harvest;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for run-level failures
///
/// Per-seller failures never surface here; the fetch client turns them into a
/// [`state::FetchOutcome`]. Only problems that stop the whole run do.
#[derive(Debug, Error)]
pub enum CensusError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing API token: set [api].token or the {0} environment variable")]
    MissingToken(String),
}

/// Result type alias for Seller-Census operations
pub type Result<T> = std::result::Result<T, CensusError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use state::{EntryStatus, FetchOutcome, ProgressEntry, SellerRecord};
