//! State module for harvest results and progress
//!
//! # Components
//!
//! - `SellerRecord`: one result row for a seller id
//! - `FetchOutcome`: the classified result of fetching one id
//! - `ProgressEntry` / `EntryStatus`: what the progress ledger remembers per id

mod outcome;
mod progress;
mod record;

// Re-export main types
pub use outcome::FetchOutcome;
pub use progress::{EntryStatus, ProgressEntry};
pub use record::SellerRecord;
