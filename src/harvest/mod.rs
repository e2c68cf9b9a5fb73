//! Harvest orchestration
//!
//! This module walks a seller-id range through the fetch client:
//! - Computing which ids still need fetching
//! - Dispatching them serially or in bounded concurrent batches
//! - Recording outcomes in the ledger and the result sink
//! - Stopping cleanly on interrupt

mod controller;
mod scheduler;
mod shutdown;

pub use controller::{FlushOnDrop, HarvestController, RunPhase};
pub use scheduler::{batches, pending_ids, RunPlan};
pub use shutdown::ShutdownSignal;

use crate::config::Config;
use crate::fetch::FetchClient;
use crate::output::RunSummary;
use crate::CensusError;

/// Runs a complete harvest for a validated configuration
///
/// # Arguments
///
/// * `config` - The configuration to run with
/// * `shutdown` - Signal that stops the run between batches
///
/// # Returns
///
/// * `Ok(RunSummary)` - The run finished or was interrupted cleanly
/// * `Err(CensusError)` - The ledger or result file could not be used
///
/// # Example
///
/// ```no_run
/// use seller_census::config::load_config;
/// use seller_census::harvest::{harvest, ShutdownSignal};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("census.toml"))?;
/// let summary = harvest(&config, ShutdownSignal::new()).await?;
/// println!("{}", summary);
/// # Ok(())
/// # }
/// ```
pub async fn harvest(config: &Config, shutdown: ShutdownSignal) -> Result<RunSummary, CensusError> {
    let client = FetchClient::from_config(config)?;
    let mut controller = HarvestController::open(client, config, shutdown)?;
    controller.run().await
}
