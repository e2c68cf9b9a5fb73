//! Bounded-retry fetch client
//!
//! Turns one seller id into exactly one [`FetchOutcome`], driving a
//! [`SellerSource`] through the retry budget of a [`RetryPolicy`].

use crate::config::{Config, FetchMode, UserAgentConfig};
use crate::fetch::api::ApiSource;
use crate::fetch::page::PageSource;
use crate::fetch::retry::{RetryPolicy, Sleeper, TokioSleeper};
use crate::fetch::source::{Retrieved, SellerSource, Upstream};
use crate::fetch::FetchFailure;
use crate::state::FetchOutcome;
use crate::storage::DiagnosticStore;
use crate::ConfigError;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;

/// Anything that resolves a seller id to an outcome
///
/// The harvest controller only depends on this, so it can be driven by a
/// scripted fetcher in tests.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, id: u64) -> impl Future<Output = FetchOutcome> + Send;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `timeout` - Per-attempt request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// A source plus its retry policy
#[derive(Debug, Clone)]
pub struct FetchClient<S, Z = TokioSleeper> {
    source: S,
    policy: RetryPolicy,
    sleeper: Z,
}

impl<S: SellerSource> FetchClient<S, TokioSleeper> {
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self::with_sleeper(source, policy, TokioSleeper)
    }
}

impl<S: SellerSource, Z: Sleeper> FetchClient<S, Z> {
    pub fn with_sleeper(source: S, policy: RetryPolicy, sleeper: Z) -> Self {
        Self {
            source,
            policy,
            sleeper,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches one id, retrying until it settles
    ///
    /// Never returns an error: every failure ends up in the outcome.
    pub async fn fetch_id(&self, id: u64) -> FetchOutcome {
        let locator = self.source.locator(id);
        let mut schedule = self.policy.schedule();

        loop {
            let failure = match self.source.attempt(id, &locator).await {
                Ok(Retrieved::Found(record)) => return FetchOutcome::Found(record),
                Ok(Retrieved::Empty) | Err(FetchFailure::NotFound) => {
                    return FetchOutcome::Empty(locator)
                }
                Err(failure) => failure,
            };

            match schedule.next_delay(&failure) {
                Some(delay) => {
                    tracing::debug!(
                        id,
                        attempt = schedule.attempts(),
                        delay_ms = delay.as_millis() as u64,
                        "Retrying after {}",
                        failure
                    );
                    self.sleeper.sleep(delay).await;
                }
                None => {
                    tracing::warn!(id, attempts = schedule.attempts(), "Giving up: {}", failure);
                    return failure.into_outcome(schedule.attempts());
                }
            }
        }
    }
}

impl<S: SellerSource, Z: Sleeper> Fetcher for FetchClient<S, Z> {
    fn fetch(&self, id: u64) -> impl Future<Output = FetchOutcome> + Send {
        self.fetch_id(id)
    }
}

impl FetchClient<Upstream, TokioSleeper> {
    /// Builds the client for the configured fetch mode
    pub fn from_config(config: &Config) -> Result<Self, crate::CensusError> {
        let http = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.fetch.timeout_secs),
        )?;

        let upstream = match config.fetch.mode {
            FetchMode::Api => {
                let token = config
                    .api
                    .resolve_token()
                    .ok_or_else(|| ConfigError::MissingToken(config.api.token_env.clone()))?;
                Upstream::Api(ApiSource::new(http, &config.api.base_url, token))
            }
            FetchMode::Html => {
                let mut source = PageSource::new(http, &config.html.url_template);
                if let Some(dir) = &config.html.debug_dir {
                    source = source.with_diagnostics(DiagnosticStore::new(dir));
                }
                Upstream::Page(source)
            }
        };

        Ok(Self::new(upstream, RetryPolicy::from_config(&config.fetch)))
    }
}
