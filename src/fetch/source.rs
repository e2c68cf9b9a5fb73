//! The seam between the retry loop and an upstream
//!
//! A [`SellerSource`] performs exactly one attempt for one seller id and
//! classifies it. Retrying, backoff and the final [`FetchOutcome`] belong to
//! the client; sources only say what happened this time.
//!
//! [`FetchOutcome`]: crate::state::FetchOutcome

use crate::fetch::api::ApiSource;
use crate::fetch::page::PageSource;
use crate::fetch::FetchFailure;
use crate::state::SellerRecord;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;

/// A successful attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieved {
    /// A seller with at least one populated field
    Found(SellerRecord),

    /// The upstream confirmed there is no seller at this id
    Empty,
}

/// One upstream capable of looking up sellers by id
pub trait SellerSource: Send + Sync {
    /// The URL or endpoint an id is fetched from
    fn locator(&self, id: u64) -> String;

    /// Performs a single attempt against `locator`
    fn attempt(
        &self,
        id: u64,
        locator: &str,
    ) -> impl Future<Output = Result<Retrieved, FetchFailure>> + Send;
}

/// The upstream selected by configuration
#[derive(Debug, Clone)]
pub enum Upstream {
    Api(ApiSource),
    Page(PageSource),
}

impl SellerSource for Upstream {
    fn locator(&self, id: u64) -> String {
        match self {
            Upstream::Api(source) => source.locator(id),
            Upstream::Page(source) => source.locator(id),
        }
    }

    async fn attempt(&self, id: u64, locator: &str) -> Result<Retrieved, FetchFailure> {
        match self {
            Upstream::Api(source) => source.attempt(id, locator).await,
            Upstream::Page(source) => source.attempt(id, locator).await,
        }
    }
}

/// Maps the statuses both upstreams treat alike
///
/// Returns `None` for statuses the caller has to look at itself.
pub(crate) fn classify_common_status(
    status: StatusCode,
    headers: &HeaderMap,
) -> Option<FetchFailure> {
    match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => Some(FetchFailure::NotFound),
        StatusCode::TOO_MANY_REQUESTS => Some(FetchFailure::RateLimited {
            retry_after: headers
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| parse_retry_after(value, Utc::now())),
        }),
        _ => None,
    }
}

/// Parses a `Retry-After` header: delta seconds or an HTTP date
///
/// Dates in the past yield a zero wait.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let date = DateTime::parse_from_rfc2822(value).ok()?;
    let wait = date.with_timezone(&Utc) - now;
    Some(wait.to_std().unwrap_or(Duration::ZERO))
}
