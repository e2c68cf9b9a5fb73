//! Retry budget and backoff policies
//!
//! Each failure kind maps to one [`Backoff`]: linear for transport errors and
//! unexpected statuses, server-directed (with an exponential fallback) for
//! rate limiting. A [`RetrySchedule`] tracks one identifier's attempts and
//! never hands out a delay shorter than the previous one.

use crate::config::FetchConfig;
use crate::fetch::FetchFailure;
use std::future::Future;
use std::time::Duration;

/// How long to wait before the next attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base * attempt`
    Linear { base: Duration },

    /// `base * 2^(attempt - 1)`
    Exponential { base: Duration },

    /// The server's hint when present, otherwise exponential from `fallback_base`
    ServerDirected { fallback_base: Duration },
}

impl Backoff {
    /// Delay after the given (1-based) failed attempt
    pub fn delay(&self, attempt: u32, hint: Option<Duration>) -> Duration {
        let attempt = attempt.max(1);
        match self {
            Backoff::Linear { base } => base.saturating_mul(attempt),
            Backoff::Exponential { base } => exponential(*base, attempt),
            Backoff::ServerDirected { fallback_base } => {
                hint.unwrap_or_else(|| exponential(*fallback_base, attempt))
            }
        }
    }
}

fn exponential(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt - 1);
    base.saturating_mul(factor)
}

/// Retry rules shared by every identifier of a run
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts per identifier, including the first
    pub max_attempts: u32,

    /// Backoff for transport errors, unexpected statuses and anomalous pages
    pub transient: Backoff,

    /// Backoff for HTTP 429
    pub rate_limited: Backoff,

    /// How many times a blocked page is retried before giving up
    pub blocked_retries: u32,

    /// Cap on any single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            transient: Backoff::Linear {
                base: Duration::from_millis(config.base_delay_ms),
            },
            rate_limited: Backoff::ServerDirected {
                fallback_base: Duration::from_millis(config.rate_limit_base_ms),
            },
            blocked_retries: 1,
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Starts tracking a fresh identifier
    pub fn schedule(&self) -> RetrySchedule<'_> {
        RetrySchedule {
            policy: self,
            attempts: 0,
            blocked: 0,
            last_delay: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

/// Attempt bookkeeping for a single identifier
#[derive(Debug)]
pub struct RetrySchedule<'a> {
    policy: &'a RetryPolicy,
    attempts: u32,
    blocked: u32,
    last_delay: Duration,
}

impl RetrySchedule<'_> {
    /// Number of attempts recorded so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Records a failed attempt and returns the delay before retrying, or
    /// `None` when the failure is terminal or the budget is spent
    pub fn next_delay(&mut self, failure: &FetchFailure) -> Option<Duration> {
        self.attempts += 1;

        let (backoff, hint) = match failure {
            FetchFailure::NotFound | FetchFailure::Fatal { .. } => return None,
            FetchFailure::Blocked { .. } => {
                self.blocked += 1;
                if self.blocked > self.policy.blocked_retries {
                    return None;
                }
                (self.policy.transient, None)
            }
            FetchFailure::RateLimited { retry_after } => (self.policy.rate_limited, *retry_after),
            FetchFailure::TransientTransport { .. }
            | FetchFailure::UnexpectedStatus { .. }
            | FetchFailure::Anomaly { .. } => (self.policy.transient, None),
        };

        if self.attempts >= self.policy.max_attempts {
            return None;
        }

        let delay = backoff
            .delay(self.attempts, hint)
            .min(self.policy.max_delay)
            .max(self.last_delay);
        self.last_delay = delay;
        Some(delay)
    }
}

/// Suspends the current task between attempts
///
/// Injected so tests can observe delays without waiting for them.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, delay: Duration) -> impl Future<Output = ()> + Send;
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, delay: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            transient: Backoff::Linear {
                base: Duration::from_secs(2),
            },
            rate_limited: Backoff::ServerDirected {
                fallback_base: Duration::from_secs(5),
            },
            blocked_retries: 1,
            max_delay: Duration::from_secs(60),
        }
    }

    fn transport() -> FetchFailure {
        FetchFailure::TransientTransport {
            message: "connection reset".to_string(),
        }
    }

    #[test]
    fn test_linear_backoff() {
        let backoff = Backoff::Linear {
            base: Duration::from_secs(2),
        };
        assert_eq!(backoff.delay(1, None), Duration::from_secs(2));
        assert_eq!(backoff.delay(3, None), Duration::from_secs(6));
    }

    #[test]
    fn test_exponential_backoff() {
        let backoff = Backoff::Exponential {
            base: Duration::from_secs(5),
        };
        assert_eq!(backoff.delay(1, None), Duration::from_secs(5));
        assert_eq!(backoff.delay(2, None), Duration::from_secs(10));
        assert_eq!(backoff.delay(3, None), Duration::from_secs(20));
    }

    #[test]
    fn test_server_directed_prefers_hint() {
        let backoff = Backoff::ServerDirected {
            fallback_base: Duration::from_secs(5),
        };
        assert_eq!(
            backoff.delay(2, Some(Duration::from_secs(42))),
            Duration::from_secs(42)
        );
        assert_eq!(backoff.delay(2, None), Duration::from_secs(10));
    }

    #[test]
    fn test_budget_exhaustion() {
        let policy = policy(3);
        let mut schedule = policy.schedule();
        assert!(schedule.next_delay(&transport()).is_some());
        assert!(schedule.next_delay(&transport()).is_some());
        assert!(schedule.next_delay(&transport()).is_none());
        assert_eq!(schedule.attempts(), 3);
    }

    #[test]
    fn test_not_found_and_fatal_never_retry() {
        let policy = policy(3);
        assert!(policy.schedule().next_delay(&FetchFailure::NotFound).is_none());
        assert!(policy
            .schedule()
            .next_delay(&FetchFailure::Fatal {
                reason: "bad token".to_string()
            })
            .is_none());
    }

    #[test]
    fn test_blocked_retried_once() {
        let policy = policy(5);
        let blocked = FetchFailure::Blocked {
            reason: "captcha".to_string(),
        };
        let mut schedule = policy.schedule();
        assert!(schedule.next_delay(&blocked).is_some());
        assert!(schedule.next_delay(&blocked).is_none());
    }

    #[test]
    fn test_delays_never_decrease() {
        let policy = policy(4);
        let mut schedule = policy.schedule();

        let first = schedule
            .next_delay(&FetchFailure::RateLimited {
                retry_after: Some(Duration::from_secs(30)),
            })
            .unwrap();
        let second = schedule.next_delay(&transport()).unwrap();
        let third = schedule.next_delay(&transport()).unwrap();

        assert_eq!(first, Duration::from_secs(30));
        assert!(second >= first);
        assert!(third >= second);
    }

    #[test]
    fn test_server_hint_is_capped() {
        let policy = policy(3);
        let mut schedule = policy.schedule();
        let delay = schedule
            .next_delay(&FetchFailure::RateLimited {
                retry_after: Some(Duration::from_secs(3600)),
            })
            .unwrap();
        assert_eq!(delay, Duration::from_secs(60));
    }
}
