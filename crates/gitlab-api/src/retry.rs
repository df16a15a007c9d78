//! Bounded retry for GitLab requests.

use reqwest::{Method, StatusCode};
use std::time::Duration;

/// Statuses worth retrying; everything else fails on the first answer.
const RETRYABLE_STATUSES: [u16; 7] = [408, 413, 429, 500, 502, 503, 504];

/// Retry configuration for API calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub limit: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            limit: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Policy with the default delays and the given retry limit.
    #[must_use]
    pub fn with_limit(limit: u32) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self::with_limit(0)
    }

    /// Whether a response with `status` should be retried.
    #[must_use]
    pub fn is_retryable_status(status: StatusCode) -> bool {
        RETRYABLE_STATUSES.contains(&status.as_u16())
    }

    /// Whether a request with `method` may be sent again after a failure.
    ///
    /// `POST` is excluded: a create that timed out may already have been
    /// committed, and sending it again would duplicate the issue or note.
    #[must_use]
    pub fn is_retryable_method(method: &Method) -> bool {
        matches!(
            *method,
            Method::GET
                | Method::PUT
                | Method::HEAD
                | Method::DELETE
                | Method::OPTIONS
                | Method::TRACE
        )
    }

    /// Delay before retry number `retry` (1-based), doubling and capped.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(retry - 1);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}
