//! Exponential backoff between record lookup attempts.
//!
//! Rate-limit responses back off from a larger base than transport
//! failures, since the upstream needs longer to drain its request budget:
//!
//! | attempt | rate limited | transport error |
//! |---------|--------------|-----------------|
//! | 0       | 6s           | 2s              |
//! | 1       | 12s          | 4s              |
//! | 2       | 24s          | 8s              |
//! | 3       | 48s          | 16s             |
//! | 4       | 96s          | 32s             |
//!
//! There is no jitter and no cap. The total wait is bounded only by the
//! fetcher's `max_retries`.

use std::time::Duration;

/// Base wait for HTTP 429 responses, in seconds.
pub const RATE_LIMIT_BASE_SECS: u64 = 6;

/// Base wait for timeouts, connection errors, and unexpected statuses.
pub const TRANSPORT_BASE_SECS: u64 = 2;

/// Which kind of transient failure is being backed off from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The upstream answered HTTP 429.
    RateLimited,
    /// The request failed below the HTTP layer or returned an unexpected
    /// status.
    TransportError,
}

impl FailureKind {
    const fn base_secs(self) -> u64 {
        match self {
            Self::RateLimited => RATE_LIMIT_BASE_SECS,
            Self::TransportError => TRANSPORT_BASE_SECS,
        }
    }
}

/// Returns how long to wait after the 0-based `attempt` failed with `kind`.
///
/// Saturates at [`Duration::MAX`] rather than overflowing for absurdly
/// large attempt numbers.
#[must_use]
pub fn delay(attempt: u32, kind: FailureKind) -> Duration {
    let secs = 1u64
        .checked_shl(attempt)
        .and_then(|factor| kind.base_secs().checked_mul(factor));

    secs.map_or(Duration::MAX, Duration::from_secs)
}
