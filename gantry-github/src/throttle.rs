//! Rate-limit handling
//!
//! GitHub answers throttled requests with 429, or with 403 plus either an
//! exhausted `x-ratelimit-remaining` (primary limit) or a "secondary rate
//! limit" message (abuse limit). [`classify`] recognizes those responses and
//! [`retry_delay`] reads how long to wait. Whether to actually retry is left
//! to a pluggable [`ThrottleHandler`].

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use std::time::Duration;
use tracing::info;

/// Retries the default handler allows before giving up
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Wait used when a throttled response carries no timing headers
const FALLBACK_DELAY: Duration = Duration::from_secs(60);

/// Which limit a throttled response hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    /// Primary (hourly quota) rate limit
    RateLimit,

    /// Secondary rate limit triggered by request bursts
    Abuse,
}

impl std::fmt::Display for LimitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LimitKind::RateLimit => write!(f, "rate limit"),
            LimitKind::Abuse => write!(f, "secondary rate limit"),
        }
    }
}

/// Decides whether a throttled request is retried
pub trait ThrottleHandler: Send + Sync {
    /// Called for every throttled response
    ///
    /// # Arguments
    /// * `kind` - The limit that was hit
    /// * `retry_after` - How long the platform asks the client to wait
    /// * `retry_count` - Retries already made for this request
    ///
    /// # Returns
    /// `true` to wait `retry_after` and resend, `false` to surface the error
    fn on_limit(&self, kind: LimitKind, retry_after: Duration, retry_count: u32) -> bool;
}

/// Retries every throttled request up to a fixed number of times
#[derive(Debug, Clone, Copy)]
pub struct RetryLimit {
    pub max_retries: u32,
}

impl Default for RetryLimit {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl ThrottleHandler for RetryLimit {
    fn on_limit(&self, kind: LimitKind, retry_after: Duration, retry_count: u32) -> bool {
        if retry_count < self.max_retries {
            info!(
                "Hit {}; retrying after {} seconds!",
                kind,
                retry_after.as_secs()
            );
            true
        } else {
            false
        }
    }
}

/// Determines whether a response was throttled
pub fn classify(status: StatusCode, headers: &HeaderMap, body: &str) -> Option<LimitKind> {
    let secondary = body.to_ascii_lowercase().contains("secondary rate limit");

    match status {
        StatusCode::TOO_MANY_REQUESTS if secondary => Some(LimitKind::Abuse),
        StatusCode::TOO_MANY_REQUESTS => Some(LimitKind::RateLimit),
        StatusCode::FORBIDDEN if header_str(headers, "x-ratelimit-remaining") == Some("0") => {
            Some(LimitKind::RateLimit)
        }
        StatusCode::FORBIDDEN if secondary || headers.contains_key(RETRY_AFTER) => {
            Some(LimitKind::Abuse)
        }
        _ => None,
    }
}

/// How long to wait before retrying a throttled request
///
/// Prefers `retry-after` (seconds), then `x-ratelimit-reset` (epoch seconds)
/// relative to `now`, then a fixed fallback.
pub fn retry_delay(headers: &HeaderMap, now: DateTime<Utc>) -> Duration {
    if let Some(secs) = header_str(headers, RETRY_AFTER.as_str()).and_then(|v| v.parse::<u64>().ok())
    {
        return Duration::from_secs(secs);
    }

    if let Some(reset) =
        header_str(headers, "x-ratelimit-reset").and_then(|v| v.parse::<i64>().ok())
    {
        return Duration::from_secs((reset - now.timestamp()).max(0) as u64);
    }

    FALLBACK_DELAY
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
