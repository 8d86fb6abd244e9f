use reqwest::header::HeaderMap;
use reqwest::StatusCode;

use crate::error::Error;

/// Quota information GitHub attaches to every API response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RateLimitStatus {
    pub remaining: Option<u32>,
    /// Unix timestamp at which the quota refills.
    pub reset: Option<u64>,
}

impl RateLimitStatus {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
        };

        Self {
            remaining: header("x-ratelimit-remaining").and_then(|v| v.parse().ok()),
            reset: header("x-ratelimit-reset").and_then(|v| v.parse().ok()),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    pub fn seconds_until_reset(&self, now: u64) -> u64 {
        self.reset.map(|reset| reset.saturating_sub(now)).unwrap_or(0)
    }

    /// Decides whether a failed response was throttling. Primary limits
    /// show up as an exhausted quota, secondary limits only in the body.
    pub fn check(&self, status: StatusCode, body: &str, now: u64) -> Option<Error> {
        let throttled = match status {
            StatusCode::TOO_MANY_REQUESTS => true,
            StatusCode::FORBIDDEN => {
                self.is_exhausted() || body.to_lowercase().contains("rate limit")
            }
            _ => false,
        };

        throttled.then(|| Error::RateLimited(self.seconds_until_reset(now)))
    }
}

pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
