use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Rate limit exceeded, resets in {0} seconds")]
    RateLimited(u64),

    #[error("GitHub API request failed: {0}")]
    FetchFailed(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to parse response: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid reporting window: {0}")]
    InvalidWindow(String),

    #[error("Invalid page number {0}, pages start at 1")]
    InvalidPage(u32),

    #[error("Invalid repository {0:?}, expected owner/name")]
    InvalidRepo(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Run timed out after {0:?}")]
    Timeout(Duration),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Page task failed: {0}")]
    TaskFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited(_))
    }

    /// Upstream failures other than throttling.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Error::FetchFailed(_) | Error::Network(_) | Error::Serialization(_)
        )
    }

    /// Short name of the failure class, used for the final error line.
    pub fn class(&self) -> &'static str {
        match self {
            Error::RateLimited(_) => "rate limited",
            e if e.is_fetch_failure() => "fetch failed",
            Error::InvalidWindow(_) => "invalid window",
            Error::InvalidPage(_) | Error::InvalidRepo(_) | Error::Config(_) => "invalid configuration",
            Error::Timeout(_) => "timed out",
            Error::Cancelled => "cancelled",
            _ => "internal error",
        }
    }
}
