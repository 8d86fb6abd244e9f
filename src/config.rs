use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_LABEL: &str = "performance";
pub const DEFAULT_BASE_BRANCH: &str = "main";
pub const PAGE_SIZE: u32 = 100;

/// Items untouched for longer than this before `since` are dropped from the report.
pub const STALE_LOOKBACK_DAYS: i64 = 60;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
pub struct Config {
    pub github_token: String,
    pub api_url: String,
    pub concurrency_limit: usize,
    pub run_timeout: Duration,
}

impl Config {
    /// Reads settings from the environment. A token given on the command
    /// line takes precedence over `GITHUB_TOKEN`.
    pub fn load(token: Option<String>) -> Result<Self> {
        let github_token = match token {
            Some(token) => token,
            None => env::var("GITHUB_TOKEN").map_err(|_| {
                Error::Config("GITHUB_TOKEN environment variable not set".to_string())
            })?,
        };
        if github_token.trim().is_empty() {
            return Err(Error::Config("GitHub token is empty".to_string()));
        }

        let api_url = env::var("GITHUB_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let concurrency_limit = parse_or(env::var("CONCURRENCY_LIMIT").ok(), 5);
        let run_timeout = Duration::from_secs(parse_or(env::var("RUN_TIMEOUT_SECS").ok(), 600));

        Ok(Self {
            github_token,
            api_url: api_url.trim_end_matches('/').to_string(),
            concurrency_limit,
            run_timeout,
        })
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    #[default]
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    pub fn from_flags(debug: bool, trace: bool) -> Self {
        match (debug, trace) {
            (_, true) => Verbosity::Trace,
            (true, false) => Verbosity::Debug,
            _ => Verbosity::Info,
        }
    }

    /// Filter directive for this crate's own log target.
    pub fn directive(&self) -> &'static str {
        match self {
            Verbosity::Info => "meeting_notes_gen=info",
            Verbosity::Debug => "meeting_notes_gen=debug",
            Verbosity::Trace => "meeting_notes_gen=trace",
        }
    }
}

/// How the fan-in stage orders records before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanInOrder {
    /// Classify records as they arrive from any page.
    #[default]
    Arrival,
    /// Buffer records and classify them by page, then by position in the page.
    PageOrder,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub pages: u32,
    pub page_size: u32,
    pub concurrency_limit: usize,
    pub run_timeout: Duration,
    pub label: String,
    pub ordering: FanInOrder,
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pages: 5,
            page_size: PAGE_SIZE,
            concurrency_limit: 5,
            run_timeout: Duration::from_secs(600),
            label: DEFAULT_LABEL.to_string(),
            ordering: FanInOrder::Arrival,
            show_progress: false,
        }
    }
}

impl From<&Config> for PipelineConfig {
    fn from(config: &Config) -> Self {
        Self {
            concurrency_limit: config.concurrency_limit.max(1),
            run_timeout: config.run_timeout,
            ..Self::default()
        }
    }
}

/// Repository in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl RepoSlug {
    pub fn parse(value: &str) -> Result<Self> {
        let (owner, name) = value
            .trim()
            .split_once('/')
            .ok_or_else(|| Error::InvalidRepo(value.to_string()))?;

        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(Error::InvalidRepo(value.to_string()));
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoSlug {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// The reporting period: everything is judged against `since`, and
/// untouched items older than the stale boundary are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportWindow {
    since: DateTime<Utc>,
}

impl ReportWindow {
    pub fn new(since: DateTime<Utc>) -> Self {
        Self { since }
    }

    /// Parses a `YYYY-MM-DD` date as midnight UTC.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.is_empty() {
            return Err(Error::InvalidWindow("no since date given".to_string()));
        }

        let date = NaiveDate::parse_from_str(value, DATE_FORMAT)
            .map_err(|e| Error::InvalidWindow(format!("{:?}: {}", value, e)))?;
        Ok(Self::new(date.and_time(NaiveTime::default()).and_utc()))
    }

    /// Window starting `days` before `now`, truncated to midnight.
    pub fn days_before(now: DateTime<Utc>, days: i64) -> Self {
        let date = (now - ChronoDuration::days(days)).date_naive();
        Self::new(date.and_time(NaiveTime::default()).and_utc())
    }

    pub fn since(&self) -> DateTime<Utc> {
        self.since
    }

    pub fn stale_boundary(&self) -> DateTime<Utc> {
        self.since - ChronoDuration::days(STALE_LOOKBACK_DAYS)
    }
}

impl fmt::Display for ReportWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.since.format(DATE_FORMAT))
    }
}
