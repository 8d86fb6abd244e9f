use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Issue, PullRequest};

/// The slice of the GitHub API the digest needs, scoped to one repository.
///
/// Every call may fail with `Error::RateLimited`, which callers treat as
/// fatal for the whole run.
#[async_trait]
pub trait PullRequestApi: Send + Sync {
    /// One page of pull requests targeting the configured base branch,
    /// most recently updated first.
    async fn list_pull_requests(&self, page: u32, per_page: u32) -> Result<Vec<PullRequest>>;

    async fn get_pull_request(&self, number: u64) -> Result<PullRequest>;

    async fn get_issue(&self, number: u64) -> Result<Issue>;
}
