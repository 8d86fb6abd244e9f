use std::sync::Arc;

use crate::error::{Error, Result};
use crate::github::PullRequestApi;
use crate::models::PullRequest;

/// Requests single pages of pull requests. The upstream ordering
/// (most recently updated first) is passed through untouched.
#[derive(Clone)]
pub struct Fetcher {
    api: Arc<dyn PullRequestApi>,
    page_size: u32,
}

impl Fetcher {
    pub fn new(api: Arc<dyn PullRequestApi>, page_size: u32) -> Self {
        Self { api, page_size }
    }

    pub async fn fetch_page(&self, page: u32) -> Result<Vec<PullRequest>> {
        if page == 0 {
            return Err(Error::InvalidPage(page));
        }

        let prs = self.api.list_pull_requests(page, self.page_size).await?;
        tracing::debug!("Page {} returned {} pull requests", page, prs.len());
        Ok(prs)
    }
}
