use std::sync::Arc;

use crate::error::Result;
use crate::github::PullRequestApi;
use crate::models::{ConcludedBy, PullRequest};

/// Recovers who concluded a pull request, which the list view omits.
///
/// Merged pull requests are re-fetched in full; closed but unmerged ones
/// get their closer from the issue API. Open ones cost no request.
#[derive(Clone)]
pub struct Enricher {
    api: Arc<dyn PullRequestApi>,
}

impl Enricher {
    pub fn new(api: Arc<dyn PullRequestApi>) -> Self {
        Self { api }
    }

    pub async fn enrich(&self, pr: PullRequest) -> Result<PullRequest> {
        if pr.is_merged() {
            let mut full = self.api.get_pull_request(pr.number).await?;
            full.concluded_by = full
                .merged_by
                .as_ref()
                .map(|user| ConcludedBy::merged(user.login.clone()));
            return Ok(full);
        }

        if pr.is_closed_unmerged() {
            let issue = self.api.get_issue(pr.number).await?;
            let mut pr = pr;
            pr.concluded_by = issue.closed_by.map(|user| ConcludedBy::closed(user.login));
            return Ok(pr);
        }

        Ok(pr)
    }
}
