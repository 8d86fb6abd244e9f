use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;

use crate::config::{RepoSlug, DEFAULT_API_URL, DEFAULT_BASE_BRANCH};
use crate::error::{Error, Result};
use crate::github::api::PullRequestApi;
use crate::github::rate_limit::{unix_now, RateLimitStatus};
use crate::models::{Issue, PullRequest};

pub struct GitHubClient {
    client: Client,
    base_url: String,
    repo: RepoSlug,
    base_branch: String,
}

impl GitHubClient {
    pub fn new(token: &str, repo: RepoSlug) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static("meeting-notes-gen/0.1"),
        );

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: DEFAULT_API_URL.to_string(),
            repo,
            base_branch: DEFAULT_BASE_BRANCH.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Only pull requests merging into this branch are listed.
    pub fn with_base_branch(mut self, branch: impl Into<String>) -> Self {
        self.base_branch = branch.into();
        self
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.base_url, self.repo.owner, self.repo.name, path
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        tracing::debug!("Fetching: {}", url);
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        let limit = RateLimitStatus::from_headers(response.headers());
        if let Some(remaining) = limit.remaining {
            tracing::debug!("Rate limit remaining: {}", remaining);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if let Some(err) = limit.check(status, &body, unix_now()) {
                tracing::warn!("Rate limited while fetching {}", url);
                return Err(err);
            }
            return Err(Error::FetchFailed(format!("{} returned {} - {}", url, status, body)));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl PullRequestApi for GitHubClient {
    async fn list_pull_requests(&self, page: u32, per_page: u32) -> Result<Vec<PullRequest>> {
        let query = [
            ("state", "all".to_string()),
            ("base", self.base_branch.clone()),
            ("sort", "updated".to_string()),
            ("direction", "desc".to_string()),
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
        ];
        self.get_json(&self.repo_url("pulls"), &query).await
    }

    async fn get_pull_request(&self, number: u64) -> Result<PullRequest> {
        self.get_json(&self.repo_url(&format!("pulls/{}", number)), &[])
            .await
    }

    async fn get_issue(&self, number: u64) -> Result<Issue> {
        self.get_json(&self.repo_url(&format!("issues/{}", number)), &[])
            .await
    }
}
