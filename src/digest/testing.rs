//! In-memory stand-in for the GitHub API used by the digest tests.

use async_trait::async_trait;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::github::PullRequestApi;
use crate::models::{Issue, Label, PullRequest, User};

/// An open pull request carrying the "performance" label and no timestamps.
pub fn pr(number: u64) -> PullRequest {
    PullRequest {
        number,
        title: format!("PR {}", number),
        user: User {
            login: "author".to_string(),
            company: None,
        },
        draft: false,
        mergeable: None,
        created_at: None,
        updated_at: None,
        closed_at: None,
        merged_at: None,
        labels: vec![Label {
            name: "performance".to_string(),
        }],
        merged_by: None,
        concluded_by: None,
    }
}

#[derive(Default)]
pub struct FakeApi {
    pages: HashMap<u32, Vec<PullRequest>>,
    full: HashMap<u64, PullRequest>,
    closers: HashMap<u64, String>,
    rate_limited_pages: HashSet<u32>,
    hanging_pages: HashSet<u32>,
    rate_limit_follow_ups: bool,
    max_latency_ms: u64,
    follow_ups: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl FakeApi {
    pub fn with_page(mut self, page: u32, prs: Vec<PullRequest>) -> Self {
        self.pages.insert(page, prs);
        self
    }

    pub fn with_full(mut self, pr: PullRequest) -> Self {
        self.full.insert(pr.number, pr);
        self
    }

    pub fn with_closer(mut self, number: u64, login: &str) -> Self {
        self.closers.insert(number, login.to_string());
        self
    }

    pub fn rate_limit_page(mut self, page: u32) -> Self {
        self.rate_limited_pages.insert(page);
        self
    }

    pub fn hang_page(mut self, page: u32) -> Self {
        self.hanging_pages.insert(page);
        self
    }

    pub fn rate_limit_follow_ups(mut self) -> Self {
        self.rate_limit_follow_ups = true;
        self
    }

    /// Every call sleeps a random time up to this bound.
    pub fn with_latency(mut self, max_ms: u64) -> Self {
        self.max_latency_ms = max_ms;
        self
    }

    pub fn follow_up_calls(&self) -> usize {
        self.follow_ups.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn latency(&self) {
        if self.max_latency_ms == 0 {
            return;
        }
        let ms = rand::thread_rng().gen_range(0..=self.max_latency_ms);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    fn listed(&self, number: u64) -> Option<PullRequest> {
        self.pages
            .values()
            .flatten()
            .find(|pr| pr.number == number)
            .cloned()
    }
}

#[async_trait]
impl PullRequestApi for FakeApi {
    async fn list_pull_requests(&self, page: u32, _per_page: u32) -> Result<Vec<PullRequest>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        self.latency().await;
        if self.hanging_pages.contains(&page) {
            std::future::pending::<()>().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.rate_limited_pages.contains(&page) {
            return Err(Error::RateLimited(60));
        }
        Ok(self.pages.get(&page).cloned().unwrap_or_default())
    }

    async fn get_pull_request(&self, number: u64) -> Result<PullRequest> {
        self.follow_ups.fetch_add(1, Ordering::SeqCst);
        self.latency().await;
        if self.rate_limit_follow_ups {
            return Err(Error::RateLimited(0));
        }

        if let Some(full) = self.full.get(&number) {
            return Ok(full.clone());
        }
        let mut pr = self
            .listed(number)
            .ok_or_else(|| Error::FetchFailed(format!("pull request {} not found", number)))?;
        pr.merged_by = Some(User {
            login: "merger".to_string(),
            company: None,
        });
        Ok(pr)
    }

    async fn get_issue(&self, number: u64) -> Result<Issue> {
        self.follow_ups.fetch_add(1, Ordering::SeqCst);
        self.latency().await;
        if self.rate_limit_follow_ups {
            return Err(Error::RateLimited(0));
        }

        let login = self
            .closers
            .get(&number)
            .cloned()
            .unwrap_or_else(|| "closer".to_string());
        Ok(Issue {
            number,
            closed_by: Some(User {
                login,
                company: None,
            }),
        })
    }
}
