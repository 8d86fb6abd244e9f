pub mod api;
pub mod client;
pub mod rate_limit;

pub use api::PullRequestApi;
pub use client::GitHubClient;
pub use rate_limit::RateLimitStatus;
