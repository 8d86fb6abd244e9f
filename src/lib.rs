pub mod config;
pub mod error;
pub mod models;
pub mod github;
pub mod digest;
pub mod render;

pub use config::{Config, PipelineConfig, RepoSlug, ReportWindow};
pub use error::{Error, Result};
pub use github::{GitHubClient, PullRequestApi};
pub use digest::Pipeline;
pub use render::{render, Digest, OutputFormat};
