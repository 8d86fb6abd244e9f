use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    #[serde(default)]
    pub company: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

/// A pull request as returned by the GitHub pulls API.
///
/// The list endpoint leaves `merged_by` and `mergeable` empty; the
/// enricher fills `concluded_by` from a follow-up request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub user: User,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub mergeable: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub merged_by: Option<User>,
    #[serde(default, skip_deserializing)]
    pub concluded_by: Option<ConcludedBy>,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }

    pub fn is_closed_unmerged(&self) -> bool {
        self.closed_at.is_some() && self.merged_at.is_none()
    }

    /// Case-insensitive label match, folding non-ASCII letters too.
    pub fn has_label(&self, name: &str) -> bool {
        let wanted = name.to_lowercase();
        self.labels.iter().any(|l| l.name.to_lowercase() == wanted)
    }

    /// Exact label match, as GitHub bots apply these.
    pub fn has_exact_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l.name == name)
    }

    /// Author login, followed by their company when known.
    pub fn submitter(&self) -> String {
        match self.user.company.as_deref().map(str::trim) {
            Some(company) if !company.is_empty() => format!("{} ({})", self.user.login, company),
            _ => self.user.login.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    Merged,
    ClosedWithoutMerging,
}

/// Who finished a pull request off, and how.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcludedBy {
    pub actor: String,
    pub reason: Conclusion,
}

impl ConcludedBy {
    pub fn merged(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            reason: Conclusion::Merged,
        }
    }

    pub fn closed(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            reason: Conclusion::ClosedWithoutMerging,
        }
    }
}

/// The issue side of a pull request; only fetched for `closed_by`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub closed_by: Option<User>,
}
