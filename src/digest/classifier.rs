use chrono::{DateTime, Utc};

use crate::config::ReportWindow;
use crate::models::{Bucket, PullRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// Missing the label the report is about.
    Unlabeled,
    /// Not touched since before the stale boundary.
    Stale,
    /// Merged or closed before the window, so nothing to report.
    Concluded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Bucket(Bucket),
    Discard(DiscardReason),
}

/// Sorts pull requests into report buckets relative to one fixed window.
///
/// Rules are checked in order and the first match wins: created in the
/// window, then concluded in the window, then updated in the window, then
/// the stale cutoff, and finally still open.
#[derive(Debug, Clone)]
pub struct Classifier {
    label: String,
    since: DateTime<Utc>,
    stale_boundary: DateTime<Utc>,
}

impl Classifier {
    pub fn new(label: impl Into<String>, window: &ReportWindow) -> Self {
        Self {
            label: label.into(),
            since: window.since(),
            stale_boundary: window.stale_boundary(),
        }
    }

    pub fn classify(&self, pr: &PullRequest) -> Classification {
        if !pr.has_label(&self.label) {
            return Classification::Discard(DiscardReason::Unlabeled);
        }

        let after_since = |ts: Option<DateTime<Utc>>| ts.is_some_and(|t| t > self.since);

        if after_since(pr.created_at) {
            Classification::Bucket(Bucket::New)
        } else if after_since(pr.closed_at) || after_since(pr.merged_at) {
            Classification::Bucket(Bucket::Closed)
        } else if after_since(pr.updated_at) {
            Classification::Bucket(Bucket::Updated)
        } else if pr.updated_at.map_or(true, |t| t < self.stale_boundary) {
            // A missing update time counts as stale.
            Classification::Discard(DiscardReason::Stale)
        } else if pr.merged_at.is_none() && pr.closed_at.is_none() {
            Classification::Bucket(Bucket::NoMovement)
        } else {
            Classification::Discard(DiscardReason::Concluded)
        }
    }
}
