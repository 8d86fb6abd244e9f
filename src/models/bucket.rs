use serde::Serialize;
use std::fmt;

use super::PullRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    New,
    Closed,
    Updated,
    NoMovement,
}

impl Bucket {
    /// Report order.
    pub const ALL: [Bucket; 4] = [Bucket::New, Bucket::Closed, Bucket::Updated, Bucket::NoMovement];

    pub fn heading(&self) -> &'static str {
        match self {
            Bucket::New => "new",
            Bucket::Closed => "closed",
            Bucket::Updated => "updated",
            Bucket::NoMovement => "no movement",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.heading())
    }
}

/// The four report lists, each in the order records were classified.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Buckets {
    pub new: Vec<PullRequest>,
    pub closed: Vec<PullRequest>,
    pub updated: Vec<PullRequest>,
    pub no_movement: Vec<PullRequest>,
}

impl Buckets {
    pub fn push(&mut self, bucket: Bucket, pr: PullRequest) {
        self.get_mut(bucket).push(pr);
    }

    pub fn get(&self, bucket: Bucket) -> &[PullRequest] {
        match bucket {
            Bucket::New => &self.new,
            Bucket::Closed => &self.closed,
            Bucket::Updated => &self.updated,
            Bucket::NoMovement => &self.no_movement,
        }
    }

    fn get_mut(&mut self, bucket: Bucket) -> &mut Vec<PullRequest> {
        match bucket {
            Bucket::New => &mut self.new,
            Bucket::Closed => &mut self.closed,
            Bucket::Updated => &mut self.updated,
            Bucket::NoMovement => &mut self.no_movement,
        }
    }

    pub fn total(&self) -> usize {
        Bucket::ALL.iter().map(|b| self.get(*b).len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Bucket, &[PullRequest])> {
        Bucket::ALL.into_iter().map(move |b| (b, self.get(b)))
    }
}
