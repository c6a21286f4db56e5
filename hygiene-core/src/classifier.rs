//! Direct-push classification for default-branch commits.
//!
//! A sampled commit counts as arriving through a pull request when its SHA
//! appears in any pull request's introduced-commit set. Everything else is a
//! direct push, including commits older than the first recorded pull request.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::{CommitRecord, PullRequestRecord, ratio};

/// Number of most recent commits examined per repository.
pub const COMMIT_SAMPLE_SIZE: usize = 100;

/// Outcome of classifying a commit sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectPushSummary {
    /// Sampled commits that no pull request introduced.
    pub direct_count: u64,
    /// Unique commits actually sampled.
    pub sampled_count: u64,
}

impl DirectPushSummary {
    /// Share of sampled commits pushed directly, undefined for an empty sample.
    pub fn ratio(&self) -> Option<f64> {
        ratio(self.direct_count, self.sampled_count)
    }
}

/// Classify the most recent commits against the known pull requests.
///
/// `commits` must be ordered most recent first; only the first
/// [`COMMIT_SAMPLE_SIZE`] entries are examined.
pub fn classify(commits: &[CommitRecord], pull_requests: &[PullRequestRecord]) -> DirectPushSummary {
    let via_pull_request: HashSet<&str> = pull_requests
        .iter()
        .flat_map(|pr| pr.commits.iter().map(String::as_str))
        .collect();

    let mut seen = HashSet::new();
    let mut summary = DirectPushSummary::default();
    for commit in commits.iter().take(COMMIT_SAMPLE_SIZE) {
        if !seen.insert(commit.sha.as_str()) {
            continue;
        }
        summary.sampled_count += 1;
        if !via_pull_request.contains(commit.sha.as_str()) {
            summary.direct_count += 1;
        }
    }

    summary
}
