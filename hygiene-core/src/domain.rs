//! Domain entities for repository hygiene scoring.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A commit on a repository's default branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Content hash of the commit.
    pub sha: String,
    /// Author timestamp.
    pub authored_at: DateTime<Utc>,
}

/// Lifecycle state of a pull request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestState {
    /// Still open.
    Open,
    /// Closed without being merged.
    Closed,
    /// Merged into its base branch.
    Merged,
}

/// A pull request as reported by the hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRecord {
    /// Pull request number.
    pub number: u64,
    /// Current state.
    pub state: PullRequestState,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Merge timestamp, if merged.
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    /// Title line.
    #[serde(default)]
    pub title: String,
    /// Body text, possibly empty.
    #[serde(default)]
    pub description: String,
    /// Identifiers of the commits the pull request introduced.
    #[serde(default)]
    pub commits: BTreeSet<String>,
    /// Identities that left a review.
    #[serde(default)]
    pub reviewers: BTreeSet<String>,
    /// Identities that approved.
    #[serde(default)]
    pub approvers: BTreeSet<String>,
    /// Identity that opened the pull request.
    pub author: String,
    /// Issue and review comments.
    #[serde(default)]
    pub comments: u64,
    /// Files touched.
    #[serde(default)]
    pub changed_files: u64,
    /// Lines added.
    #[serde(default)]
    pub additions: u64,
    /// Lines removed.
    #[serde(default)]
    pub deletions: u64,
}

impl PullRequestRecord {
    /// Whether the author approved their own pull request.
    pub fn is_self_approved(&self) -> bool {
        self.approvers.contains(&self.author)
    }

    /// Distinct reviewers and approvers other than the author.
    pub fn external_reviewers(&self) -> BTreeSet<&str> {
        self.reviewers
            .iter()
            .chain(self.approvers.iter())
            .filter(|identity| **identity != self.author)
            .map(String::as_str)
            .collect()
    }
}

/// Metrics for one repository; the sole input to the scoring engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryMetricsSnapshot {
    /// Open plus closed pull requests.
    pub total_prs: u64,
    /// Open pull requests.
    pub open_prs: u64,
    /// Closed (including merged) pull requests.
    pub closed_prs: u64,
    /// Commits on the default branch.
    pub total_commits: u64,
    /// Whole days since the most recent commit, if any commit exists.
    pub last_commit_age_days: Option<i64>,
    /// Share of sampled commits pushed directly, if any were sampled.
    pub direct_push_ratio: Option<f64>,
    /// Number of distinct contributors.
    pub contributors_count: u64,
    /// Analyzed pull requests approved by their own author.
    pub self_approved_prs: u64,
    /// Pull requests that went through review analysis.
    pub total_analyzed_prs: u64,
    /// Analyzed pull requests carrying a meaningful description.
    pub prs_with_description: u64,
    /// Analyzed pull requests reviewed by someone other than the author.
    pub prs_reviewed_by_others: u64,
}

impl RepositoryMetricsSnapshot {
    /// Share of analyzed pull requests with a description.
    pub fn description_ratio(&self) -> Option<f64> {
        ratio(self.prs_with_description, self.total_analyzed_prs)
    }

    /// Share of analyzed pull requests approved by their author.
    pub fn self_approval_ratio(&self) -> Option<f64> {
        ratio(self.self_approved_prs, self.total_analyzed_prs)
    }

    /// Share of analyzed pull requests reviewed by someone else.
    pub fn external_review_ratio(&self) -> Option<f64> {
        ratio(self.prs_reviewed_by_others, self.total_analyzed_prs)
    }

    /// Direct push ratio with non-finite values dropped and the rest clamped to `[0, 1]`.
    pub fn sanitized_direct_push_ratio(&self) -> Option<f64> {
        self.direct_push_ratio
            .filter(|value| value.is_finite())
            .map(|value| value.clamp(0.0, 1.0))
    }
}

/// Divide two counts, yielding `None` when the denominator is zero.
pub fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        return None;
    }
    Some(numerator as f64 / denominator as f64)
}

/// Points removed by a single rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDeduction {
    /// Catalogue key of the rule.
    pub rule: String,
    /// Points subtracted from the base score.
    pub points: u32,
}

/// Score and explanation for one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringResult {
    /// Quality score, 0-100.
    pub score: u8,
    /// One line per evaluated rule, in catalogue order.
    pub justification: Vec<String>,
    /// Rules that fired and what they cost.
    pub deductions: Vec<RuleDeduction>,
}

impl ScoringResult {
    /// Join the justification lines into a single sentence-per-line paragraph.
    pub fn justification_text(&self) -> String {
        if self.justification.is_empty() {
            return "No scoring rules were evaluated.".to_string();
        }
        format!("{}.", self.justification.join(". "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pull_request(author: &str, reviewers: &[&str], approvers: &[&str]) -> PullRequestRecord {
        PullRequestRecord {
            number: 1,
            state: PullRequestState::Merged,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            merged_at: None,
            title: String::new(),
            description: String::new(),
            commits: BTreeSet::new(),
            reviewers: reviewers.iter().map(|s| s.to_string()).collect(),
            approvers: approvers.iter().map(|s| s.to_string()).collect(),
            author: author.to_string(),
            comments: 0,
            changed_files: 0,
            additions: 0,
            deletions: 0,
        }
    }

    #[test]
    fn ratio_is_undefined_for_zero_denominator() {
        assert_eq!(ratio(0, 0), None);
        assert_eq!(ratio(3, 0), None);
        assert_eq!(ratio(1, 4), Some(0.25));
    }

    #[test]
    fn snapshot_ratios_follow_analyzed_prs() {
        let snapshot = RepositoryMetricsSnapshot {
            total_analyzed_prs: 10,
            prs_with_description: 3,
            self_approved_prs: 7,
            prs_reviewed_by_others: 1,
            ..Default::default()
        };
        assert_eq!(snapshot.description_ratio(), Some(0.3));
        assert_eq!(snapshot.self_approval_ratio(), Some(0.7));
        assert_eq!(snapshot.external_review_ratio(), Some(0.1));

        let empty = RepositoryMetricsSnapshot::default();
        assert_eq!(empty.description_ratio(), None);
        assert_eq!(empty.self_approval_ratio(), None);
        assert_eq!(empty.external_review_ratio(), None);
    }

    #[test]
    fn direct_push_ratio_is_sanitized() {
        let mut snapshot = RepositoryMetricsSnapshot {
            direct_push_ratio: Some(f64::NAN),
            ..Default::default()
        };
        assert_eq!(snapshot.sanitized_direct_push_ratio(), None);
        snapshot.direct_push_ratio = Some(1.5);
        assert_eq!(snapshot.sanitized_direct_push_ratio(), Some(1.0));
        snapshot.direct_push_ratio = Some(-0.2);
        assert_eq!(snapshot.sanitized_direct_push_ratio(), Some(0.0));
    }

    #[test]
    fn self_approval_requires_author_among_approvers() {
        assert!(pull_request("ana", &[], &["ana"]).is_self_approved());
        assert!(!pull_request("ana", &["ana"], &["bo"]).is_self_approved());
    }

    #[test]
    fn external_reviewers_exclude_author_and_dedupe() {
        let pr = pull_request("ana", &["ana", "bo"], &["bo", "cy"]);
        let reviewers: Vec<&str> = pr.external_reviewers().into_iter().collect();
        assert_eq!(reviewers, vec!["bo", "cy"]);
    }

    #[test]
    fn justification_text_joins_lines() {
        let result = ScoringResult {
            score: 90,
            justification: vec!["first".to_string(), "second".to_string()],
            deductions: Vec::new(),
        };
        assert_eq!(result.justification_text(), "first. second.");
    }

    #[test]
    fn pull_request_deserializes_with_defaults() {
        let json = r#"{
            "number": 7,
            "state": "merged",
            "created_at": "2024-03-01T10:00:00Z",
            "author": "ana"
        }"#;
        let pr: PullRequestRecord = serde_json::from_str(json).expect("parse");
        assert_eq!(pr.state, PullRequestState::Merged);
        assert!(pr.description.is_empty());
        assert!(pr.commits.is_empty());
        assert!(pr.merged_at.is_none());
        assert_eq!(pr.comments, 0);
        assert_eq!(pr.additions, 0);
    }
}
