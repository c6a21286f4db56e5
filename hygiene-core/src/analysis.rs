//! Aggregation of raw repository activity into a metrics snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::{DirectPushSummary, classify};
use crate::domain::{
    CommitRecord, PullRequestRecord, PullRequestState, RepositoryMetricsSnapshot, ratio,
};
use crate::error::Result;

/// Maximum number of finished pull requests examined for review quality.
pub const PR_ANALYSIS_LIMIT: usize = 100;

/// Descriptions at or below this many trimmed characters do not count.
const MIN_DESCRIPTION_CHARS: usize = 10;

const HOTFIX_KEYWORDS: [&str; 3] = ["hotfix", "urgent", "critical"];
const FEATURE_KEYWORDS: [&str; 3] = ["feature", "feat", "add"];
const BUGFIX_KEYWORDS: [&str; 3] = ["fix", "bug", "issue"];

/// Raw activity for one repository, as supplied by the retrieval layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryActivity {
    /// Repository name.
    pub name: String,
    /// Default branch the commits were read from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    /// Default-branch commits, most recent first.
    #[serde(default)]
    pub commits: Vec<CommitRecord>,
    /// Known pull requests.
    #[serde(default)]
    pub pull_requests: Vec<PullRequestRecord>,
    /// Number of distinct contributors.
    #[serde(default)]
    pub contributors_count: u64,
    /// Full commit count when known; defaults to the number of supplied commits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_commits: Option<u64>,
    /// Open pull request total when known; defaults to a count of the records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_prs: Option<u64>,
    /// Closed pull request total when known; defaults to a count of the records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_prs: Option<u64>,
}

/// Review and documentation statistics over finished pull requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PullRequestAnalysis {
    /// Pull requests examined.
    pub total_analyzed_prs: u64,
    /// Pull requests with a meaningful description.
    pub prs_with_description: u64,
    /// Pull requests approved by their author.
    pub self_approved_prs: u64,
    /// Pull requests reviewed or approved by someone else.
    pub prs_reviewed_by_others: u64,
    /// Pull requests with more than one distinct approver.
    pub prs_with_multiple_reviewers: u64,
    /// Merged pull requests.
    pub merged_prs: u64,
    /// Pull requests closed without merging.
    pub closed_without_merge: u64,
    /// Mean hours from creation to merge, one decimal.
    pub avg_time_to_merge_hours: Option<f64>,
    /// Titles mentioning a hotfix.
    pub hotfix_prs: u64,
    /// Titles mentioning a feature.
    pub feature_prs: u64,
    /// Titles mentioning a bug fix.
    pub bugfix_prs: u64,
    /// Mean comments per pull request, one decimal.
    pub avg_comments_per_pr: Option<f64>,
    /// Mean files changed per pull request, one decimal.
    pub avg_files_changed: Option<f64>,
    /// Mean lines added per pull request, one decimal.
    pub avg_lines_added: Option<f64>,
    /// Mean lines deleted per pull request, one decimal.
    pub avg_lines_deleted: Option<f64>,
}

/// Everything derived from one repository's activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryAnalysis {
    /// Default branch the commits were read from, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    /// Snapshot handed to the scoring engine.
    pub snapshot: RepositoryMetricsSnapshot,
    /// Review statistics.
    pub pull_requests: PullRequestAnalysis,
    /// Direct-push classification of the commit sample.
    pub direct_pushes: DirectPushSummary,
}

/// Analyze the most recent finished pull requests.
pub fn analyze_pull_requests(pull_requests: &[PullRequestRecord]) -> PullRequestAnalysis {
    let mut finished: Vec<&PullRequestRecord> = pull_requests
        .iter()
        .filter(|pr| pr.state != PullRequestState::Open)
        .collect();
    finished.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.number.cmp(&a.number)));
    finished.truncate(PR_ANALYSIS_LIMIT);

    let mut analysis = PullRequestAnalysis {
        total_analyzed_prs: finished.len() as u64,
        ..Default::default()
    };
    let mut merge_hours = Vec::new();
    let (mut comments, mut changed_files, mut additions, mut deletions) = (0u64, 0u64, 0u64, 0u64);

    for pr in finished {
        if pr.description.trim().chars().count() > MIN_DESCRIPTION_CHARS {
            analysis.prs_with_description += 1;
        }

        match classify_title(&pr.title) {
            Some(TitleKind::Hotfix) => analysis.hotfix_prs += 1,
            Some(TitleKind::Feature) => analysis.feature_prs += 1,
            Some(TitleKind::Bugfix) => analysis.bugfix_prs += 1,
            None => {}
        }

        if pr.state == PullRequestState::Merged {
            analysis.merged_prs += 1;
            if let Some(merged_at) = pr.merged_at {
                let seconds = (merged_at - pr.created_at).num_seconds();
                merge_hours.push(seconds as f64 / 3600.0);
            }
        } else {
            analysis.closed_without_merge += 1;
        }

        comments = comments.saturating_add(pr.comments);
        changed_files = changed_files.saturating_add(pr.changed_files);
        additions = additions.saturating_add(pr.additions);
        deletions = deletions.saturating_add(pr.deletions);

        if pr.is_self_approved() {
            analysis.self_approved_prs += 1;
        }
        if !pr.external_reviewers().is_empty() {
            analysis.prs_reviewed_by_others += 1;
        }
        if pr.approvers.len() > 1 {
            analysis.prs_with_multiple_reviewers += 1;
        }
    }

    if !merge_hours.is_empty() {
        let mean = merge_hours.iter().sum::<f64>() / merge_hours.len() as f64;
        analysis.avg_time_to_merge_hours = Some(one_decimal(mean));
    }

    let analyzed = analysis.total_analyzed_prs;
    analysis.avg_comments_per_pr = average(comments, analyzed);
    analysis.avg_files_changed = average(changed_files, analyzed);
    analysis.avg_lines_added = average(additions, analyzed);
    analysis.avg_lines_deleted = average(deletions, analyzed);

    analysis
}

fn average(total: u64, count: u64) -> Option<f64> {
    ratio(total, count).map(one_decimal)
}

fn one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Decode a JSON array of repository activity records.
pub fn parse_activities(contents: &str) -> Result<Vec<RepositoryActivity>> {
    Ok(serde_json::from_str(contents)?)
}

/// Derive the scoring snapshot and supporting statistics for a repository.
pub fn analyze_repository(activity: &RepositoryActivity, now: DateTime<Utc>) -> RepositoryAnalysis {
    let direct_pushes = classify(&activity.commits, &activity.pull_requests);
    let pull_requests = analyze_pull_requests(&activity.pull_requests);

    let open_prs = activity.open_prs.unwrap_or_else(|| {
        count_state(&activity.pull_requests, |state| state == PullRequestState::Open)
    });
    let closed_prs = activity.closed_prs.unwrap_or_else(|| {
        count_state(&activity.pull_requests, |state| state != PullRequestState::Open)
    });
    let total_commits = activity
        .total_commits
        .unwrap_or(activity.commits.len() as u64);
    let last_commit_age_days = activity
        .commits
        .iter()
        .map(|commit| commit.authored_at)
        .max()
        .map(|newest| (now - newest).num_days());

    let snapshot = RepositoryMetricsSnapshot {
        total_prs: open_prs.saturating_add(closed_prs),
        open_prs,
        closed_prs,
        total_commits,
        last_commit_age_days,
        direct_push_ratio: direct_pushes.ratio(),
        contributors_count: activity.contributors_count,
        self_approved_prs: pull_requests.self_approved_prs,
        total_analyzed_prs: pull_requests.total_analyzed_prs,
        prs_with_description: pull_requests.prs_with_description,
        prs_reviewed_by_others: pull_requests.prs_reviewed_by_others,
    };

    RepositoryAnalysis {
        default_branch: activity.default_branch.clone(),
        snapshot,
        pull_requests,
        direct_pushes,
    }
}

fn count_state(pull_requests: &[PullRequestRecord], keep: impl Fn(PullRequestState) -> bool) -> u64 {
    pull_requests.iter().filter(|pr| keep(pr.state)).count() as u64
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum TitleKind {
    Hotfix,
    Feature,
    Bugfix,
}

fn classify_title(title: &str) -> Option<TitleKind> {
    let title = title.to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|keyword| title.contains(keyword));
    if mentions(&HOTFIX_KEYWORDS) {
        Some(TitleKind::Hotfix)
    } else if mentions(&FEATURE_KEYWORDS) {
        Some(TitleKind::Feature)
    } else if mentions(&BUGFIX_KEYWORDS) {
        Some(TitleKind::Bugfix)
    } else {
        None
    }
}
