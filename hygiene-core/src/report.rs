//! Report assembly and formatting for scored repositories.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{RepositoryActivity, RepositoryAnalysis, analyze_repository};
use crate::config::ScoringConfig;
use crate::domain::ScoringResult;
use crate::scoring::score;

/// Scores at or above this count as high quality.
pub const HIGH_QUALITY_SCORE: u8 = 80;
/// Scores below this count as low quality.
pub const LOW_QUALITY_SCORE: u8 = 50;

/// Whether a repository could be scored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum AssessmentStatus {
    /// Repository was analyzed and scored.
    Scored,
    /// Scoring failed with an error message.
    Failed(String),
}

/// Assessment of a single repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoScoreReport {
    /// Repository name.
    pub name: String,
    /// Outcome of the assessment.
    pub status: AssessmentStatus,
    /// Derived metrics, when scored.
    pub analysis: Option<RepositoryAnalysis>,
    /// Score and justification, when scored.
    pub result: Option<ScoringResult>,
}

impl RepoScoreReport {
    /// Create a report for a scored repository.
    pub fn scored(name: String, analysis: RepositoryAnalysis, result: ScoringResult) -> Self {
        Self {
            name,
            status: AssessmentStatus::Scored,
            analysis: Some(analysis),
            result: Some(result),
        }
    }

    /// Create a report for a repository that could not be scored.
    pub fn failed(name: String, error: impl Into<String>) -> Self {
        Self {
            name,
            status: AssessmentStatus::Failed(error.into()),
            analysis: None,
            result: None,
        }
    }

    /// Score, if the repository was scored.
    pub fn score(&self) -> Option<u8> {
        self.result.as_ref().map(|result| result.score)
    }

    /// Default branch recorded by the analysis, if any.
    pub fn default_branch(&self) -> Option<&str> {
        self.analysis.as_ref()?.default_branch.as_deref()
    }
}

/// Analyze and score one repository's activity.
pub fn assess_repository(
    activity: &RepositoryActivity,
    config: &ScoringConfig,
    now: DateTime<Utc>,
) -> RepoScoreReport {
    let analysis = analyze_repository(activity, now);
    let result = score(&analysis.snapshot, &config.rules, config.base_score);
    RepoScoreReport::scored(activity.name.clone(), analysis, result)
}

/// Aggregate view across every scored repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSummary {
    /// Repositories in the report, scored or not.
    pub repositories: usize,
    /// Repositories that were scored.
    pub scored: usize,
    /// Rounded mean score of scored repositories.
    pub average_score: Option<u8>,
    /// Scored repositories at or above [`HIGH_QUALITY_SCORE`].
    pub high_quality: usize,
    /// Scored repositories below [`LOW_QUALITY_SCORE`].
    pub low_quality: usize,
}

impl FleetSummary {
    /// Summarize a set of reports.
    pub fn from_reports(reports: &[RepoScoreReport]) -> Self {
        let scores: Vec<u8> = reports.iter().filter_map(RepoScoreReport::score).collect();
        let average_score = if scores.is_empty() {
            None
        } else {
            let total: u32 = scores.iter().map(|score| u32::from(*score)).sum();
            Some((f64::from(total) / scores.len() as f64).round() as u8)
        };
        Self {
            repositories: reports.len(),
            scored: scores.len(),
            average_score,
            high_quality: scores.iter().filter(|s| **s >= HIGH_QUALITY_SCORE).count(),
            low_quality: scores.iter().filter(|s| **s < LOW_QUALITY_SCORE).count(),
        }
    }
}

/// Full report payload used for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetReport {
    /// Aggregate view.
    pub summary: FleetSummary,
    /// Per-repository reports.
    pub repositories: Vec<RepoScoreReport>,
}

impl FleetReport {
    /// Bundle reports with their summary.
    pub fn new(repositories: Vec<RepoScoreReport>) -> Self {
        Self {
            summary: FleetSummary::from_reports(&repositories),
            repositories,
        }
    }
}

/// Render any serializable report payload as JSON.
pub fn render_json<T: Serialize + ?Sized>(payload: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(payload)
}

/// Render reports as plain text.
pub fn render_text(reports: &[RepoScoreReport]) -> String {
    let mut output = String::new();
    for report in reports {
        let _ = writeln!(output, "Repository: {}", report.name);
        if let Some(branch) = report.default_branch() {
            let _ = writeln!(output, "Default branch: {branch}");
        }
        match (&report.status, &report.result) {
            (AssessmentStatus::Scored, Some(result)) => {
                let _ = writeln!(output, "Score: {}/100", result.score);
                let _ = writeln!(output, "Justification: {}", result.justification_text());
            }
            (AssessmentStatus::Failed(error), _) => {
                let _ = writeln!(output, "Status: failed ({error})");
            }
            (AssessmentStatus::Scored, None) => {
                let _ = writeln!(output, "Score: unavailable");
            }
        }
        let _ = writeln!(output);
    }
    append_summary_text(&mut output, &FleetSummary::from_reports(reports));
    output
}

/// Render reports as Markdown.
pub fn render_markdown(reports: &[RepoScoreReport]) -> String {
    let summary = FleetSummary::from_reports(reports);
    let mut output = String::new();
    let _ = writeln!(output, "# Repository Hygiene Report\n");
    append_summary_markdown(&mut output, &summary);
    for report in reports {
        let _ = writeln!(output, "## {}\n", report.name);
        match (&report.status, &report.result) {
            (AssessmentStatus::Scored, Some(result)) => {
                let _ = writeln!(output, "- Score: **{}**/100\n", result.score);
                append_metrics(&mut output, report.analysis.as_ref());
                append_justification(&mut output, &result.justification);
            }
            (AssessmentStatus::Failed(error), _) => {
                let _ = writeln!(output, "- Status: failed ({error})\n");
            }
            (AssessmentStatus::Scored, None) => {
                let _ = writeln!(output, "- Score: unavailable\n");
            }
        }
    }
    output
}

fn append_summary_text(output: &mut String, summary: &FleetSummary) {
    let _ = writeln!(
        output,
        "Summary: {} repositories, {} scored",
        summary.repositories, summary.scored
    );
    match summary.average_score {
        Some(average) => {
            let _ = writeln!(output, "Average score: {average}");
        }
        None => {
            let _ = writeln!(output, "Average score: n/a");
        }
    }
    let _ = writeln!(
        output,
        "High quality (>= {HIGH_QUALITY_SCORE}): {}",
        summary.high_quality
    );
    let _ = writeln!(
        output,
        "Low quality (< {LOW_QUALITY_SCORE}): {}",
        summary.low_quality
    );
}

fn append_summary_markdown(output: &mut String, summary: &FleetSummary) {
    let _ = writeln!(output, "### Summary");
    let _ = writeln!(output, "- Repositories: {}", summary.repositories);
    let _ = writeln!(output, "- Scored: {}", summary.scored);
    match summary.average_score {
        Some(average) => {
            let _ = writeln!(output, "- Average score: {average}");
        }
        None => {
            let _ = writeln!(output, "- Average score: n/a");
        }
    }
    let _ = writeln!(output, "- High quality: {}", summary.high_quality);
    let _ = writeln!(output, "- Low quality: {}\n", summary.low_quality);
}

fn append_metrics(output: &mut String, analysis: Option<&RepositoryAnalysis>) {
    let Some(analysis) = analysis else {
        return;
    };
    let snapshot = &analysis.snapshot;
    let _ = writeln!(output, "### Metrics");
    if let Some(branch) = &analysis.default_branch {
        let _ = writeln!(output, "- Default branch: {branch}");
    }
    let _ = writeln!(
        output,
        "- Pull requests: {} ({} open, {} closed)",
        snapshot.total_prs, snapshot.open_prs, snapshot.closed_prs
    );
    let _ = writeln!(output, "- Commits: {}", snapshot.total_commits);
    let _ = writeln!(output, "- Contributors: {}", snapshot.contributors_count);
    let _ = writeln!(
        output,
        "- Direct pushes: {} of {} sampled",
        analysis.direct_pushes.direct_count, analysis.direct_pushes.sampled_count
    );
    match snapshot.last_commit_age_days {
        Some(days) => {
            let _ = writeln!(output, "- Last commit: {days} days ago");
        }
        None => {
            let _ = writeln!(output, "- Last commit: never");
        }
    }
    let reviews = &analysis.pull_requests;
    if let Some(hours) = reviews.avg_time_to_merge_hours {
        let _ = writeln!(output, "- Average time to merge: {hours:.1}h");
    }
    if let Some(comments) = reviews.avg_comments_per_pr {
        let _ = writeln!(output, "- Average comments per PR: {comments:.1}");
    }
    if let (Some(files), Some(added), Some(deleted)) = (
        reviews.avg_files_changed,
        reviews.avg_lines_added,
        reviews.avg_lines_deleted,
    ) {
        let _ = writeln!(
            output,
            "- Average PR size: {files:.1} files, +{added:.1}/-{deleted:.1} lines"
        );
    }
    let _ = writeln!(output);
}

fn append_justification(output: &mut String, lines: &[String]) {
    if lines.is_empty() {
        let _ = writeln!(output, "### Justification\nNo rules evaluated.\n");
        return;
    }
    let _ = writeln!(output, "### Justification");
    for line in lines {
        let _ = writeln!(output, "- {line}");
    }
    let _ = writeln!(output);
}
