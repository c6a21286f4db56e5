#![deny(missing_docs)]
//! Repository hygiene core library.
//!
//! Turns pull request, commit and review activity into a bounded quality
//! score with a line-by-line justification. Every entry point is a pure
//! function over in-memory data.

pub mod analysis;
pub mod classifier;
pub mod config;
pub mod domain;
pub mod error;
pub mod report;
pub mod rules;
pub mod scoring;

pub use analysis::{
    PR_ANALYSIS_LIMIT, PullRequestAnalysis, RepositoryActivity, RepositoryAnalysis,
    analyze_pull_requests, analyze_repository, parse_activities,
};
pub use classifier::{COMMIT_SAMPLE_SIZE, DirectPushSummary, classify};
pub use config::{
    ConfigSource, FileConfigSource, ScoringConfig, load_scoring_config, parse_scoring_config,
};
pub use domain::{
    CommitRecord, PullRequestRecord, PullRequestState, RepositoryMetricsSnapshot, RuleDeduction,
    ScoringResult,
};
pub use error::{HygieneError, Result};
pub use report::{
    AssessmentStatus, FleetReport, FleetSummary, RepoScoreReport, assess_repository,
    render_json, render_markdown, render_text,
};
pub use rules::{DEFAULT_BASE_SCORE, RuleKey, RuleMap, ScoringRule, default_rules};
pub use scoring::score;
