use std::collections::BTreeSet;

use chrono::{Duration, TimeZone, Utc};
use hygiene_core::{
    CommitRecord, PullRequestRecord, PullRequestState, RepositoryMetricsSnapshot, RuleKey,
    RuleMap, ScoringRule, classify, default_rules, parse_scoring_config, score,
};

fn healthy_snapshot() -> RepositoryMetricsSnapshot {
    RepositoryMetricsSnapshot {
        total_prs: 12,
        open_prs: 2,
        closed_prs: 10,
        total_commits: 80,
        last_commit_age_days: Some(12),
        direct_push_ratio: Some(0.1),
        contributors_count: 4,
        self_approved_prs: 0,
        total_analyzed_prs: 10,
        prs_with_description: 9,
        prs_reviewed_by_others: 10,
    }
}

#[test]
fn repository_without_pull_requests_scores_fifty() {
    let snapshot = RepositoryMetricsSnapshot {
        total_prs: 0,
        open_prs: 0,
        closed_prs: 0,
        total_analyzed_prs: 0,
        prs_with_description: 0,
        prs_reviewed_by_others: 0,
        ..healthy_snapshot()
    };
    let result = score(&snapshot, &default_rules(), 100);
    assert_eq!(result.score, 50);
}

#[test]
fn low_quality_repository_scores_twenty() {
    let snapshot = RepositoryMetricsSnapshot {
        total_prs: 0,
        open_prs: 0,
        closed_prs: 0,
        total_analyzed_prs: 0,
        prs_with_description: 0,
        prs_reviewed_by_others: 0,
        direct_push_ratio: Some(0.8),
        contributors_count: 1,
        ..healthy_snapshot()
    };
    let result = score(&snapshot, &default_rules(), 100);
    assert_eq!(result.score, 20);
    let points: Vec<(&str, u32)> = result
        .deductions
        .iter()
        .map(|deduction| (deduction.rule.as_str(), deduction.points))
        .collect();
    assert_eq!(
        points,
        vec![("no_prs", 50), ("high_direct_pushes", 20), ("single_contributor", 10)]
    );
}

#[test]
fn description_rule_reproduces_published_penalties() {
    let mut rules = RuleMap::new();
    rules.insert(
        RuleKey::NoPrDescriptions.as_str().to_string(),
        ScoringRule::with_threshold(10, 0.5, "Low PR description rate"),
    );
    for (with_description, expected) in [(3, 96), (2, 94), (6, 100)] {
        let snapshot = RepositoryMetricsSnapshot {
            prs_with_description: with_description,
            ..healthy_snapshot()
        };
        assert_eq!(score(&snapshot, &rules, 100).score, expected);
    }
}

#[test]
fn score_stays_in_bounds_when_everything_fires() {
    let snapshot = RepositoryMetricsSnapshot {
        total_prs: 0,
        total_commits: 0,
        last_commit_age_days: Some(4000),
        direct_push_ratio: Some(1.0),
        contributors_count: 1,
        total_analyzed_prs: 10,
        self_approved_prs: 10,
        prs_with_description: 0,
        prs_reviewed_by_others: 0,
        ..healthy_snapshot()
    };
    let config = parse_scoring_config(
        r#"{ "rules": {
            "no_prs": { "penalty_percent": 100 },
            "no_commits": { "penalty_percent": 100 }
        } }"#,
        "inline",
    );
    let result = score(&snapshot, &config.rules, config.base_score);
    assert_eq!(result.score, 0);
    assert_eq!(result.deductions.len(), RuleKey::ALL.len());
}

#[test]
fn scoring_is_idempotent() {
    let snapshot = RepositoryMetricsSnapshot {
        self_approved_prs: 7,
        direct_push_ratio: Some(0.5),
        ..healthy_snapshot()
    };
    let rules = default_rules();
    assert_eq!(score(&snapshot, &rules, 100), score(&snapshot, &rules, 100));
}

#[test]
fn empty_review_sample_never_fires_review_rules() {
    let snapshot = RepositoryMetricsSnapshot {
        total_analyzed_prs: 0,
        prs_with_description: 0,
        self_approved_prs: 0,
        prs_reviewed_by_others: 0,
        ..healthy_snapshot()
    };
    let config = parse_scoring_config(
        r#"{ "rules": {
            "no_pr_descriptions": { "threshold": 1.0, "penalty_percent": 100 },
            "high_self_approval": { "threshold": 0.0, "penalty_percent": 100 },
            "low_external_review": { "threshold": 1.0, "penalty_percent": 100 }
        } }"#,
        "inline",
    );
    let result = score(&snapshot, &config.rules, 100);
    assert_eq!(result.score, 100);
    assert!(result.deductions.is_empty());
}

#[test]
fn classifier_finds_thirty_direct_pushes_in_one_hundred() {
    let newest = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
    let commits: Vec<CommitRecord> = (0..100)
        .map(|index| CommitRecord {
            sha: format!("{index:040x}"),
            authored_at: newest - Duration::minutes(index),
        })
        .collect();
    let pull_requests: Vec<PullRequestRecord> = (0..7i64)
        .map(|chunk| PullRequestRecord {
            number: chunk as u64 + 1,
            state: PullRequestState::Merged,
            created_at: newest - Duration::days(30),
            merged_at: None,
            title: String::new(),
            description: String::new(),
            // Chunks of ten overlap by one commit with the previous chunk.
            commits: ((chunk * 10).saturating_sub(1)..chunk * 10 + 10)
                .map(|index| format!("{index:040x}"))
                .collect::<BTreeSet<_>>(),
            reviewers: BTreeSet::new(),
            approvers: BTreeSet::new(),
            author: "ana".to_string(),
            comments: 0,
            changed_files: 0,
            additions: 0,
            deletions: 0,
        })
        .collect();

    let summary = classify(&commits, &pull_requests);

    assert_eq!(summary.direct_count, 30);
    assert_eq!(summary.sampled_count, 100);
    assert_eq!(summary.ratio(), Some(0.30));
}
