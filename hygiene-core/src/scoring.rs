//! Rule-driven quality scoring.
//!
//! The catalogue is a fixed table of descriptors joined against the supplied
//! rule configuration. Catalogue entries missing from the configuration are
//! disabled; configuration keys outside the catalogue are ignored.

use crate::domain::{RepositoryMetricsSnapshot, RuleDeduction, ScoringResult};
use crate::rules::{RuleKey, RuleMap, ScoringRule};

/// Added before truncating scaled penalties so float noise never costs a point.
const POINT_EPSILON: f64 = 1e-9;

/// Weight applied to the self-approval ratio when scaling its penalty.
const SELF_APPROVAL_WEIGHT: f64 = 6.0 / 5.0;

/// How a descriptor's measured value is shown in justification lines.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Unit {
    Count,
    Ratio,
    Days,
}

/// A rule's configuration with every threshold resolved.
#[derive(Debug, Clone, PartialEq)]
struct ResolvedRule {
    penalty_percent: u32,
    threshold: f64,
    days_threshold: i64,
    message: String,
}

impl ResolvedRule {
    fn resolve(key: RuleKey, rule: &ScoringRule) -> Self {
        let fallback = key.default_rule();
        Self {
            penalty_percent: rule.penalty_percent.min(100),
            threshold: rule.threshold.or(fallback.threshold).unwrap_or(0.0),
            days_threshold: rule.days_threshold.or(fallback.days_threshold).unwrap_or(0),
            message: rule
                .message
                .clone()
                .or(fallback.message)
                .unwrap_or_else(|| key.to_string()),
        }
    }
}

struct RuleDescriptor {
    key: RuleKey,
    metric: &'static str,
    unit: Unit,
    not_applicable: &'static str,
    measure: fn(&RepositoryMetricsSnapshot) -> Option<f64>,
    fires: fn(f64, &ResolvedRule) -> bool,
    penalty: fn(f64, &ResolvedRule) -> u32,
}

const CATALOGUE: [RuleDescriptor; 8] = [
    RuleDescriptor {
        key: RuleKey::NoPrs,
        metric: "pull request count",
        unit: Unit::Count,
        not_applicable: "",
        measure: |snapshot| Some(snapshot.total_prs as f64),
        fires: is_zero,
        penalty: full_penalty,
    },
    RuleDescriptor {
        key: RuleKey::NoPrDescriptions,
        metric: "PR description rate",
        unit: Unit::Ratio,
        not_applicable: "no analyzed pull requests",
        measure: RepositoryMetricsSnapshot::description_ratio,
        fires: below_threshold,
        penalty: shortfall_penalty,
    },
    RuleDescriptor {
        key: RuleKey::HighSelfApproval,
        metric: "self-approval rate",
        unit: Unit::Ratio,
        not_applicable: "no analyzed pull requests",
        measure: RepositoryMetricsSnapshot::self_approval_ratio,
        fires: above_threshold,
        penalty: self_approval_penalty,
    },
    RuleDescriptor {
        key: RuleKey::LowExternalReview,
        metric: "external review rate",
        unit: Unit::Ratio,
        not_applicable: "no analyzed pull requests",
        measure: RepositoryMetricsSnapshot::external_review_ratio,
        fires: below_threshold,
        penalty: shortfall_penalty,
    },
    RuleDescriptor {
        key: RuleKey::HighDirectPushes,
        metric: "direct push ratio",
        unit: Unit::Ratio,
        not_applicable: "no sampled commits",
        measure: RepositoryMetricsSnapshot::sanitized_direct_push_ratio,
        fires: above_threshold,
        penalty: proportional_penalty,
    },
    RuleDescriptor {
        key: RuleKey::SingleContributor,
        metric: "contributor count",
        unit: Unit::Count,
        not_applicable: "",
        measure: |snapshot| Some(snapshot.contributors_count as f64),
        fires: |value, _| value == 1.0,
        penalty: full_penalty,
    },
    RuleDescriptor {
        key: RuleKey::InactiveRepository,
        metric: "days since last commit",
        unit: Unit::Days,
        not_applicable: "no commits",
        measure: |snapshot| snapshot.last_commit_age_days.map(|days| days as f64),
        fires: |value, rule| value > rule.days_threshold as f64,
        penalty: full_penalty,
    },
    RuleDescriptor {
        key: RuleKey::NoCommits,
        metric: "commit count",
        unit: Unit::Count,
        not_applicable: "",
        measure: |snapshot| Some(snapshot.total_commits as f64),
        fires: is_zero,
        penalty: full_penalty,
    },
];

/// Outcome of evaluating one descriptor.
#[derive(Debug, Clone, PartialEq)]
enum Evaluation {
    NotApplicable,
    Passed(f64),
    Fired(f64, u32),
}

impl RuleDescriptor {
    fn evaluate(&self, snapshot: &RepositoryMetricsSnapshot, rule: &ResolvedRule) -> Evaluation {
        let Some(value) = (self.measure)(snapshot) else {
            return Evaluation::NotApplicable;
        };
        if !(self.fires)(value, rule) {
            return Evaluation::Passed(value);
        }
        match (self.penalty)(value, rule) {
            0 => Evaluation::Passed(value),
            points => Evaluation::Fired(value, points),
        }
    }

    fn justification(&self, evaluation: &Evaluation, rule: &ResolvedRule) -> String {
        match evaluation {
            Evaluation::NotApplicable => {
                format!("{} not applicable ({})", self.metric, self.not_applicable)
            }
            Evaluation::Passed(value) => format!(
                "{} check passed: {} {} preserves score",
                rule.message,
                self.metric,
                self.format(*value)
            ),
            Evaluation::Fired(value, points) => format!(
                "{}: {} {} reduces score by {points} points",
                rule.message,
                self.metric,
                self.format(*value)
            ),
        }
    }

    fn format(&self, value: f64) -> String {
        match self.unit {
            Unit::Count => format!("{value:.0}"),
            Unit::Ratio => format!("{:.1}%", value * 100.0),
            Unit::Days => format!("{value:.0} days"),
        }
    }
}

/// Score a snapshot against a rule configuration.
///
/// Penalties are summed and subtracted from `base_score`; the result is
/// clamped to `0..=100`.
pub fn score(snapshot: &RepositoryMetricsSnapshot, rules: &RuleMap, base_score: i32) -> ScoringResult {
    let mut total_penalty: i64 = 0;
    let mut justification = Vec::new();
    let mut deductions = Vec::new();

    for descriptor in &CATALOGUE {
        let Some(rule) = rules.get(descriptor.key.as_str()) else {
            continue;
        };
        let rule = ResolvedRule::resolve(descriptor.key, rule);
        let evaluation = descriptor.evaluate(snapshot, &rule);
        if let Evaluation::Fired(_, points) = evaluation {
            total_penalty += i64::from(points);
            deductions.push(RuleDeduction {
                rule: descriptor.key.to_string(),
                points,
            });
        }
        justification.push(descriptor.justification(&evaluation, &rule));
    }

    let score = (i64::from(base_score) - total_penalty).clamp(0, 100) as u8;
    log::debug!(
        "scored snapshot: base {base_score}, penalty {total_penalty}, score {score}"
    );

    ScoringResult {
        score,
        justification,
        deductions,
    }
}

fn is_zero(value: f64, _rule: &ResolvedRule) -> bool {
    value == 0.0
}

fn below_threshold(value: f64, rule: &ResolvedRule) -> bool {
    value < rule.threshold
}

fn above_threshold(value: f64, rule: &ResolvedRule) -> bool {
    value > rule.threshold
}

fn full_penalty(_value: f64, rule: &ResolvedRule) -> u32 {
    rule.penalty_percent
}

/// Full penalty at a ratio of zero, shrinking linearly to nothing at the threshold.
fn shortfall_penalty(value: f64, rule: &ResolvedRule) -> u32 {
    if rule.threshold <= 0.0 {
        return 0;
    }
    let scaled =
        f64::from(rule.penalty_percent) * (rule.threshold - value) / rule.threshold;
    capped_points(scaled, rule.penalty_percent)
}

fn self_approval_penalty(value: f64, rule: &ResolvedRule) -> u32 {
    let scaled = value * f64::from(rule.penalty_percent) * SELF_APPROVAL_WEIGHT;
    capped_points(scaled, rule.penalty_percent)
}

fn proportional_penalty(value: f64, rule: &ResolvedRule) -> u32 {
    capped_points(value * f64::from(rule.penalty_percent), rule.penalty_percent)
}

fn capped_points(scaled: f64, cap: u32) -> u32 {
    let points = (scaled + POINT_EPSILON).floor().max(0.0);
    if points >= f64::from(cap) {
        cap
    } else {
        points as u32
    }
}
