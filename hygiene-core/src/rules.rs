//! Scoring rule configuration entities and the built-in rule set.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Score every repository starts from before penalties.
pub const DEFAULT_BASE_SCORE: i32 = 100;

/// Rule configuration keyed by catalogue key.
pub type RuleMap = BTreeMap<String, ScoringRule>;

/// Configuration for a single scoring rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRule {
    /// Maximum points the rule may deduct, 0-100.
    pub penalty_percent: u32,
    /// Ratio threshold for ratio-based rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// Day-count threshold for age-based rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_threshold: Option<i64>,
    /// Text prefixed to the justification line when the rule fires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ScoringRule {
    /// A rule that deducts a flat amount.
    pub fn flat(penalty_percent: u32, message: &str) -> Self {
        Self {
            penalty_percent,
            threshold: None,
            days_threshold: None,
            message: Some(message.to_string()),
        }
    }

    /// A rule that compares a ratio against `threshold`.
    pub fn with_threshold(penalty_percent: u32, threshold: f64, message: &str) -> Self {
        Self {
            threshold: Some(threshold),
            ..Self::flat(penalty_percent, message)
        }
    }

    /// A rule that compares an age in days against `days_threshold`.
    pub fn with_days(penalty_percent: u32, days_threshold: i64, message: &str) -> Self {
        Self {
            days_threshold: Some(days_threshold),
            ..Self::flat(penalty_percent, message)
        }
    }
}

/// The fixed catalogue of rules, in evaluation order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleKey {
    /// Repository has no pull requests at all.
    NoPrs,
    /// Too few pull requests carry a description.
    NoPrDescriptions,
    /// Too many pull requests are approved by their author.
    HighSelfApproval,
    /// Too few pull requests are reviewed by someone else.
    LowExternalReview,
    /// Too many commits bypass pull requests.
    HighDirectPushes,
    /// Only one person contributes.
    SingleContributor,
    /// Last commit is too old.
    InactiveRepository,
    /// Repository has no commits.
    NoCommits,
}

impl RuleKey {
    /// Every catalogue key in evaluation order.
    pub const ALL: [RuleKey; 8] = [
        RuleKey::NoPrs,
        RuleKey::NoPrDescriptions,
        RuleKey::HighSelfApproval,
        RuleKey::LowExternalReview,
        RuleKey::HighDirectPushes,
        RuleKey::SingleContributor,
        RuleKey::InactiveRepository,
        RuleKey::NoCommits,
    ];

    /// Stable configuration key.
    pub fn as_str(self) -> &'static str {
        match self {
            RuleKey::NoPrs => "no_prs",
            RuleKey::NoPrDescriptions => "no_pr_descriptions",
            RuleKey::HighSelfApproval => "high_self_approval",
            RuleKey::LowExternalReview => "low_external_review",
            RuleKey::HighDirectPushes => "high_direct_pushes",
            RuleKey::SingleContributor => "single_contributor",
            RuleKey::InactiveRepository => "inactive_repository",
            RuleKey::NoCommits => "no_commits",
        }
    }

    /// Look up a catalogue key by its configuration name.
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|candidate| candidate.as_str() == key)
    }

    /// Built-in configuration for this rule.
    pub fn default_rule(self) -> ScoringRule {
        match self {
            RuleKey::NoPrs => ScoringRule::flat(50, "No pull requests found"),
            RuleKey::NoPrDescriptions => {
                ScoringRule::with_threshold(10, 0.5, "Low PR description rate")
            }
            RuleKey::HighSelfApproval => {
                ScoringRule::with_threshold(25, 0.5, "High self-approval rate")
            }
            RuleKey::LowExternalReview => {
                ScoringRule::with_threshold(15, 0.3, "Low external review rate")
            }
            RuleKey::HighDirectPushes => {
                ScoringRule::with_threshold(25, 0.3, "High direct push ratio")
            }
            RuleKey::SingleContributor => ScoringRule::flat(10, "Single contributor"),
            RuleKey::InactiveRepository => {
                ScoringRule::with_days(5, 365, "Repository is inactive")
            }
            RuleKey::NoCommits => ScoringRule::flat(10, "No commits found"),
        }
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The built-in rule set used when no usable configuration is supplied.
pub fn default_rules() -> RuleMap {
    RuleKey::ALL
        .into_iter()
        .map(|key| (key.as_str().to_string(), key.default_rule()))
        .collect()
}
