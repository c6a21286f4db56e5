//! Layered loading of scoring configuration.
//!
//! Built-in defaults are always the bottom layer. A readable, well-formed
//! document overlays them key by key; anything else falls back to the
//! defaults with a warning and never reaches the caller as an error.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rules::{DEFAULT_BASE_SCORE, RuleKey, RuleMap, ScoringRule, default_rules};

/// Where a scoring configuration document comes from.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigSource {
    /// Human-readable description used in log messages.
    fn describe(&self) -> String;
    /// Read the raw configuration document.
    fn read(&self) -> Result<String>;
}

/// Configuration document stored on disk.
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
}

impl FileConfigSource {
    /// Create a source backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileConfigSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> Result<String> {
        Ok(std::fs::read_to_string(&self.path)?)
    }
}

/// Effective configuration handed to the scoring engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Score before penalties.
    pub base_score: i32,
    /// Enabled rules keyed by catalogue key.
    pub rules: RuleMap,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_score: DEFAULT_BASE_SCORE,
            rules: default_rules(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    base_score: Option<i32>,
    #[serde(default)]
    rules: BTreeMap<String, RuleOverride>,
}

#[derive(Debug, Default, Deserialize)]
struct RuleOverride {
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default)]
    penalty_percent: Option<u32>,
    #[serde(default)]
    threshold: Option<f64>,
    #[serde(default)]
    days_threshold: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

/// Load the scoring configuration, degrading to defaults on any problem.
pub fn load_scoring_config(source: &dyn ConfigSource) -> ScoringConfig {
    match source.read() {
        Ok(contents) => parse_scoring_config(&contents, &source.describe()),
        Err(err) => {
            log::warn!(
                "scoring config {} unavailable ({err}); using built-in defaults",
                source.describe()
            );
            ScoringConfig::default()
        }
    }
}

/// Overlay a JSON configuration document onto the defaults.
///
/// `origin` only appears in log messages.
pub fn parse_scoring_config(contents: &str, origin: &str) -> ScoringConfig {
    let document: ConfigDocument = match serde_json::from_str(contents) {
        Ok(document) => document,
        Err(err) => {
            log::warn!("scoring config {origin} is malformed ({err}); using built-in defaults");
            return ScoringConfig::default();
        }
    };

    let mut config = ScoringConfig::default();
    if let Some(base_score) = document.base_score {
        config.base_score = base_score;
    }

    for (name, entry) in document.rules {
        let Some(key) = RuleKey::parse(&name) else {
            log::debug!("scoring config {origin}: ignoring unknown rule {name}");
            continue;
        };
        if entry.enabled == Some(false) {
            config.rules.remove(key.as_str());
            continue;
        }
        let base = config
            .rules
            .get(key.as_str())
            .cloned()
            .unwrap_or_else(|| key.default_rule());
        match overlay_rule(base, entry) {
            Ok(rule) => {
                config.rules.insert(key.as_str().to_string(), rule);
            }
            Err(reason) => {
                log::warn!("scoring config {origin}: rule {name} {reason}; keeping default");
                config
                    .rules
                    .insert(key.as_str().to_string(), key.default_rule());
            }
        }
    }

    config
}

fn overlay_rule(base: ScoringRule, entry: RuleOverride) -> std::result::Result<ScoringRule, String> {
    let rule = ScoringRule {
        penalty_percent: entry.penalty_percent.unwrap_or(base.penalty_percent),
        threshold: entry.threshold.or(base.threshold),
        days_threshold: entry.days_threshold.or(base.days_threshold),
        message: entry.message.or(base.message),
    };

    if rule.penalty_percent > 100 {
        return Err(format!(
            "has penalty_percent {} above 100",
            rule.penalty_percent
        ));
    }
    if let Some(threshold) = rule.threshold {
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(format!("has threshold {threshold} outside 0..=1"));
        }
    }
    if let Some(days) = rule.days_threshold {
        if days < 0 {
            return Err(format!("has negative days_threshold {days}"));
        }
    }

    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HygieneError;
    use std::io;

    fn source_with(contents: &'static str) -> MockConfigSource {
        let mut source = MockConfigSource::new();
        source.expect_describe().return_const("rules.json".to_string());
        source
            .expect_read()
            .returning(move || Ok(contents.to_string()));
        source
    }

    #[test]
    fn missing_source_yields_defaults() {
        let mut source = MockConfigSource::new();
        source.expect_describe().return_const("rules.json".to_string());
        source.expect_read().returning(|| {
            Err(HygieneError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "missing",
            )))
        });

        assert_eq!(load_scoring_config(&source), ScoringConfig::default());
    }

    #[test]
    fn malformed_document_yields_defaults() {
        let source = source_with("{ \"rules\": [1, 2");
        assert_eq!(load_scoring_config(&source), ScoringConfig::default());

        let wrong_shape = source_with("{ \"rules\": { \"no_prs\": { \"penalty_percent\": \"lots\" } } }");
        assert_eq!(load_scoring_config(&wrong_shape), ScoringConfig::default());
    }

    #[test]
    fn configured_fields_overlay_defaults() {
        let source = source_with(
            r#"{
                "base_score": 90,
                "rules": {
                    "high_direct_pushes": { "penalty_percent": 30, "threshold": 0.25 },
                    "inactive_repository": { "days_threshold": 180 }
                }
            }"#,
        );

        let config = load_scoring_config(&source);

        assert_eq!(config.base_score, 90);
        let pushes = &config.rules["high_direct_pushes"];
        assert_eq!(pushes.penalty_percent, 30);
        assert_eq!(pushes.threshold, Some(0.25));
        assert_eq!(pushes.message.as_deref(), Some("High direct push ratio"));
        let inactive = &config.rules["inactive_repository"];
        assert_eq!(inactive.penalty_percent, 5);
        assert_eq!(inactive.days_threshold, Some(180));
        assert_eq!(config.rules["no_prs"], RuleKey::NoPrs.default_rule());
    }

    #[test]
    fn disabled_rules_are_removed() {
        let source = source_with(r#"{ "rules": { "single_contributor": { "enabled": false } } }"#);
        let config = load_scoring_config(&source);
        assert!(!config.rules.contains_key("single_contributor"));
        assert_eq!(config.rules.len(), RuleKey::ALL.len() - 1);
    }

    #[test]
    fn unknown_rules_are_ignored() {
        let source = source_with(r#"{ "rules": { "large_prs": { "penalty_percent": 5 } } }"#);
        let config = load_scoring_config(&source);
        assert_eq!(config, ScoringConfig::default());
    }

    #[test]
    fn invalid_rule_values_keep_the_default() {
        let source = source_with(
            r#"{ "rules": {
                "no_prs": { "penalty_percent": 150 },
                "high_self_approval": { "threshold": 1.5 },
                "inactive_repository": { "days_threshold": -3 },
                "no_commits": { "penalty_percent": 20 }
            } }"#,
        );
        let config = load_scoring_config(&source);
        assert_eq!(config.rules["no_prs"], RuleKey::NoPrs.default_rule());
        assert_eq!(
            config.rules["high_self_approval"],
            RuleKey::HighSelfApproval.default_rule()
        );
        assert_eq!(
            config.rules["inactive_repository"],
            RuleKey::InactiveRepository.default_rule()
        );
        assert_eq!(config.rules["no_commits"].penalty_percent, 20);
    }

    #[test]
    fn empty_document_is_all_defaults() {
        assert_eq!(parse_scoring_config("{}", "inline"), ScoringConfig::default());
    }

    #[test]
    fn file_source_reads_from_disk() {
        let path = std::env::temp_dir().join(format!(
            "hygiene_core_config_{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{ "base_score": 95 }"#).expect("write config");

        let source = FileConfigSource::new(&path);
        assert_eq!(source.path(), path.as_path());
        let config = load_scoring_config(&source);
        assert_eq!(config.base_score, 95);

        std::fs::remove_file(&path).expect("cleanup config");
    }
}
