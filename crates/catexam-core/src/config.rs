//! Exam configuration: limits, passing threshold, and balanced-phase settings.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CatError;
use crate::model::Domain;

/// Configuration for one exam attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatConfig {
    /// Items that must be administered before the confidence rule may end
    /// the exam.
    #[serde(default = "default_min_items")]
    pub min_scored_items: usize,
    /// Hard cap on administered items, pilot items included.
    #[serde(default = "default_max_items")]
    pub max_total_items: usize,
    /// Hard wall-clock ceiling for the whole attempt.
    #[serde(default = "default_time_limit")]
    pub exam_time_limit_secs: u64,
    /// Passing standard on the normalized 0-1 score scale.
    #[serde(default = "default_passing_threshold")]
    pub passing_threshold: f64,
    /// Items administered with balanced domain sampling before adaptive
    /// selection starts.
    #[serde(default = "default_balanced_phase")]
    pub balanced_phase_item_count: usize,
    /// Tie-break order for balanced selection.
    #[serde(default = "default_domain_priority")]
    pub domain_priority_order: Vec<Domain>,
}

fn default_min_items() -> usize {
    60
}
fn default_max_items() -> usize {
    120
}
fn default_time_limit() -> u64 {
    2 * 60 * 60
}
fn default_passing_threshold() -> f64 {
    0.70
}
fn default_balanced_phase() -> usize {
    10
}
fn default_domain_priority() -> Vec<Domain> {
    Domain::ALL.to_vec()
}

impl Default for CatConfig {
    fn default() -> Self {
        Self {
            min_scored_items: default_min_items(),
            max_total_items: default_max_items(),
            exam_time_limit_secs: default_time_limit(),
            passing_threshold: default_passing_threshold(),
            balanced_phase_item_count: default_balanced_phase(),
            domain_priority_order: default_domain_priority(),
        }
    }
}

impl CatConfig {
    /// Check the configuration for inconsistencies.
    pub fn validate(&self) -> Result<(), CatError> {
        let fail = |msg: String| Err(CatError::Configuration(msg));

        if self.max_total_items == 0 {
            return fail("max_total_items must be at least 1".into());
        }
        if self.min_scored_items > self.max_total_items {
            return fail(format!(
                "min_scored_items ({}) exceeds max_total_items ({})",
                self.min_scored_items, self.max_total_items
            ));
        }
        if self.exam_time_limit_secs == 0 {
            return fail("exam_time_limit_secs must be positive".into());
        }
        if !(0.0..=1.0).contains(&self.passing_threshold) {
            return fail(format!(
                "passing_threshold must be within [0, 1], got {}",
                self.passing_threshold
            ));
        }

        let mut seen = HashSet::new();
        for domain in &self.domain_priority_order {
            if !seen.insert(domain) {
                return fail(format!("domain '{domain}' listed twice in domain_priority_order"));
            }
        }
        if let Some(missing) = Domain::ALL.iter().find(|d| !seen.contains(d)) {
            return fail(format!("domain_priority_order is missing '{missing}'"));
        }

        Ok(())
    }

    /// Parse a configuration from TOML.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("failed to parse exam configuration")
    }

    /// Apply `CATEXAM_*` environment overrides.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(v) = env_override::<usize>("CATEXAM_MIN_ITEMS")? {
            self.min_scored_items = v;
        }
        if let Some(v) = env_override::<usize>("CATEXAM_MAX_ITEMS")? {
            self.max_total_items = v;
        }
        if let Some(v) = env_override::<u64>("CATEXAM_TIME_LIMIT_SECS")? {
            self.exam_time_limit_secs = v;
        }
        if let Some(v) = env_override::<f64>("CATEXAM_PASSING_THRESHOLD")? {
            self.passing_threshold = v;
        }
        Ok(())
    }
}

fn env_override<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("invalid value for {name}: '{raw}'")),
        Err(_) => Ok(None),
    }
}

/// Load config from an explicit path, or `catexam.toml` in the working
/// directory, or fall back to defaults. Environment overrides are applied
/// last; the result is not validated here, sessions validate on construction.
pub fn load_config_from(path: Option<&Path>) -> Result<CatConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("catexam.toml");
            local.exists().then_some(local)
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<CatConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => CatConfig::default(),
    };

    config.apply_env_overrides()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CatConfig::default();
        assert_eq!(config.min_scored_items, 60);
        assert_eq!(config.max_total_items, 120);
        assert_eq!(config.exam_time_limit_secs, 7200);
        assert_eq!(config.balanced_phase_item_count, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn threshold_out_of_range_rejected() {
        let config = CatConfig {
            passing_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CatError::Configuration(_))));

        let config = CatConfig {
            passing_threshold: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn min_above_max_rejected() {
        let config = CatConfig {
            min_scored_items: 50,
            max_total_items: 40,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn zero_limits_rejected() {
        let config = CatConfig {
            min_scored_items: 0,
            max_total_items: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CatConfig {
            exam_time_limit_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn domain_priority_must_be_complete() {
        let mut config = CatConfig::default();
        config.domain_priority_order.pop();
        assert!(config.validate().unwrap_err().to_string().contains("missing"));

        let mut config = CatConfig::default();
        config.domain_priority_order[1] = Domain::SceneSafety;
        assert!(config.validate().unwrap_err().to_string().contains("twice"));
    }

    #[test]
    fn parse_partial_toml_uses_defaults() {
        let config = CatConfig::from_toml_str(
            r#"
min_scored_items = 20
max_total_items = 40
domain_priority_order = ["operations", "scene_safety", "primary_assessment", "secondary_assessment", "treatment_transport"]
"#,
        )
        .unwrap();
        assert_eq!(config.min_scored_items, 20);
        assert_eq!(config.max_total_items, 40);
        assert_eq!(config.passing_threshold, 0.70);
        assert_eq!(config.domain_priority_order[0], Domain::Operations);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exam.toml");
        std::fs::write(&path, "passing_threshold = 0.65\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.passing_threshold, 0.65);

        assert!(load_config_from(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
