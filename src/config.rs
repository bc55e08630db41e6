use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};

use crate::models::{validate_average, MAX_GRADE};

/// Environment variable consulted when no `--config` path is given.
pub const CONFIG_ENV: &str = "GRADE_PLANNER_CONFIG";

fn default_overall_target() -> f64 {
    MAX_GRADE as f64
}
fn default_average() -> u8 {
    MAX_GRADE
}

// Averages are read as plain integers so that out-of-range values report the
// planner's own message instead of a u8 overflow.
fn deserialize_average<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = i64::deserialize(deserializer)?;
    validate_average(value).map_err(D::Error::custom)
}

fn deserialize_targets<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, u8>, D::Error>
where
    D: Deserializer<'de>,
{
    BTreeMap::<String, i64>::deserialize(deserializer)?
        .into_iter()
        .map(|(name, value)| {
            validate_average(value)
                .map(|target| (name.clone(), target))
                .map_err(|err| D::Error::custom(format!("subject_targets.{}: {}", name, err)))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Goal for the mean of all visible subject averages.
    #[serde(default = "default_overall_target")]
    pub overall_target: f64,
    /// Average assumed for a subject that has no grades yet.
    #[serde(default = "default_average", deserialize_with = "deserialize_average")]
    pub default_average: u8,
    #[serde(default)]
    pub hidden_subjects: Vec<String>,
    /// Per-subject target averages, keyed by subject name.
    #[serde(default, deserialize_with = "deserialize_targets")]
    pub subject_targets: BTreeMap<String, u8>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            overall_target: default_overall_target(),
            default_average: default_average(),
            hidden_subjects: Vec::new(),
            subject_targets: BTreeMap::new(),
        }
    }
}

impl PlannerConfig {
    /// Explicit path first, then `GRADE_PLANNER_CONFIG`, else defaults.
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
    }

    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match Self::resolve_path(explicit) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Reading {:?}", path))?;
        let config: PlannerConfig =
            toml::from_str(&content).with_context(|| format!("Parsing {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).context("Serializing config")?;
        std::fs::write(path, content).with_context(|| format!("Writing {:?}", path))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.overall_target.is_finite() && self.overall_target >= 1.0,
            "overall_target must be at least 1, got {}",
            self.overall_target
        );
        validate_average(self.default_average as i64).context("default_average")?;
        for (name, target) in &self.subject_targets {
            validate_average(*target as i64)
                .with_context(|| format!("subject_targets.{}", name))?;
        }
        Ok(())
    }

    /// Target average for a subject, matched by name ignoring case.
    pub fn subject_target(&self, name: &str) -> u8 {
        self.subject_targets
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, target)| *target)
            .unwrap_or(MAX_GRADE)
    }
}
