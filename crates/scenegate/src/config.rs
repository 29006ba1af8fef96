//! Configuration for scenegate
//!
//! Resolution order (later wins):
//! 1. Built-in defaults
//! 2. `~/.scenegate/config.toml`
//! 3. Environment (`SCENEGATE_CLASSIFIER_CMD`, `SCENEGATE_CLASSIFIER_TIMEOUT_MS`, `SCENEGATE_DATASET`)
//! 4. Command-line flags
//!
//! Guardrail policy (TTL budget, confidence thresholds) is fixed in
//! `scenegate_intent` and is not configurable.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::classifier::{ClassifierSource, CommandClassifier, DEFAULT_TIMEOUT_MS};
use scenegate_logging::scenegate_home;

pub const ENV_CLASSIFIER_CMD: &str = "SCENEGATE_CLASSIFIER_CMD";
pub const ENV_CLASSIFIER_TIMEOUT_MS: &str = "SCENEGATE_CLASSIFIER_TIMEOUT_MS";
pub const ENV_DATASET: &str = "SCENEGATE_DATASET";

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenegateConfig {
    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub eval: EvalConfig,
}

/// How turns get classified
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Program and arguments; empty means echo mode
    #[serde(default)]
    pub command: Vec<String>,

    /// Deadline for one classifier call in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Offline evaluation settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Labeled dataset (defaults to ~/.scenegate/data/eval_dataset.json)
    #[serde(default)]
    pub dataset: Option<PathBuf>,
}

/// Get the config file path: ~/.scenegate/config.toml
pub fn config_path() -> PathBuf {
    scenegate_home().join("config.toml")
}

/// Get the default dataset path: ~/.scenegate/data/eval_dataset.json
pub fn default_dataset_path() -> PathBuf {
    scenegate_home().join("data").join("eval_dataset.json")
}

impl ScenegateConfig {
    /// Config file + environment, as used by every command.
    pub fn resolve() -> Result<Self> {
        Self::load(&config_path())?.with_env(|key| std::env::var(key).ok())
    }

    /// Load from a TOML file; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ScenegateConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(cmd) = lookup(ENV_CLASSIFIER_CMD) {
            self.classifier.command = split_command(&cmd);
        }
        if let Some(timeout) = lookup(ENV_CLASSIFIER_TIMEOUT_MS) {
            self.classifier.timeout_ms = timeout.trim().parse().with_context(|| {
                format!("{} must be a number of milliseconds, got '{}'", ENV_CLASSIFIER_TIMEOUT_MS, timeout)
            })?;
        }
        if let Some(dataset) = lookup(ENV_DATASET) {
            self.eval.dataset = Some(PathBuf::from(dataset));
        }
        self.validate()?;
        Ok(self)
    }

    /// Apply command-line overrides.
    pub fn with_classifier_flags(mut self, command: Option<&str>, timeout_ms: Option<u64>) -> Result<Self> {
        if let Some(cmd) = command {
            self.classifier.command = split_command(cmd);
        }
        if let Some(timeout) = timeout_ms {
            self.classifier.timeout_ms = timeout;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn classifier_source(&self) -> ClassifierSource {
        let timeout = Duration::from_millis(self.classifier.timeout_ms);
        match CommandClassifier::from_argv(&self.classifier.command, timeout) {
            Some(cmd) => ClassifierSource::Command(cmd),
            None => ClassifierSource::Echo,
        }
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.eval.dataset.clone().unwrap_or_else(default_dataset_path)
    }

    fn validate(&self) -> Result<()> {
        if self.classifier.timeout_ms == 0 {
            bail!("classifier timeout must be greater than zero");
        }
        if let Some(program) = self.classifier.command.first() {
            if program.trim().is_empty() {
                bail!("classifier command has an empty program name");
            }
        }
        Ok(())
    }
}

fn split_command(cmd: &str) -> Vec<String> {
    cmd.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ScenegateConfig::default();
        assert_eq!(config.classifier.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(config.classifier_source(), ClassifierSource::Echo);
    }

    #[test]
    fn test_parse_toml() {
        let config = ScenegateConfig::from_toml_str(
            r#"
            [classifier]
            command = ["python3", "classify.py", "--model", "small"]
            timeout_ms = 2500

            [eval]
            dataset = "/data/eval.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.classifier.timeout_ms, 2500);
        assert_eq!(config.dataset_path(), PathBuf::from("/data/eval.json"));
        match config.classifier_source() {
            ClassifierSource::Command(cmd) => {
                assert_eq!(cmd.describe(), "python3 classify.py --model small");
                assert_eq!(cmd.timeout(), Duration::from_millis(2500));
            }
            other => panic!("expected command classifier, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ScenegateConfig::from_toml_str("[classifier]\ncommand = [\"./cls\"]\n").unwrap();
        assert_eq!(config.classifier.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert!(config.eval.dataset.is_none());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(ScenegateConfig::from_toml_str("[classifier\ncommand = 1").is_err());
        assert!(ScenegateConfig::from_toml_str("[classifier]\ntimeout_ms = 0\n").is_err());
        assert!(ScenegateConfig::from_toml_str("[classifier]\ncommand = [\"\"]\n").is_err());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = ScenegateConfig::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, ScenegateConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[classifier]\ntimeout_ms = 750\n").unwrap();
        let config = ScenegateConfig::load(&path).unwrap();
        assert_eq!(config.classifier.timeout_ms, 750);
    }

    #[test]
    fn test_env_overrides() {
        let config = ScenegateConfig::default()
            .with_env(env(&[
                (ENV_CLASSIFIER_CMD, "node  classify.js"),
                (ENV_CLASSIFIER_TIMEOUT_MS, " 1200 "),
                (ENV_DATASET, "/tmp/ds.json"),
            ]))
            .unwrap();
        assert_eq!(config.classifier.command, vec!["node", "classify.js"]);
        assert_eq!(config.classifier.timeout_ms, 1200);
        assert_eq!(config.dataset_path(), PathBuf::from("/tmp/ds.json"));
    }

    #[test]
    fn test_bad_env_timeout_is_error() {
        let err = ScenegateConfig::default()
            .with_env(env(&[(ENV_CLASSIFIER_TIMEOUT_MS, "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_CLASSIFIER_TIMEOUT_MS));
    }

    #[test]
    fn test_flags_override_env() {
        let config = ScenegateConfig::default()
            .with_env(env(&[(ENV_CLASSIFIER_CMD, "node classify.js")]))
            .unwrap()
            .with_classifier_flags(Some("./router --fast"), Some(300))
            .unwrap();
        assert_eq!(config.classifier.command, vec!["./router", "--fast"]);
        assert_eq!(config.classifier.timeout_ms, 300);
    }
}
