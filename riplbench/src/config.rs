//! Configuration loading from riplbench.toml
//!
//! Experiment settings can be kept in a `riplbench.toml` file in the project
//! root. The file is discovered by walking up from the current directory;
//! every field has a default.

use anyhow::Context;
use riplbench_core::History;
use riplbench_report::OutputFormat;
use riplbench_stats::KlConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up by [`BenchConfig::discover`]
pub const CONFIG_FILE: &str = "riplbench.toml";

/// riplbench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct BenchConfig {
    /// Which driver to run and how long
    #[serde(default)]
    pub experiment: ExperimentConfig,
    /// KL estimator settings
    #[serde(default)]
    pub stats: StatsConfig,
    /// Report output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Benchmark driver to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ExperimentKind {
    /// i.i.d. draws from the joint
    SampleFromJoint,
    /// Inference chains on the joint
    #[default]
    RunFromJoint,
    /// Sampling plus chains plus KL curves
    JointKl,
    /// Inference chains conditioned on the model's observe data
    RunFromConditional,
    /// Inference chains conditioned on data drawn from the prior
    ConditionedFromPrior,
}

/// Experiment configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentConfig {
    /// Driver to run
    #[serde(default)]
    pub kind: ExperimentKind,
    /// Sweeps per chain
    #[serde(default = "default_sweeps")]
    pub sweeps: usize,
    /// i.i.d. samples drawn from the joint
    #[serde(default = "default_samples")]
    pub samples: usize,
    /// Predicts to track; negative tracks all of them
    #[serde(default = "default_track")]
    pub track: i64,
    /// Independent chains
    #[serde(default = "default_runs")]
    pub runs: usize,
    /// Log progress at info level
    #[serde(default)]
    pub verbose: bool,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            kind: ExperimentKind::default(),
            sweeps: default_sweeps(),
            samples: default_samples(),
            track: default_track(),
            runs: default_runs(),
            verbose: false,
        }
    }
}

impl ExperimentConfig {
    /// Track limit as taken by the drivers (`None` tracks every predict)
    pub fn track_limit(&self) -> Option<usize> {
        usize::try_from(self.track).ok()
    }
}

fn default_sweeps() -> usize {
    10
}
fn default_samples() -> usize {
    100
}
fn default_track() -> i64 {
    5
}
fn default_runs() -> usize {
    3
}

/// KL estimator configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatsConfig {
    /// Histogram bins
    #[serde(default = "default_kl_bins")]
    pub kl_bins: usize,
    /// Smoothing mass spread across bins
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            kl_bins: default_kl_bins(),
            smoothing: default_smoothing(),
        }
    }
}

impl StatsConfig {
    /// Settings in the form the estimator takes
    pub fn kl_config(&self) -> KlConfig {
        KlConfig {
            bins: self.kl_bins,
            smoothing: self.smoothing,
        }
    }
}

fn default_kl_bins() -> usize {
    riplbench_stats::DEFAULT_KL_BINS
}
fn default_smoothing() -> f64 {
    riplbench_stats::DEFAULT_SMOOTHING
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    /// Root directory for reports
    #[serde(default = "default_root")]
    pub root: String,
    /// Subdirectory override; defaults to the history's own directory name
    #[serde(default)]
    pub directory: Option<String>,
    /// Formats to write: "json", "csv", "human"
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            directory: None,
            formats: default_formats(),
        }
    }
}

impl OutputConfig {
    /// Parsed output formats
    pub fn output_formats(&self) -> anyhow::Result<Vec<OutputFormat>> {
        self.formats
            .iter()
            .map(|f| f.parse::<OutputFormat>().map_err(anyhow::Error::msg))
            .collect()
    }

    /// Directory reports for `history` are written to
    pub fn directory_for(&self, history: &History) -> PathBuf {
        let sub = self
            .directory
            .clone()
            .unwrap_or_else(|| history.default_directory());
        Path::new(&self.root).join(sub)
    }
}

fn default_root() -> String {
    "target/riplbench".to_string()
}
fn default_formats() -> Vec<String> {
    vec!["json".to_string()]
}

impl BenchConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from `start`
    pub fn discover_from(start: impl AsRef<Path>) -> Option<Self> {
        let mut dir = start.as_ref().to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        tracing::warn!("Ignoring {}: {:#}", config_path.display(), e);
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Try to discover and load configuration by walking up from the current directory
    pub fn discover() -> Option<Self> {
        Self::discover_from(std::env::current_dir().ok()?)
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# riplbench Configuration

[experiment]
# Driver: sample-from-joint, run-from-joint, joint-kl,
#         run-from-conditional, conditioned-from-prior
kind = "run-from-joint"
# Sweeps per chain
sweeps = 10
# i.i.d. samples drawn from the joint (sample-from-joint, joint-kl)
samples = 100
# Predicts to track; -1 tracks all of them
track = 5
# Independent chains
runs = 3
# Log progress at info level
verbose = false

[stats]
# Histogram bins for KL estimation
kl_bins = 20
# Smoothing mass spread across bins
smoothing = 0.1

[output]
# Root directory for reports
root = "target/riplbench"
# Subdirectory override (uncomment to enable)
# directory = "my_run"
# Formats to write: json, csv, human
formats = ["json"]
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riplbench_core::Parameters;

    #[test]
    fn test_default_config() {
        let config = BenchConfig::default();
        assert_eq!(config.experiment.kind, ExperimentKind::RunFromJoint);
        assert_eq!(config.experiment.sweeps, 10);
        assert_eq!(config.experiment.track_limit(), Some(5));
        assert_eq!(config.stats.kl_config(), KlConfig::default());
        assert_eq!(config.output.formats, vec!["json"]);
    }

    #[test]
    fn test_default_toml_matches_defaults() {
        let parsed: BenchConfig = toml::from_str(&BenchConfig::default_toml()).unwrap();
        assert_eq!(parsed, BenchConfig::default());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [experiment]
            kind = "joint-kl"
            track = -1
            runs = 2

            [output]
            formats = ["csv", "human"]
        "#;

        let config: BenchConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.experiment.kind, ExperimentKind::JointKl);
        assert_eq!(config.experiment.track_limit(), None);
        assert_eq!(config.experiment.runs, 2);
        // Defaults should still apply
        assert_eq!(config.experiment.sweeps, 10);
        assert_eq!(config.stats.kl_bins, 20);
        assert_eq!(
            config.output.output_formats().unwrap(),
            vec![OutputFormat::Csv, OutputFormat::Human]
        );
    }

    #[test]
    fn test_unknown_format_rejected() {
        let config = OutputConfig {
            formats: vec!["pdf".to_string()],
            ..Default::default()
        };
        assert!(config.output_formats().is_err());
    }

    #[test]
    fn test_directory_for() {
        let mut parameters = Parameters::new();
        parameters.insert("random_seed".into(), 1.into());
        let history = History::new("run_from_joint", parameters);

        let config = OutputConfig::default();
        assert_eq!(
            config.directory_for(&history),
            Path::new("target/riplbench").join("run_from_joint_random_seed=1/")
        );

        let fixed = OutputConfig {
            directory: Some("fixed".into()),
            ..Default::default()
        };
        assert_eq!(
            fixed.directory_for(&history),
            Path::new("target/riplbench/fixed")
        );
    }

    #[test]
    fn test_discover_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[experiment]\nsweeps = 4\n",
        )
        .unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let config = BenchConfig::discover_from(&nested).unwrap();
        assert_eq!(config.experiment.sweeps, 4);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(BenchConfig::load(dir.path().join("nope.toml")).is_err());
    }
}
