//! Configuration system for the legality estimator.
//!
//! Load sampling configuration from TOML or YAML files to control sample
//! sizes, stopping rules, seeding and parallelism without code changes.
//!
//! # Examples
//!
//! Load configuration from TOML string:
//!
//! ```
//! use legality_config::{SamplingConfig, StoppingConfig};
//! use std::time::Duration;
//!
//! let config = SamplingConfig::from_toml_str(r#"
//!     initial_sizes = [500, 1000]
//!     max_sample = 64000
//!     random_seed = 7
//!     class_time_limit_secs = 30
//!
//!     [stopping]
//!     type = "relative_difference"
//!     rel_threshold = 0.1
//!     abs_threshold = 1e-6
//! "#).unwrap();
//!
//! assert_eq!(config.initial_sizes, vec![500, 1000]);
//! assert_eq!(config.class_time_limit(), Some(Duration::from_secs(30)));
//! assert!(matches!(config.stopping, StoppingConfig::RelativeDifference { .. }));
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use legality_config::SamplingConfig;
//!
//! let config = SamplingConfig::load("sampling.toml").unwrap_or_default();
//! assert_eq!(config.max_sample, 128_000);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main sampling configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case", default)]
pub struct SamplingConfig {
    /// Sample sizes always attempted first, in order.
    pub initial_sizes: Vec<u64>,

    /// Largest sample size; doubling stops here.
    pub max_sample: u64,

    /// Relative standard error below which a class counts as converged.
    pub rel_std_threshold: f64,

    /// Stopping rule applied after the initial sizes.
    pub stopping: StoppingConfig,

    /// Ignore the pawns-on-back-rank violation and use the looser file cap.
    pub tolerate_backrank_pawns: bool,

    /// Random seed for reproducible results; OS entropy when absent.
    pub random_seed: Option<u64>,

    /// Wall-clock budget per class in seconds; unlimited when absent.
    pub class_time_limit_secs: Option<u64>,

    /// Worker threads running shards.
    pub workers: WorkerCount,

    /// Number of shards; defaults to the worker count.
    pub shards: Option<usize>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            initial_sizes: vec![1_000, 2_000],
            max_sample: 128_000,
            rel_std_threshold: 0.05,
            stopping: StoppingConfig::default(),
            tolerate_backrank_pawns: true,
            random_seed: None,
            class_time_limit_secs: None,
            workers: WorkerCount::default(),
            shards: None,
        }
    }
}

impl SamplingConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist, contains invalid TOML, or fails
    /// validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks sample sizes and thresholds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_sizes.is_empty() {
            return Err(ConfigError::Invalid("initial_sizes must not be empty".into()));
        }
        if self.initial_sizes.contains(&0) {
            return Err(ConfigError::Invalid("sample sizes must be positive".into()));
        }
        if self.max_sample == 0 {
            return Err(ConfigError::Invalid("max_sample must be positive".into()));
        }
        if !(self.rel_std_threshold > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "rel_std_threshold must be positive, got {}",
                self.rel_std_threshold
            )));
        }
        if let StoppingConfig::RelativeDifference {
            rel_threshold,
            abs_threshold,
        } = self.stopping
        {
            if !(rel_threshold > 0.0) || abs_threshold < 0.0 {
                return Err(ConfigError::Invalid(
                    "relative_difference thresholds must be positive".into(),
                ));
            }
        }
        if let WorkerCount::Count(0) = self.workers {
            return Err(ConfigError::Invalid("worker count must be positive".into()));
        }
        if self.shards == Some(0) {
            return Err(ConfigError::Invalid("shard count must be positive".into()));
        }
        Ok(())
    }

    /// Sets the initial sample sizes.
    pub fn with_initial_sizes(mut self, sizes: Vec<u64>) -> Self {
        self.initial_sizes = sizes;
        self
    }

    /// Sets the largest sample size.
    pub fn with_max_sample(mut self, max_sample: u64) -> Self {
        self.max_sample = max_sample;
        self
    }

    /// Sets the relative standard error threshold.
    pub fn with_rel_std_threshold(mut self, threshold: f64) -> Self {
        self.rel_std_threshold = threshold;
        self
    }

    /// Sets the stopping rule.
    pub fn with_stopping(mut self, stopping: StoppingConfig) -> Self {
        self.stopping = stopping;
        self
    }

    /// Sets whether back-rank pawns are tolerated.
    pub fn with_tolerate_backrank_pawns(mut self, tolerate: bool) -> Self {
        self.tolerate_backrank_pawns = tolerate;
        self
    }

    /// Sets the random seed.
    pub fn with_random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Sets the per-class time budget.
    pub fn with_class_time_limit_secs(mut self, seconds: u64) -> Self {
        self.class_time_limit_secs = Some(seconds);
        self
    }

    /// Sets the worker count.
    pub fn with_workers(mut self, workers: WorkerCount) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the shard count.
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = Some(shards);
        self
    }

    /// Returns the per-class time budget, if configured.
    ///
    /// # Examples
    ///
    /// ```
    /// use legality_config::SamplingConfig;
    /// use std::time::Duration;
    ///
    /// assert_eq!(SamplingConfig::default().class_time_limit(), None);
    /// let config = SamplingConfig::new().with_class_time_limit_secs(5);
    /// assert_eq!(config.class_time_limit(), Some(Duration::from_secs(5)));
    /// ```
    pub fn class_time_limit(&self) -> Option<Duration> {
        self.class_time_limit_secs
            .filter(|&s| s > 0)
            .map(Duration::from_secs)
    }

    /// Resolves the worker count to a concrete number of threads.
    pub fn worker_count(&self) -> usize {
        self.workers.resolve()
    }

    /// Resolves the shard count, defaulting to the worker count.
    pub fn shard_count(&self) -> usize {
        self.shards.unwrap_or_else(|| self.worker_count()).max(1)
    }
}

/// Stopping rule applied once the initial sample sizes are recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoppingConfig {
    /// Stop when the relative binomial standard error drops below
    /// `rel_std_threshold`.
    #[default]
    RelativeStdError,

    /// Stop when the two largest samples agree, relatively or absolutely.
    RelativeDifference {
        #[serde(default = "default_rel_threshold")]
        rel_threshold: f64,
        #[serde(default = "default_abs_threshold")]
        abs_threshold: f64,
    },
}

fn default_rel_threshold() -> f64 {
    0.10
}

fn default_abs_threshold() -> f64 {
    1e-6
}

/// Worker thread count configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerCount {
    /// One worker per available core.
    #[default]
    Auto,

    /// Specific number of workers.
    Count(usize),
}

impl WorkerCount {
    pub fn resolve(self) -> usize {
        match self {
            WorkerCount::Auto => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            WorkerCount::Count(n) => n.max(1),
        }
    }
}
