//! Benchmark run configuration
//!
//! Per-family concurrency, retry and timeout settings, sandbox options and
//! output locations. Loadable from YAML or JSON.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::benchmarks::DatasetKind;
use crate::error::{BenchError, BenchResult};
use crate::report::CostAggregation;

/// Concurrency and retry settings for one dataset family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyProfile {
    /// Upper bound on simultaneous workflow invocations
    pub max_concurrent_tasks: usize,

    /// Total workflow invocations per item, including the first
    #[serde(alias = "max_retries")]
    pub max_attempts: u32,

    /// Per-call timeout; a timed-out call is not retried
    #[serde(default, with = "humantime_serde")]
    pub call_timeout: Option<Duration>,

    /// Pause between failed attempts
    #[serde(default = "default_retry_delay", with = "humantime_serde")]
    pub retry_delay: Duration,
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(1)
}

impl FamilyProfile {
    /// Set concurrency
    pub fn with_concurrency(mut self, max_concurrent_tasks: usize) -> Self {
        self.max_concurrent_tasks = max_concurrent_tasks;
        self
    }

    /// Set number of attempts
    pub fn with_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set per-call timeout
    pub fn with_call_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Set retry delay
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

/// Settings for the code sandbox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Interpreter used to run solutions
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Hard wall-clock limit for one check
    #[serde(default = "default_sandbox_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Append-only log of failed checks
    #[serde(default = "default_error_log")]
    pub error_log: PathBuf,
}

fn default_interpreter() -> String {
    "python3".to_string()
}

fn default_sandbox_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_error_log() -> PathBuf {
    PathBuf::from("error.log")
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            timeout: default_sandbox_timeout(),
            error_log: default_error_log(),
        }
    }
}

/// Configuration for benchmark runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Directory holding `{dataset}_{split}.jsonl` files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory under which run directories are created
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Overrides of the built-in family profiles
    #[serde(default)]
    pub profiles: HashMap<DatasetKind, FamilyProfile>,

    /// Code sandbox settings
    #[serde(default)]
    pub sandbox: SandboxConfig,

    /// Budget for each symbolic math comparison
    #[serde(default = "default_symbolic_timeout", with = "humantime_serde")]
    pub symbolic_timeout: Duration,

    /// How per-row costs combine into the run total
    #[serde(default)]
    pub cost_aggregation: CostAggregation,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/datasets")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_symbolic_timeout() -> Duration {
    Duration::from_secs(5)
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            output_dir: default_output_dir(),
            profiles: HashMap::new(),
            sandbox: SandboxConfig::default(),
            symbolic_timeout: default_symbolic_timeout(),
            cost_aggregation: CostAggregation::default(),
        }
    }
}

impl BenchConfig {
    /// Load from a `.yaml`/`.yml` or `.json` file
    pub fn from_file(path: impl AsRef<Path>) -> BenchResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BenchError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content).map_err(|e| {
                BenchError::Config(format!("Invalid YAML in {}: {}", path.display(), e))
            }),
            Some("json") => serde_json::from_str(&content).map_err(|e| {
                BenchError::Config(format!("Invalid JSON in {}: {}", path.display(), e))
            }),
            _ => Err(BenchError::Config(format!(
                "Unsupported config format: {}",
                path.display()
            ))),
        }
    }

    /// Effective profile for a dataset
    pub fn profile(&self, kind: DatasetKind) -> FamilyProfile {
        self.profiles
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| kind.default_profile())
    }

    /// Set data directory
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Override the profile for one dataset
    pub fn with_profile(mut self, kind: DatasetKind, profile: FamilyProfile) -> Self {
        self.profiles.insert(kind, profile);
        self
    }

    /// Set sandbox settings
    pub fn with_sandbox(mut self, sandbox: SandboxConfig) -> Self {
        self.sandbox = sandbox;
        self
    }

    /// Set the symbolic comparison budget
    pub fn with_symbolic_timeout(mut self, timeout: Duration) -> Self {
        self.symbolic_timeout = timeout;
        self
    }

    /// Set cost aggregation
    pub fn with_cost_aggregation(mut self, aggregation: CostAggregation) -> Self {
        self.cost_aggregation = aggregation;
        self
    }
}
