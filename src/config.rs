//! Benchmark and harness configuration
//!
//! A `BenchmarkConfiguration` identifies one baseline/candidate comparison.
//! `HarnessConfig` carries the settings shared by every comparison in an
//! invocation (where executables live, where results go, how long a trial
//! may take).

use crate::accumulator::MIN_TRIALS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Positional values per comparison: baseline, candidate, trials, workload
pub const VALUES_PER_COMPARISON: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "Expected groups of {per} values (baseline candidate trials workload), got {count} value(s)"
    )]
    ArgumentCount { count: usize, per: usize },

    #[error("Comparison {index}: trial count must be >= {min}, got {trials}")]
    TooFewTrials {
        index: usize,
        trials: i64,
        min: usize,
    },

    #[error("Comparison {index}: {field} must be an integer, got '{value}'")]
    NotAnInteger {
        index: usize,
        field: &'static str,
        value: String,
    },

    #[error("Invalid harness setting: {0}")]
    Harness(String),
}

/// Which child output stream carries the metric line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricStream {
    Stdout,
    #[default]
    Stderr,
}

/// Format of the final report printed to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// One baseline vs. candidate comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkConfiguration {
    baseline: String,
    candidate: String,
    trials: usize,
    workload: i64,
}

impl BenchmarkConfiguration {
    pub fn new(
        baseline: impl Into<String>,
        candidate: impl Into<String>,
        trials: usize,
        workload: i64,
    ) -> Result<Self, ConfigError> {
        if trials < MIN_TRIALS {
            return Err(ConfigError::TooFewTrials {
                index: 0,
                trials: trials as i64,
                min: MIN_TRIALS,
            });
        }
        Ok(Self {
            baseline: baseline.into(),
            candidate: candidate.into(),
            trials,
            workload,
        })
    }

    pub fn baseline(&self) -> &str {
        &self.baseline
    }

    pub fn candidate(&self) -> &str {
        &self.candidate
    }

    pub fn trials(&self) -> usize {
        self.trials
    }

    pub fn workload(&self) -> i64 {
        self.workload
    }

    /// Command string passed to both executables
    ///
    /// A workload above 1 selects the extended bench:
    /// `bench 16 <size> 13 default depth mixed`.
    pub fn bench_command(&self) -> String {
        if self.workload > 1 {
            format!("bench 16 {} 13 default depth mixed", self.workload)
        } else {
            "bench".to_string()
        }
    }
}

/// Parse positional values into comparisons
///
/// The whole list is rejected if any group is malformed, so no trial runs
/// for a partly valid invocation.
pub fn parse_comparisons(values: &[String]) -> Result<Vec<BenchmarkConfiguration>, ConfigError> {
    if values.is_empty() || values.len() % VALUES_PER_COMPARISON != 0 {
        return Err(ConfigError::ArgumentCount {
            count: values.len(),
            per: VALUES_PER_COMPARISON,
        });
    }

    values
        .chunks(VALUES_PER_COMPARISON)
        .enumerate()
        .map(|(i, group)| {
            let index = i + 1;
            let trials: i64 = parse_integer(index, "trial count", &group[2])?;
            let workload: i64 = parse_integer(index, "workload", &group[3])?;
            if trials < MIN_TRIALS as i64 {
                return Err(ConfigError::TooFewTrials {
                    index,
                    trials,
                    min: MIN_TRIALS,
                });
            }

            BenchmarkConfiguration::new(
                group[0].as_str(),
                group[1].as_str(),
                trials as usize,
                workload,
            )
        })
        .collect()
}

fn parse_integer<T: std::str::FromStr>(
    index: usize,
    field: &'static str,
    value: &str,
) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::NotAnInteger {
        index,
        field,
        value: value.to_string(),
    })
}

/// Settings shared by every comparison of one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Directory executable identifiers are resolved against
    pub engine_dir: PathBuf,

    /// Directory receiving the dated result log
    pub results_dir: PathBuf,

    /// Stream the metric line is read from
    pub metric_stream: MetricStream,

    /// Wall-clock limit per trial; `None` waits indefinitely
    pub timeout: Option<Duration>,

    /// Final report format on stdout
    pub output_format: OutputFormat,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            engine_dir: PathBuf::from("."),
            results_dir: PathBuf::from("."),
            metric_stream: MetricStream::Stderr,
            timeout: None,
            output_format: OutputFormat::Text,
        }
    }
}

impl HarnessConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err(ConfigError::Harness(
                    "timeout must be greater than zero".to_string(),
                ));
            }
        }

        if !self.results_dir.is_dir() {
            return Err(ConfigError::Harness(format!(
                "results directory {} does not exist",
                self.results_dir.display()
            )));
        }

        Ok(())
    }

    /// Path of an executable identifier; absolute identifiers are kept as-is
    pub fn resolve_executable(&self, identifier: &str) -> PathBuf {
        let path = Path::new(identifier);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.engine_dir.join(path)
        }
    }
}
