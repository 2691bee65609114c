//! CLI argument parsing for pairbench

use crate::config::{ConfigError, HarnessConfig, MetricStream, OutputFormat};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Stream carrying the `Nodes/second` line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StreamArg {
    /// Child standard output
    Stdout,
    /// Child standard error (default)
    Stderr,
}

impl From<StreamArg> for MetricStream {
    fn from(arg: StreamArg) -> Self {
        match arg {
            StreamArg::Stdout => MetricStream::Stdout,
            StreamArg::Stderr => MetricStream::Stderr,
        }
    }
}

/// Final report format
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "pairbench")]
#[command(version)]
#[command(
    about = "Paired A/B throughput comparison of two engine builds",
    long_about = "Runs a baseline and a candidate executable side by side on disjoint CPU sets, \
                  repeats for the requested number of trials and reports the mean difference \
                  with a 95% confidence interval.\n\n\
                  Positional values come in groups of four: \
                  <baseline> <candidate> <trials> <workload>"
)]
pub struct Cli {
    /// Directory baseline and candidate executables are resolved against
    #[arg(long = "engine-dir", value_name = "DIR", default_value = ".")]
    pub engine_dir: PathBuf,

    /// Directory receiving the dated result log
    #[arg(long = "results-dir", value_name = "DIR", default_value = ".")]
    pub results_dir: PathBuf,

    /// Output stream the metric line is read from
    #[arg(long = "metric-stream", value_enum, default_value = "stderr")]
    pub metric_stream: StreamArg,

    /// Kill both processes of a trial running longer than this
    #[arg(long = "timeout-secs", value_name = "SECONDS")]
    pub timeout_secs: Option<f64>,

    /// Final report format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: FormatArg,

    /// Enable debug logging to stderr
    #[arg(long = "debug")]
    pub debug: bool,

    /// Comparison groups: baseline candidate trials workload [...]
    #[arg(value_name = "VALUES", allow_negative_numbers = true)]
    pub comparisons: Vec<String>,
}

impl Cli {
    /// Harness settings shared by every comparison
    pub fn harness_config(&self) -> Result<HarnessConfig, ConfigError> {
        let timeout = self
            .timeout_secs
            .map(|secs| {
                Duration::try_from_secs_f64(secs).map_err(|_| {
                    ConfigError::Harness(format!("invalid timeout: {} seconds", secs))
                })
            })
            .transpose()?;

        Ok(HarnessConfig {
            engine_dir: self.engine_dir.clone(),
            results_dir: self.results_dir.clone(),
            metric_stream: self.metric_stream.into(),
            timeout,
            output_format: self.format.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["pairbench", "base", "test", "10", "1"]);
        assert_eq!(cli.comparisons, vec!["base", "test", "10", "1"]);
        assert!(!cli.debug);

        let config = cli.harness_config().unwrap();
        assert_eq!(config, HarnessConfig::default());
    }

    #[test]
    fn test_cli_harness_flags() {
        let cli = Cli::parse_from([
            "pairbench",
            "--engine-dir",
            "/opt/engines",
            "--metric-stream",
            "stdout",
            "--timeout-secs",
            "2.5",
            "--format",
            "json",
            "--debug",
            "a",
            "b",
            "5",
            "64",
        ]);
        assert!(cli.debug);

        let config = cli.harness_config().unwrap();
        assert_eq!(config.engine_dir, PathBuf::from("/opt/engines"));
        assert_eq!(config.metric_stream, MetricStream::Stdout);
        assert_eq!(config.timeout, Some(Duration::from_millis(2500)));
        assert_eq!(config.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_cli_negative_values_are_positional() {
        let cli = Cli::parse_from(["pairbench", "a", "b", "-3", "1"]);
        assert_eq!(cli.comparisons[2], "-3");
    }

    #[test]
    fn test_cli_rejects_negative_timeout() {
        let cli = Cli::parse_from(["pairbench", "--timeout-secs=-3", "a", "b", "5", "1"]);
        assert!(matches!(cli.harness_config(), Err(ConfigError::Harness(_))));
    }

    #[test]
    fn test_cli_rejects_unknown_stream() {
        let result = Cli::try_parse_from(["pairbench", "--metric-stream", "stdin", "a", "b", "5", "1"]);
        assert!(result.is_err());
    }
}
