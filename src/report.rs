//! Report rendering and persistence
//!
//! Formats interim and final reports, the per-trial table and the host CPU
//! summary, and appends final reports to a result log named after the local
//! date (`results YYYY-MM-DD.txt`).

use crate::accumulator::{RunningStatistics, TrialResult};
use crate::config::{BenchmarkConfiguration, OutputFormat};
use crate::session::SessionObserver;
use crate::topology::CpuTopology;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Width labels are shortened to in the report
const LABEL_WIDTH: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Interim,
    Final,
}

/// Statistics of one session at a point in time, with its labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    pub kind: ReportKind,
    pub baseline: String,
    pub candidate: String,
    /// Some process ran unpinned during the session
    pub pinning_degraded: bool,
    pub statistics: RunningStatistics,
}

impl SessionReport {
    /// Human-readable report block
    ///
    /// Means and half-widths are rounded to integers; the speedup and the
    /// probability keep four decimals.
    pub fn render_text(&self) -> String {
        let stats = &self.statistics;
        let mut out = String::new();

        let _ = write!(out, "\nResult of {:3} runs\n------------------\n", stats.trials);
        let _ = writeln!(
            out,
            "base ({:<15}) = {:>10}  +/- {}",
            shorten_label(&self.baseline),
            round(stats.baseline.mean),
            round(stats.baseline.half_width)
        );
        let _ = writeln!(
            out,
            "test ({:<15}) = {:>10}  +/- {}",
            shorten_label(&self.candidate),
            round(stats.candidate.mean),
            round(stats.candidate.half_width)
        );
        let _ = writeln!(
            out,
            "{:22} = {:>+10}  +/- {}",
            "diff",
            round(stats.difference.mean),
            round(stats.difference.half_width)
        );
        let _ = write!(out, "\nspeedup        = {:>+6.4}\n", stats.speedup);
        let _ = writeln!(out, "P(speedup > 0) = {:>7.4}", stats.probability_faster);
        if self.pinning_degraded {
            out.push_str("(CPU pinning unavailable: variance may be inflated)\n");
        }
        out.push('\n');

        out
    }
}

fn round(value: f64) -> i64 {
    value.round() as i64
}

/// Keep labels within the report column: `...` plus the last 12 characters
pub fn shorten_label(label: &str) -> String {
    let count = label.chars().count();
    if count <= LABEL_WIDTH {
        return label.to_string();
    }
    let tail: String = label.chars().skip(count - (LABEL_WIDTH - 3)).collect();
    format!("...{}", tail)
}

pub fn render_trial_header() -> String {
    format!("{:>3} {:>10} {:>10} {:>8}", "run", "base", "test", "diff")
}

/// One row of the trial table; `trial` is 0-based and printed 1-based
pub fn render_trial_row(trial: usize, result: &TrialResult) -> String {
    format!(
        "{:>3} {:>10} {:>10} {:>+8}",
        trial + 1,
        result.baseline,
        result.candidate,
        result.difference
    )
}

/// Host description printed after each final report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuSummary {
    pub cores: usize,
    pub model: String,
    pub hyperthreading: bool,
}

impl CpuSummary {
    pub fn new(topology: &CpuTopology, model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            cores: topology.core_count,
            model: if model.trim().is_empty() {
                "unknown".to_string()
            } else {
                model
            },
            hyperthreading: topology.hyperthreading(),
        }
    }

    pub fn render_text(&self) -> String {
        format!(
            "\nCPU: {} x {}\nHyperthreading: {} \n\n",
            self.cores,
            self.model,
            if self.hyperthreading { "on" } else { "off" }
        )
    }
}

/// Append-only text log of final reports
#[derive(Debug, Clone)]
pub struct ResultLog {
    path: PathBuf,
}

impl ResultLog {
    pub fn for_date(dir: &Path, date: NaiveDate) -> Self {
        Self {
            path: dir.join(format!("results {}.txt", date.format("%Y-%m-%d"))),
        }
    }

    /// Log for the current local date
    pub fn for_today(dir: &Path) -> Self {
        Self::for_date(dir, Local::now().date_naive())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append text, creating the file if needed
    pub fn append(&self, text: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(text.as_bytes())?;
        file.flush()
    }
}

#[derive(Serialize)]
struct FinalRecord<'a> {
    #[serde(flatten)]
    report: &'a SessionReport,
    cpu: &'a CpuSummary,
}

/// Prints session progress to stdout and persists final reports
pub struct ConsoleReporter {
    format: OutputFormat,
    log: Option<ResultLog>,
    cpu: CpuSummary,
}

impl ConsoleReporter {
    pub fn new(format: OutputFormat, log: Option<ResultLog>, cpu: CpuSummary) -> Self {
        Self { format, log, cpu }
    }

    pub fn log(&self) -> Option<&ResultLog> {
        self.log.as_ref()
    }
}

impl SessionObserver for ConsoleReporter {
    fn session_started(&mut self, config: &BenchmarkConfiguration) {
        tracing::info!(
            baseline = config.baseline(),
            candidate = config.candidate(),
            trials = config.trials(),
            command = %config.bench_command(),
            "Starting comparison"
        );
        if self.format == OutputFormat::Text {
            println!("{}", render_trial_header());
        }
    }

    fn trial_completed(&mut self, trial: usize, result: &TrialResult) {
        if self.format == OutputFormat::Text {
            println!("{}", render_trial_row(trial, result));
        }
    }

    fn interim_report(&mut self, report: &SessionReport) {
        if self.format == OutputFormat::Text {
            print!("{}", report.render_text());
        }
    }

    fn final_report(&mut self, report: &SessionReport) -> io::Result<()> {
        let text = report.render_text();
        let cpu = self.cpu.render_text();

        match self.format {
            OutputFormat::Text => print!("{}{}", text, cpu),
            OutputFormat::Json => {
                let record = FinalRecord {
                    report,
                    cpu: &self.cpu,
                };
                let json = serde_json::to_string_pretty(&record).map_err(io::Error::other)?;
                println!("{}", json);
            }
        }

        if let Some(log) = &self.log {
            log.append(&format!("{}{}", text, cpu))?;
            tracing::debug!(path = %log.path().display(), "Appended final report");
        }
        Ok(())
    }
}
