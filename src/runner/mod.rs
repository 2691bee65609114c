//! Paired trial execution
//!
//! One trial launches the baseline and candidate executables back to back
//! without waiting in between, pins each to its CPU set for that trial, then
//! drains both output streams concurrently until both processes have exited.
//! Nothing is shared between the two children; the accumulator is only
//! touched once both are reaped.
//!
//! Each child leads its own process group, so a timeout kill also reaches
//! anything the child started that still holds its output pipe.

pub mod affinity;
pub mod metric;

pub use affinity::{pin_process, AffinityError};
pub use metric::{MetricError, MetricExtractor};

use crate::accumulator::TrialResult;
use crate::config::{BenchmarkConfiguration, HarnessConfig, MetricStream};
use crate::placement::CpuSetPair;
use crossbeam::channel::{self, Receiver, RecvTimeoutError};
use std::fmt;
use std::io;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Side of the comparison a process belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Baseline,
    Candidate,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Baseline => write!(f, "baseline"),
            Role::Candidate => write!(f, "candidate"),
        }
    }
}

#[derive(Error, Debug)]
pub enum TrialError {
    #[error("failed to launch {role} executable {}: {source}", .path.display())]
    Launch {
        role: Role,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{role} output: {source}")]
    Metric {
        role: Role,
        #[source]
        source: MetricError,
    },

    #[error("failed waiting for {role} process: {source}")]
    Wait {
        role: Role,
        #[source]
        source: io::Error,
    },

    #[error("{role} output reader panicked")]
    ReaderPanicked { role: Role },

    #[error("trial exceeded the {}s time limit; unfinished processes were killed", .limit.as_secs_f64())]
    Timeout { limit: Duration },
}

/// Anything able to produce the metric pair for a given trial index
pub trait TrialSource {
    fn run_trial(&mut self, trial: usize) -> Result<TrialResult, TrialError>;

    /// True once any process could not be pinned to its CPU set
    fn pinning_degraded(&self) -> bool {
        false
    }
}

/// Runs real baseline/candidate processes
#[derive(Debug)]
pub struct TrialRunner {
    baseline: PathBuf,
    candidate: PathBuf,
    command: String,
    placement: CpuSetPair,
    extractor: MetricExtractor,
    stream: MetricStream,
    timeout: Option<Duration>,
    pinning_degraded: bool,
}

impl TrialRunner {
    pub fn new(
        config: &BenchmarkConfiguration,
        harness: &HarnessConfig,
        placement: CpuSetPair,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            baseline: harness.resolve_executable(config.baseline()),
            candidate: harness.resolve_executable(config.candidate()),
            command: config.bench_command(),
            placement,
            extractor: MetricExtractor::new()?,
            stream: harness.metric_stream,
            timeout: harness.timeout,
            pinning_degraded: false,
        })
    }

    pub fn placement(&self) -> &CpuSetPair {
        &self.placement
    }

    fn spawn(&self, role: Role, path: &Path) -> Result<Child, TrialError> {
        let (stdout, stderr) = match self.stream {
            MetricStream::Stdout => (Stdio::piped(), Stdio::null()),
            MetricStream::Stderr => (Stdio::null(), Stdio::piped()),
        };

        Command::new(path)
            .arg(&self.command)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .process_group(0)
            .spawn()
            .map_err(|source| TrialError::Launch {
                role,
                path: path.to_path_buf(),
                source,
            })
    }

    /// Best-effort pinning; the first failure of a session is logged
    fn pin(&mut self, role: Role, pid: u32, cpus: &[usize]) {
        match pin_process(pid, cpus) {
            Ok(()) => tracing::debug!(%role, pid, ?cpus, "Pinned process"),
            Err(e) => {
                if !self.pinning_degraded {
                    tracing::warn!(
                        "Could not pin {} process to CPUs {:?} ({}); continuing unpinned, expect higher variance",
                        role,
                        cpus,
                        e
                    );
                }
                self.pinning_degraded = true;
            }
        }
    }

    /// Wait for both children while draining their output on separate threads
    ///
    /// Each waiter reports its role once the child is reaped, so the watchdog
    /// only ever signals children that are still running.
    fn collect(&self, baseline: Child, candidate: Child) -> Result<(Output, Output), TrialError> {
        let children = [
            (Role::Baseline, baseline.id()),
            (Role::Candidate, candidate.id()),
        ];
        let (done_tx, done_rx) = channel::bounded::<Role>(children.len());

        std::thread::scope(|scope| {
            let watchdog = self
                .timeout
                .map(|limit| scope.spawn(move || watch(children, done_rx, limit)));

            let base_tx = done_tx.clone();
            let base_handle = scope.spawn(move || {
                let output = baseline.wait_with_output();
                let _ = base_tx.send(Role::Baseline);
                output
            });
            let cand_tx = done_tx;
            let cand_handle = scope.spawn(move || {
                let output = candidate.wait_with_output();
                let _ = cand_tx.send(Role::Candidate);
                output
            });
            let base = base_handle.join();
            let cand = cand_handle.join();

            let timed_out = watchdog.is_some_and(|handle| handle.join().unwrap_or(false));
            if let Some(limit) = self.timeout.filter(|_| timed_out) {
                return Err(TrialError::Timeout { limit });
            }

            let base = base
                .map_err(|_| TrialError::ReaderPanicked {
                    role: Role::Baseline,
                })?
                .map_err(|source| TrialError::Wait {
                    role: Role::Baseline,
                    source,
                })?;
            let cand = cand
                .map_err(|_| TrialError::ReaderPanicked {
                    role: Role::Candidate,
                })?
                .map_err(|source| TrialError::Wait {
                    role: Role::Candidate,
                    source,
                })?;

            Ok((base, cand))
        })
    }

    fn metric(&self, role: Role, output: &Output) -> Result<u64, TrialError> {
        if !output.status.success() {
            tracing::warn!("{} process exited with {}", role, output.status);
        }

        let bytes = match self.stream {
            MetricStream::Stdout => &output.stdout,
            MetricStream::Stderr => &output.stderr,
        };
        self.extractor
            .extract(bytes)
            .map_err(|source| TrialError::Metric { role, source })
    }
}

impl TrialSource for TrialRunner {
    fn run_trial(&mut self, trial: usize) -> Result<TrialResult, TrialError> {
        let (base_cpus, cand_cpus) = self.placement.for_trial(trial);
        let (base_cpus, cand_cpus) = (base_cpus.to_vec(), cand_cpus.to_vec());

        let baseline = self.spawn(Role::Baseline, &self.baseline)?;
        self.pin(Role::Baseline, baseline.id(), &base_cpus);

        let candidate = match self.spawn(Role::Candidate, &self.candidate) {
            Ok(child) => child,
            Err(e) => {
                reap(Role::Baseline, baseline);
                return Err(e);
            }
        };
        self.pin(Role::Candidate, candidate.id(), &cand_cpus);

        let (base_out, cand_out) = self.collect(baseline, candidate)?;
        let base_metric = self.metric(Role::Baseline, &base_out)?;
        let cand_metric = self.metric(Role::Candidate, &cand_out)?;

        Ok(TrialResult::new(base_metric, cand_metric))
    }

    fn pinning_degraded(&self) -> bool {
        self.pinning_degraded
    }
}

/// Kill the group of every child that has not exited by the deadline
///
/// Returns true when at least one group was signalled.
fn watch(children: [(Role, u32); 2], done: Receiver<Role>, limit: Duration) -> bool {
    let deadline = Instant::now() + limit;
    let mut running = children.to_vec();

    while !running.is_empty() {
        match done.recv_deadline(deadline) {
            Ok(role) => running.retain(|&(r, _)| r != role),
            Err(RecvTimeoutError::Timeout) => {
                let mut killed = false;
                for &(role, pid) in &running {
                    killed |= kill_group(role, pid);
                }
                return killed;
            }
            Err(RecvTimeoutError::Disconnected) => return false,
        }
    }
    false
}

fn kill_group(role: Role, pid: u32) -> bool {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) => {
            tracing::debug!(%role, pid, "Killed process group");
            true
        }
        Err(e) => {
            tracing::debug!(%role, pid, "killpg failed: {}", e);
            false
        }
    }
}

fn reap(role: Role, mut child: Child) {
    kill_group(role, child.id());
    let _ = child.wait();
}
