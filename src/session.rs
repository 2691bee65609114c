//! Session control for one benchmark configuration
//!
//! A session runs trials strictly one after another until the requested
//! count is reached, feeding each result into its own accumulator. Interim
//! reports are handed to the observer along the way; the final report is
//! emitted exactly once, on the transition to `Completed`.
//!
//! ```text
//! Running(0) -> Running(1) -> ... -> Running(n - 1) -> Completed
//! ```
//!
//! A failed trial aborts the session without recording anything for it, so
//! no partial statistics are ever presented as complete.

use crate::accumulator::{ReportError, TrialAccumulator, TrialResult};
use crate::config::BenchmarkConfiguration;
use crate::report::{ReportKind, SessionReport};
use crate::runner::{TrialError, TrialSource};
use thiserror::Error;

/// Trials between interim reports
pub const INTERIM_INTERVAL: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running { completed: usize },
    Completed,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("trial {trial} of {trials} failed: {source}")]
    Trial {
        /// 1-based trial number
        trial: usize,
        trials: usize,
        #[source]
        source: TrialError,
    },

    #[error("session already completed")]
    AlreadyCompleted,

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("failed to persist final report: {0}")]
    Persist(#[source] std::io::Error),
}

/// Receives progress from a running session
pub trait SessionObserver {
    fn session_started(&mut self, _config: &BenchmarkConfiguration) {}

    fn trial_completed(&mut self, _trial: usize, _result: &TrialResult) {}

    fn interim_report(&mut self, _report: &SessionReport) {}

    /// Called once when the session completes; persistence happens here
    fn final_report(&mut self, report: &SessionReport) -> std::io::Result<()>;
}

/// Whether the trial with 0-based index `trial` gets an interim report
///
/// Every fifth trial, skipping the first few and the last one (which gets
/// the final report instead). Short runs may therefore see none at all.
pub fn should_emit_interim(trial: usize, trials: usize) -> bool {
    (trial + 1) % INTERIM_INTERVAL == 0 && trial > 1 && trial + 1 < trials
}

/// Drives the trial loop of one configuration
pub struct SessionController<S: TrialSource> {
    config: BenchmarkConfiguration,
    source: S,
    accumulator: TrialAccumulator,
    state: SessionState,
}

impl<S: TrialSource> SessionController<S> {
    pub fn new(config: BenchmarkConfiguration, source: S) -> Self {
        Self {
            config,
            source,
            accumulator: TrialAccumulator::new(),
            state: SessionState::Running { completed: 0 },
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &BenchmarkConfiguration {
        &self.config
    }

    pub fn accumulator(&self) -> &TrialAccumulator {
        &self.accumulator
    }

    /// Run a single trial and advance the state machine
    pub fn step(&mut self, observer: &mut dyn SessionObserver) -> Result<SessionState, SessionError> {
        let SessionState::Running { completed } = self.state else {
            return Err(SessionError::AlreadyCompleted);
        };
        let trials = self.config.trials();

        let result = self
            .source
            .run_trial(completed)
            .map_err(|source| SessionError::Trial {
                trial: completed + 1,
                trials,
                source,
            })?;

        self.accumulator.push(result);
        observer.trial_completed(completed, &result);
        tracing::debug!(trial = completed, ?result, "Trial completed");

        let completed = completed + 1;
        if completed == trials {
            let report = self.report(ReportKind::Final)?;
            self.state = SessionState::Completed;
            observer.final_report(&report).map_err(SessionError::Persist)?;
        } else {
            if should_emit_interim(completed - 1, trials) {
                observer.interim_report(&self.report(ReportKind::Interim)?);
            }
            self.state = SessionState::Running { completed };
        }

        Ok(self.state)
    }

    /// Run every remaining trial and return the final report
    pub fn run(mut self, observer: &mut dyn SessionObserver) -> Result<SessionReport, SessionError> {
        if self.state == SessionState::Completed {
            return Err(SessionError::AlreadyCompleted);
        }

        observer.session_started(&self.config);
        while self.step(observer)? != SessionState::Completed {}

        Ok(self.report(ReportKind::Final)?)
    }

    fn report(&self, kind: ReportKind) -> Result<SessionReport, ReportError> {
        Ok(SessionReport {
            kind,
            baseline: self.config.baseline().to_string(),
            candidate: self.config.candidate().to_string(),
            pinning_degraded: self.source.pinning_degraded(),
            statistics: self.accumulator.report()?,
        })
    }
}
