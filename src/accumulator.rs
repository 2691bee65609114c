//! Running accumulation of paired trial results
//!
//! The accumulator keeps the baseline, candidate and difference series side
//! by side and derives interval estimates on demand. Reports are a pure read
//! over the history, so an interim report never disturbs the session.

use crate::gaussian::{confidence_z, standard_normal_cdf};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Confidence level of the two-sided intervals in every report
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Sample standard deviation needs at least two observations
pub const MIN_TRIALS: usize = 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("Insufficient trials: need at least {required}, got {actual}")]
    InsufficientTrials { required: usize, actual: usize },
}

/// Metric pair produced by one trial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialResult {
    pub baseline: u64,
    pub candidate: u64,
    /// candidate - baseline
    pub difference: i64,
}

impl TrialResult {
    /// Pair two metrics; the difference saturates at the `i64` bounds
    pub fn new(baseline: u64, candidate: u64) -> Self {
        let difference = i128::from(candidate) - i128::from(baseline);
        Self {
            baseline,
            candidate,
            difference: difference.clamp(i64::MIN.into(), i64::MAX.into()) as i64,
        }
    }
}

/// Descriptive statistics for one series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub mean: f64,
    /// Sample standard deviation (n - 1 denominator)
    pub stdev: f64,
    /// Standard error of the mean, `stdev / sqrt(n)`
    pub sem: f64,
    /// Half-width of the two-sided confidence interval
    pub half_width: f64,
}

impl SeriesSummary {
    fn from_samples(samples: &[f64], z: f64) -> Self {
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let sum_sq: f64 = samples.iter().map(|x| (x - mean) * (x - mean)).sum();
        let stdev = (sum_sq / (n - 1.0)).sqrt();
        let sem = stdev / n.sqrt();

        Self {
            mean,
            stdev,
            sem,
            half_width: z * sem,
        }
    }
}

/// Snapshot of the estimates over every completed trial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningStatistics {
    pub trials: usize,
    pub baseline: SeriesSummary,
    pub candidate: SeriesSummary,
    pub difference: SeriesSummary,
    /// Mean difference relative to the baseline mean
    pub speedup: f64,
    /// One-sided probability that the candidate is faster
    pub probability_faster: f64,
}

/// Append-only history of paired results for one configuration
#[derive(Debug, Default, Clone)]
pub struct TrialAccumulator {
    baseline: Vec<f64>,
    candidate: Vec<f64>,
    difference: Vec<f64>,
    results: Vec<TrialResult>,
}

impl TrialAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: TrialResult) {
        self.baseline.push(result.baseline as f64);
        self.candidate.push(result.candidate as f64);
        self.difference.push(result.difference as f64);
        self.results.push(result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> &[TrialResult] {
        &self.results
    }

    /// Compute estimates over the current history
    ///
    /// Treats the difference series as normal (CLT) even for small `n`, so
    /// `P(speedup > 0) = Φ(mean_diff / sem_diff)`.
    ///
    /// # Example
    /// ```
    /// use pairbench::accumulator::{TrialAccumulator, TrialResult};
    ///
    /// let mut acc = TrialAccumulator::new();
    /// acc.push(TrialResult::new(100, 110));
    /// assert!(acc.report().is_err());
    ///
    /// acc.push(TrialResult::new(102, 108));
    /// let stats = acc.report().unwrap();
    /// assert_eq!(stats.difference.mean, 8.0);
    /// ```
    pub fn report(&self) -> Result<RunningStatistics, ReportError> {
        let n = self.len();
        if n < MIN_TRIALS {
            return Err(ReportError::InsufficientTrials {
                required: MIN_TRIALS,
                actual: n,
            });
        }

        let z = confidence_z(CONFIDENCE_LEVEL);
        let baseline = SeriesSummary::from_samples(&self.baseline, z);
        let candidate = SeriesSummary::from_samples(&self.candidate, z);
        let difference = SeriesSummary::from_samples(&self.difference, z);

        Ok(RunningStatistics {
            trials: n,
            speedup: speedup(difference.mean, baseline.mean),
            probability_faster: probability_faster(difference.mean, difference.sem),
            baseline,
            candidate,
            difference,
        })
    }
}

fn speedup(mean_difference: f64, baseline_mean: f64) -> f64 {
    if baseline_mean == 0.0 && mean_difference == 0.0 {
        return 0.0;
    }
    mean_difference / baseline_mean
}

/// Φ(mean / sem), with a fixed convention when the series has no spread
///
/// A zero standard error resolves to the limit of the CDF: 0.5 for a zero
/// mean, 1.0 for a positive mean, 0.0 for a negative one.
fn probability_faster(mean_difference: f64, sem_difference: f64) -> f64 {
    if sem_difference == 0.0 {
        return match mean_difference.partial_cmp(&0.0) {
            Some(std::cmp::Ordering::Greater) => 1.0,
            Some(std::cmp::Ordering::Less) => 0.0,
            _ => 0.5,
        };
    }
    standard_normal_cdf(mean_difference / sem_difference)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accumulate(baseline: &[u64], candidate: &[u64]) -> TrialAccumulator {
        let mut acc = TrialAccumulator::new();
        for (b, c) in baseline.iter().zip(candidate) {
            acc.push(TrialResult::new(*b, *c));
        }
        acc
    }

    #[test]
    fn test_trial_result_difference_is_signed() {
        assert_eq!(TrialResult::new(100, 90).difference, -10);
        assert_eq!(TrialResult::new(90, 100).difference, 10);
    }

    #[test]
    fn test_trial_result_difference_does_not_overflow() {
        let big = 9_223_372_036_854_775_808u64;
        assert_eq!(TrialResult::new(1, big).difference, i64::MAX);
        assert_eq!(TrialResult::new(u64::MAX, 0).difference, i64::MIN);
        assert_eq!(
            TrialResult::new(0, i64::MAX as u64).difference,
            i64::MAX
        );
    }

    #[test]
    fn test_report_rejects_empty() {
        let acc = TrialAccumulator::new();
        assert_eq!(
            acc.report(),
            Err(ReportError::InsufficientTrials {
                required: 2,
                actual: 0
            })
        );
    }

    #[test]
    fn test_report_rejects_single_trial() {
        let acc = accumulate(&[100], &[110]);
        assert!(matches!(
            acc.report(),
            Err(ReportError::InsufficientTrials { actual: 1, .. })
        ));
    }

    #[test]
    fn test_report_at_two_trials() {
        let acc = accumulate(&[100, 104], &[110, 110]);
        let stats = acc.report().unwrap();

        assert_eq!(stats.trials, 2);
        assert_eq!(stats.baseline.mean, 102.0);
        // stdev of [100, 104] = sqrt(8), sem = sqrt(8)/sqrt(2) = 2
        assert!((stats.baseline.sem - 2.0).abs() < 1e-12);
        assert_eq!(stats.candidate.sem, 0.0);
        assert!(stats.probability_faster > 0.5);
    }

    #[test]
    fn test_consistent_improvement() {
        let acc = accumulate(&[100, 102, 98, 101, 99], &[110, 108, 112, 109, 111]);
        let stats = acc.report().unwrap();

        let diffs: Vec<i64> = acc.results().iter().map(|r| r.difference).collect();
        assert_eq!(diffs, vec![10, 6, 14, 8, 12]);
        assert_eq!(stats.difference.mean, 10.0);
        assert_eq!(stats.baseline.mean, 100.0);
        assert!((stats.speedup - 0.10).abs() < 1e-12);
        assert!(stats.probability_faster > 0.99);
    }

    #[test]
    fn test_half_width_uses_975_quantile() {
        let acc = accumulate(&[100, 102, 98, 101, 99], &[110, 108, 112, 109, 111]);
        let stats = acc.report().unwrap();

        // diff stdev = sqrt(10), sem = sqrt(2)
        assert!((stats.difference.sem - 2f64.sqrt()).abs() < 1e-12);
        let z = crate::gaussian::standard_normal_quantile(0.975);
        assert_eq!(stats.difference.half_width, z * stats.difference.sem);
    }

    #[test]
    fn test_identical_metrics_zero_variance() {
        let acc = accumulate(&[500; 5], &[500; 5]);
        let stats = acc.report().unwrap();

        assert_eq!(stats.difference.mean, 0.0);
        assert_eq!(stats.difference.sem, 0.0);
        assert_eq!(stats.speedup, 0.0);
        assert_eq!(stats.probability_faster, 0.5);
    }

    #[test]
    fn test_constant_positive_difference() {
        let acc = accumulate(&[500, 600, 700], &[510, 610, 710]);
        let stats = acc.report().unwrap();

        assert_eq!(stats.difference.sem, 0.0);
        assert_eq!(stats.probability_faster, 1.0);
    }

    #[test]
    fn test_constant_negative_difference() {
        let acc = accumulate(&[500, 600], &[490, 590]);
        assert_eq!(acc.report().unwrap().probability_faster, 0.0);
    }

    #[test]
    fn test_regression_probability_below_half() {
        let acc = accumulate(&[110, 108, 112, 109, 111], &[100, 102, 98, 101, 99]);
        let stats = acc.report().unwrap();
        assert!(stats.speedup < 0.0);
        assert!(stats.probability_faster < 0.01);
    }

    #[test]
    fn test_report_is_idempotent() {
        let acc = accumulate(&[100, 97, 103], &[101, 99, 104]);
        let first = acc.report().unwrap();
        let second = acc.report().unwrap();
        assert_eq!(first, second);
        assert_eq!(acc.len(), 3);
    }

    #[test]
    fn test_zero_baseline_speedup() {
        let acc = accumulate(&[0, 0], &[0, 0]);
        assert_eq!(acc.report().unwrap().speedup, 0.0);
    }
}
