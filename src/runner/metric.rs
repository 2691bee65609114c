//! Throughput metric extraction from child output
//!
//! The only contract with a benchmarked executable is a single line of the
//! form `Nodes/second : <integer>`. Anything else is an error: substituting a
//! default would silently corrupt the estimate.

use regex::Regex;
use thiserror::Error;

const METRIC_PATTERN: &str = r"Nodes/second\s*:\s*(\d+)";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricError {
    #[error("no 'Nodes/second : <integer>' line in output")]
    Missing,

    #[error("metric value '{0}' is not a valid integer")]
    Malformed(String),

    #[error("expected one metric line, found {0}")]
    Ambiguous(usize),
}

/// Compiled metric pattern
#[derive(Debug, Clone)]
pub struct MetricExtractor {
    pattern: Regex,
}

impl MetricExtractor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(METRIC_PATTERN)?,
        })
    }

    /// Extract the metric from raw output bytes (lossy UTF-8)
    pub fn extract(&self, output: &[u8]) -> Result<u64, MetricError> {
        let text = String::from_utf8_lossy(output);
        let captures: Vec<_> = self.pattern.captures_iter(&text).collect();

        match captures.as_slice() {
            [] => Err(MetricError::Missing),
            [single] => {
                // Bounded by i64 so paired differences cannot overflow
                let value = &single[1];
                value
                    .parse::<i64>()
                    .map(|v| v as u64)
                    .map_err(|_| MetricError::Malformed(value.to_string()))
            }
            many => Err(MetricError::Ambiguous(many.len())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BENCH_TAIL: &str = "===========================\n\
        Total time (ms) : 4213\n\
        Nodes searched  : 8264134\n\
        Nodes/second    : 1961579\n";

    #[test]
    fn test_extract_bench_output() {
        let extractor = MetricExtractor::new().unwrap();
        assert_eq!(extractor.extract(BENCH_TAIL.as_bytes()), Ok(1_961_579));
    }

    #[test]
    fn test_extract_without_padding() {
        let extractor = MetricExtractor::new().unwrap();
        assert_eq!(extractor.extract(b"Nodes/second:42"), Ok(42));
    }

    #[test]
    fn test_extract_missing() {
        let extractor = MetricExtractor::new().unwrap();
        assert_eq!(
            extractor.extract(b"Total time (ms) : 10\n"),
            Err(MetricError::Missing)
        );
        assert_eq!(extractor.extract(b""), Err(MetricError::Missing));
    }

    #[test]
    fn test_extract_non_numeric_is_missing() {
        let extractor = MetricExtractor::new().unwrap();
        assert_eq!(
            extractor.extract(b"Nodes/second : fast\n"),
            Err(MetricError::Missing)
        );
    }

    #[test]
    fn test_extract_overflow_is_malformed() {
        let extractor = MetricExtractor::new().unwrap();
        assert!(matches!(
            extractor.extract(b"Nodes/second : 99999999999999999999999\n"),
            Err(MetricError::Malformed(_))
        ));
    }

    #[test]
    fn test_extract_rejects_values_beyond_i64() {
        let extractor = MetricExtractor::new().unwrap();
        assert_eq!(
            extractor.extract(b"Nodes/second : 9223372036854775807\n"),
            Ok(i64::MAX as u64)
        );
        assert_eq!(
            extractor.extract(b"Nodes/second : 9223372036854775808\n"),
            Err(MetricError::Malformed("9223372036854775808".to_string()))
        );
    }

    #[test]
    fn test_extract_duplicate_lines() {
        let extractor = MetricExtractor::new().unwrap();
        assert_eq!(
            extractor.extract(b"Nodes/second : 1\nNodes/second : 2\n"),
            Err(MetricError::Ambiguous(2))
        );
    }

    #[test]
    fn test_extract_invalid_utf8_around_metric() {
        let extractor = MetricExtractor::new().unwrap();
        let mut output = vec![0xff, 0xfe, b'\n'];
        output.extend_from_slice(b"Nodes/second : 77\n");
        assert_eq!(extractor.extract(&output), Ok(77));
    }
}
