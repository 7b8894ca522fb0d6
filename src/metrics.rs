//! # Phase Aggregation
//!
//! Reduces the raw `OperationResult`s of one phase into a `PhaseResult`:
//!
//! - **Throughput**: attempted operations times payload size over the phase
//!   duration, in MB/s. Failed attempts count, so this is offered load.
//! - **Mean latency**: over every attempt, failed or not, in milliseconds
//! - **Success rate**: successful over attempted, in `[0, 1]`
//! - **Percentiles**: p50/p95/p99 from an HDR histogram in microseconds
//!
//! An empty phase is not an error; it aggregates to all zeros.

use crate::executor::OperationResult;
use anyhow::Result;
use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::warn;

/// Operation measured by a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Read,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Create => write!(f, "create"),
            OperationKind::Read => write!(f, "read"),
        }
    }
}

/// Percentile value pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileValue {
    pub percentile: f64,
    pub value_ms: f64,
}

/// Phase-level statistics derived from one phase's raw results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseResult {
    pub operation: OperationKind,
    /// Offered load: every attempted operation counts toward data volume
    pub throughput_mbps: f64,
    /// Mean over failed and successful attempts alike
    pub latency_ms: f64,
    pub success_rate: f64,
    pub total_operations: usize,
    pub successful_operations: usize,
    pub latency_percentiles: Vec<PercentileValue>,
}

impl PhaseResult {
    /// Zero-valued result for a phase that completed no operations
    pub fn empty(operation: OperationKind) -> Self {
        Self {
            operation,
            throughput_mbps: 0.0,
            latency_ms: 0.0,
            success_rate: 0.0,
            total_operations: 0,
            successful_operations: 0,
            latency_percentiles: Vec::new(),
        }
    }

    /// Reduce a phase's results. Order of `results` does not matter.
    ///
    /// ## Parameters
    /// - `operation`: which phase the results came from
    /// - `results`: every attempt made by every worker of the phase
    /// - `file_size_mb`: payload size credited to each attempt
    /// - `phase_duration`: the configured phase length, used as the
    ///   throughput denominator
    ///
    /// ## Returns
    ///
    /// The zero-valued result when `results` is empty. A zero
    /// `phase_duration` yields zero throughput rather than dividing by zero.
    pub fn from_results(
        operation: OperationKind,
        results: &[OperationResult],
        file_size_mb: u64,
        phase_duration: Duration,
    ) -> Self {
        let total_operations = results.len();
        if total_operations == 0 {
            return Self::empty(operation);
        }

        let successful_operations = results.iter().filter(|r| r.success).count();
        let success_rate = successful_operations as f64 / total_operations as f64;

        let total_latency_ms: f64 = results
            .iter()
            .map(|r| r.latency.as_secs_f64() * 1000.0)
            .sum();
        let latency_ms = total_latency_ms / total_operations as f64;

        let duration_secs = phase_duration.as_secs_f64();
        let throughput_mbps = if duration_secs > 0.0 {
            (total_operations as f64 * file_size_mb as f64) / duration_secs
        } else {
            0.0
        };

        let latency_percentiles = match LatencyCollector::from_results(results) {
            Ok(collector) => collector.percentiles(&crate::defaults::PERCENTILES),
            Err(e) => {
                warn!(
                    "Latency percentiles unavailable for {} phase: {}",
                    operation, e
                );
                Vec::new()
            }
        };

        Self {
            operation,
            throughput_mbps,
            latency_ms,
            success_rate,
            total_operations,
            successful_operations,
            latency_percentiles,
        }
    }

    /// Reduce using the payload size and duration of `config`
    pub fn aggregate(
        operation: OperationKind,
        results: &[OperationResult],
        config: &crate::benchmark::TestConfig,
    ) -> Self {
        Self::from_results(operation, results, config.file_size_mb, config.duration)
    }

    pub fn failed_operations(&self) -> usize {
        self.total_operations - self.successful_operations
    }
}

impl fmt::Display for PhaseResult {
    /// The block layout report parsers key on: a `CREATE Operations:` or
    /// `READ Operations:` header followed by `Label: value unit` lines.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} Operations:",
            self.operation.to_string().to_uppercase()
        )?;
        writeln!(f, "Throughput: {:.2} MB/s", self.throughput_mbps)?;
        writeln!(f, "Average Latency: {:.2} ms", self.latency_ms)?;
        writeln!(f, "Success Rate: {:.2}%", self.success_rate * 100.0)?;
        write!(f, "Total Operations: {}", self.total_operations)
    }
}

/// Latency distribution in microseconds, backed by an HDR histogram
pub struct LatencyCollector {
    histogram: Histogram<u64>,
}

impl LatencyCollector {
    pub fn new() -> Result<Self> {
        // 3 significant figures, auto-resizing
        let histogram = Histogram::<u64>::new(3)?;
        Ok(Self { histogram })
    }

    pub fn from_results(results: &[OperationResult]) -> Result<Self> {
        let mut collector = Self::new()?;
        for result in results {
            collector.record(result.latency)?;
        }
        Ok(collector)
    }

    /// Record one latency in microseconds.
    ///
    /// The histogram resizes to fit the value, so a slow call widens the
    /// tracked range instead of being clamped into it.
    pub fn record(&mut self, latency: Duration) -> Result<()> {
        let latency_us = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.histogram.record(latency_us)?;
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.is_empty()
    }

    pub fn percentiles(&self, percentiles: &[f64]) -> Vec<PercentileValue> {
        percentiles
            .iter()
            .map(|&p| PercentileValue {
                percentile: p,
                value_ms: self.histogram.value_at_percentile(p) as f64 / 1000.0,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(ms: u64) -> OperationResult {
        OperationResult::succeeded(Duration::from_millis(ms))
    }

    fn failed(ms: u64) -> OperationResult {
        OperationResult::failed(Duration::from_millis(ms))
    }

    #[test]
    fn test_empty_phase_is_zero_valued() {
        let result =
            PhaseResult::from_results(OperationKind::Read, &[], 1, Duration::from_secs(5));

        assert_eq!(result, PhaseResult::empty(OperationKind::Read));
        assert_eq!(result.throughput_mbps, 0.0);
        assert_eq!(result.latency_ms, 0.0);
        assert_eq!(result.success_rate, 0.0);
        assert_eq!(result.total_operations, 0);
    }

    #[test]
    fn test_success_rate_counts_failures_in_denominator() {
        let results = vec![ok(10), failed(20), ok(30), failed(40)];
        let result =
            PhaseResult::from_results(OperationKind::Create, &results, 1, Duration::from_secs(1));

        assert_eq!(result.total_operations, 4);
        assert_eq!(result.successful_operations, 2);
        assert_eq!(result.failed_operations(), 2);
        assert!((result.success_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_mean_latency_includes_failed_attempts() {
        let results = vec![ok(10), failed(30)];
        let result =
            PhaseResult::from_results(OperationKind::Create, &results, 1, Duration::from_secs(1));

        assert!((result.latency_ms - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_throughput_is_offered_load() {
        // 6 attempts of 2MB over 4s, only one succeeded
        let results = vec![ok(1), failed(1), failed(1), failed(1), failed(1), failed(1)];
        let result =
            PhaseResult::from_results(OperationKind::Create, &results, 2, Duration::from_secs(4));

        assert!((result.throughput_mbps - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_throughput_scales_linearly_with_operation_count() {
        let duration = Duration::from_secs(10);
        let one = PhaseResult::from_results(OperationKind::Read, &vec![ok(5); 7], 3, duration);
        let three = PhaseResult::from_results(OperationKind::Read, &vec![ok(5); 21], 3, duration);

        let expected = 3.0 * one.throughput_mbps;
        assert!((three.throughput_mbps - expected).abs() < 1e-9);
        assert!(one.throughput_mbps >= 0.0);
    }

    #[test]
    fn test_success_rate_stays_in_unit_interval() {
        for successes in 0..=5 {
            let mut results = vec![ok(1); successes];
            results.extend(vec![failed(1); 5 - successes]);
            let result = PhaseResult::from_results(
                OperationKind::Create,
                &results,
                1,
                Duration::from_secs(1),
            );
            assert!((0.0..=1.0).contains(&result.success_rate));
            assert!((result.success_rate - successes as f64 / 5.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_duration_does_not_divide_by_zero() {
        let result =
            PhaseResult::from_results(OperationKind::Create, &[ok(1)], 1, Duration::ZERO);
        assert_eq!(result.throughput_mbps, 0.0);
    }

    #[test]
    fn test_latency_percentiles() {
        let results: Vec<_> = (1..=100).map(ok).collect();
        let result =
            PhaseResult::from_results(OperationKind::Read, &results, 1, Duration::from_secs(1));

        assert_eq!(result.latency_percentiles.len(), 3);
        let p50 = &result.latency_percentiles[0];
        assert_eq!(p50.percentile, 50.0);
        assert!((p50.value_ms - 50.0).abs() < 0.5);
        let p99 = &result.latency_percentiles[2];
        assert!((p99.value_ms - 99.0).abs() < 0.5);
    }

    #[test]
    fn test_display_matches_report_block() {
        let results = vec![ok(10), failed(30)];
        let result =
            PhaseResult::from_results(OperationKind::Create, &results, 1, Duration::from_secs(4));

        assert_eq!(
            result.to_string(),
            "CREATE Operations:\n\
             Throughput: 0.50 MB/s\n\
             Average Latency: 20.00 ms\n\
             Success Rate: 50.00%\n\
             Total Operations: 2"
        );
    }

    #[test]
    fn test_latency_collector() {
        let mut collector = LatencyCollector::new().unwrap();
        assert!(collector.is_empty());

        collector.record(Duration::from_millis(1)).unwrap();
        collector.record(Duration::from_millis(2)).unwrap();
        collector.record(Duration::from_millis(3)).unwrap();

        assert_eq!(collector.len(), 3);
        let percentiles = collector.percentiles(&[50.0]);
        assert!((percentiles[0].value_ms - 2.0).abs() < 0.01);
    }

    #[test]
    fn test_collector_tracks_slow_calls_unclamped() {
        let mut collector = LatencyCollector::new().unwrap();
        collector.record(Duration::from_micros(1)).unwrap();
        collector.record(Duration::from_secs(90)).unwrap();

        let percentiles = collector.percentiles(&[100.0]);
        assert!((percentiles[0].value_ms - 90_000.0).abs() < 90.0);
    }
}
