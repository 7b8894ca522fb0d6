//! # Utility Functions and Helper Module
//!
//! Small helpers shared across the benchmark: timestamps and run
//! identifiers, human-readable formatting, summary statistics, parameter
//! validation and console table formatting.

use anyhow::Result;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Generate a unique identifier for a benchmark run
///
/// Stamped into the output files so raw data and summaries from the same
/// sweep can be matched up later.
pub fn generate_run_id() -> String {
    Uuid::new_v4().to_string()
}

/// Get current timestamp as microseconds since Unix epoch
///
/// If the system time is before the Unix epoch, returns 0 rather than
/// panicking.
pub fn current_timestamp_us() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64
}

/// Format a duration in a human-readable way
///
/// ```rust
/// # use dfs_bench::utils::format_duration;
/// # use std::time::Duration;
/// assert_eq!(format_duration(Duration::from_micros(2500)), "2.50ms");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ns = duration.as_nanos();

    if total_ns < 1_000 {
        format!("{}ns", total_ns)
    } else if total_ns < 1_000_000 {
        format!("{:.2}μs", total_ns as f64 / 1_000.0)
    } else if total_ns < 1_000_000_000 {
        format!("{:.2}ms", total_ns as f64 / 1_000_000.0)
    } else if total_ns < 60_000_000_000 {
        format!("{:.2}s", total_ns as f64 / 1_000_000_000.0)
    } else {
        let seconds = duration.as_secs();
        let minutes = seconds / 60;
        let remaining_seconds = seconds % 60;

        if minutes < 60 {
            format!("{}m {}s", minutes, remaining_seconds)
        } else {
            let hours = minutes / 60;
            let remaining_minutes = minutes % 60;
            format!("{}h {}m {}s", hours, remaining_minutes, remaining_seconds)
        }
    }
}

/// Calculate basic statistics for a set of values
///
/// Returns `(mean, min, max, std_dev)` using the sample standard deviation
/// (n - 1), which is what repeated-trial summaries report. A single value
/// has a standard deviation of 0. Empty input yields all zeros.
///
/// ```rust
/// # use dfs_bench::utils::calculate_stats;
/// let (mean, min, max, _std_dev) = calculate_stats(&[1.0, 2.0, 3.0]);
/// assert_eq!((mean, min, max), (2.0, 1.0, 3.0));
/// ```
pub fn calculate_stats(values: &[f64]) -> (f64, f64, f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0, 0.0, 0.0);
    }

    let sum: f64 = values.iter().sum();
    let count = values.len() as f64;
    let mean = sum / count;

    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    let std_dev = if values.len() > 1 {
        let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (count - 1.0);
        variance.sqrt()
    } else {
        0.0
    };

    (mean, min, max, std_dev)
}

/// Validate concurrency level
///
/// ## Parameters
/// - `concurrency`: number of workers per phase
///
/// ## Returns
/// - `Ok(())`: between 1 and 1024 inclusive
/// - `Err`: zero, or above the ceiling
///
/// Every worker holds a child process open while its call is in flight, so
/// the ceiling keeps a typo from forking thousands of clients.
pub fn validate_concurrency(concurrency: usize) -> Result<()> {
    if concurrency == 0 {
        anyhow::bail!("Concurrency cannot be zero");
    }
    if concurrency > 1024 {
        anyhow::bail!("Concurrency {} is too high (maximum 1024)", concurrency);
    }
    Ok(())
}

/// Validate a phase duration
pub fn validate_duration(duration: Duration) -> Result<()> {
    if duration.is_zero() {
        anyhow::bail!("Duration cannot be zero");
    }
    Ok(())
}

/// Number of logical CPU cores available to this process
pub fn get_cpu_cores() -> usize {
    num_cpus::get()
}

/// Format a table row, padding each column to its width
pub fn format_table_row(columns: &[&str], widths: &[usize]) -> String {
    let mut row = String::from("|");
    for (i, column) in columns.iter().enumerate() {
        let width = widths.get(i).copied().unwrap_or(10);
        row.push_str(&format!(" {:width$} |", column, width = width));
    }
    row
}

pub fn format_table_separator(widths: &[usize]) -> String {
    let mut line = String::from("+");
    for &width in widths {
        line.push_str(&"-".repeat(width + 2));
        line.push('+');
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_nanos(500)), "500ns");
        assert_eq!(format_duration(Duration::from_nanos(1500)), "1.50μs");
        assert_eq!(format_duration(Duration::from_micros(1500)), "1.50ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }

    #[test]
    fn test_calculate_stats() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let (mean, min, max, std_dev) = calculate_stats(&values);

        assert_eq!(mean, 5.0);
        assert_eq!(min, 2.0);
        assert_eq!(max, 9.0);
        assert!((std_dev - 2.138089935299395).abs() < 1e-9);
    }

    #[test]
    fn test_calculate_stats_degenerate() {
        assert_eq!(calculate_stats(&[]), (0.0, 0.0, 0.0, 0.0));
        assert_eq!(calculate_stats(&[3.5]), (3.5, 3.5, 3.5, 0.0));
    }

    #[test]
    fn test_validate_concurrency() {
        assert!(validate_concurrency(1).is_ok());
        assert!(validate_concurrency(16).is_ok());
        assert!(validate_concurrency(0).is_err());
        assert!(validate_concurrency(1025).is_err());
    }

    #[test]
    fn test_validate_duration() {
        assert!(validate_duration(Duration::from_millis(1)).is_ok());
        assert!(validate_duration(Duration::ZERO).is_err());
    }

    #[test]
    fn test_timestamps_advance() {
        let first = current_timestamp_us();
        std::thread::sleep(Duration::from_millis(2));
        assert!(current_timestamp_us() > first);
    }

    #[test]
    fn test_run_ids_are_unique() {
        assert_ne!(generate_run_id(), generate_run_id());
    }

    #[test]
    fn test_table_formatting() {
        let widths = [5, 3];
        assert_eq!(format_table_separator(&widths), "+-------+-----+");
        assert_eq!(format_table_row(&["ab", "c"], &widths), "| ab    | c   |");
    }
}
