//! # Sweep Results
//!
//! A sweep produces one `ExperimentRecord` per phase per repeat. The
//! `ResultsManager` groups them by concurrency level and operation, prints
//! a summary table, and writes two JSON files:
//!
//! - `{prefix}_raw_data.json`: every record plus system information
//! - `{prefix}_summary.json`: mean, standard deviation, min and max of each
//!   metric per group

use crate::{
    metrics::{OperationKind, PhaseResult},
    utils::{calculate_stats, format_table_row, format_table_separator},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One phase of one repeat at one concurrency level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRecord {
    pub concurrency: usize,
    pub repeat: usize,
    #[serde(flatten)]
    pub result: PhaseResult,
}

impl ExperimentRecord {
    pub fn new(concurrency: usize, repeat: usize, result: PhaseResult) -> Self {
        Self {
            concurrency,
            repeat,
            result,
        }
    }

    pub fn operation(&self) -> OperationKind {
        self.result.operation
    }
}

/// Mean, spread and range of one metric across repeats
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricSummary {
    /// Summary of one metric's values across repeats; all zeros when empty
    pub fn from_values(values: &[f64]) -> Self {
        let (mean, min, max, std_dev) = calculate_stats(values);
        Self {
            mean,
            std_dev,
            min,
            max,
        }
    }
}

/// Summary of every repeat for one (concurrency, operation) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub concurrency: usize,
    pub operation: OperationKind,
    pub repeats: usize,
    pub throughput_mbps: MetricSummary,
    pub latency_ms: MetricSummary,
    pub success_rate: MetricSummary,
    pub total_operations: MetricSummary,
}

/// System information for reproducibility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub architecture: String,
    pub cpu_cores: usize,
    pub benchmark_version: String,
}

impl Default for SystemInfo {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            architecture: std::env::consts::ARCH.to_string(),
            cpu_cores: crate::utils::get_cpu_cores(),
            benchmark_version: crate::VERSION.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct RawDataFile<'a> {
    run_id: &'a str,
    timestamp: chrono::DateTime<chrono::Utc>,
    system_info: SystemInfo,
    records: &'a [ExperimentRecord],
}

#[derive(Debug, Serialize)]
struct SummaryFile<'a> {
    run_id: &'a str,
    timestamp: chrono::DateTime<chrono::Utc>,
    summary: &'a [GroupSummary],
}

/// Group records by (concurrency, operation), ordered by concurrency with
/// create before read.
pub fn summarize(records: &[ExperimentRecord]) -> Vec<GroupSummary> {
    let mut groups: BTreeMap<(usize, OperationKind), Vec<&ExperimentRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry((record.concurrency, record.operation()))
            .or_default()
            .push(record);
    }

    groups
        .into_iter()
        .map(|((concurrency, operation), group)| {
            let metric = |f: fn(&PhaseResult) -> f64| {
                let values: Vec<f64> = group.iter().map(|r| f(&r.result)).collect();
                MetricSummary::from_values(&values)
            };
            GroupSummary {
                concurrency,
                operation,
                repeats: group.len(),
                throughput_mbps: metric(|r| r.throughput_mbps),
                latency_ms: metric(|r| r.latency_ms),
                success_rate: metric(|r| r.success_rate),
                total_operations: metric(|r| r.total_operations as f64),
            }
        })
        .collect()
}

/// Collects sweep records and writes them out
pub struct ResultsManager {
    output_prefix: String,
    run_id: String,
    records: Vec<ExperimentRecord>,
}

impl ResultsManager {
    /// Manager writing to files named after `output_prefix`, which may
    /// include a directory.
    pub fn new(output_prefix: impl Into<String>) -> Self {
        Self {
            output_prefix: output_prefix.into(),
            run_id: crate::utils::generate_run_id(),
            records: Vec::new(),
        }
    }

    pub fn add_records(&mut self, records: impl IntoIterator<Item = ExperimentRecord>) {
        self.records.extend(records);
    }

    pub fn records(&self) -> &[ExperimentRecord] {
        &self.records
    }

    /// `{prefix}_raw_data.json`
    pub fn raw_data_path(&self) -> PathBuf {
        PathBuf::from(format!("{}_raw_data.json", self.output_prefix))
    }

    /// `{prefix}_summary.json`
    pub fn summary_path(&self) -> PathBuf {
        PathBuf::from(format!("{}_summary.json", self.output_prefix))
    }

    /// Render the summary table printed at the end of a sweep
    pub fn summary_table(&self) -> String {
        let widths = [7, 9, 22, 22, 20, 16];
        let mut lines = vec![
            format_table_separator(&widths),
            format_table_row(
                &[
                    "Workers",
                    "Operation",
                    "Throughput (MB/s)",
                    "Latency (ms)",
                    "Success Rate (%)",
                    "Operations",
                ],
                &widths,
            ),
            format_table_separator(&widths),
        ];

        for group in summarize(&self.records) {
            let concurrency = group.concurrency.to_string();
            let operation = group.operation.to_string();
            let throughput = format!(
                "{:.2} ± {:.2}",
                group.throughput_mbps.mean, group.throughput_mbps.std_dev
            );
            let latency = format!(
                "{:.2} ± {:.2}",
                group.latency_ms.mean, group.latency_ms.std_dev
            );
            let success = format!("{:.2}", group.success_rate.mean * 100.0);
            let operations = format!("{:.1}", group.total_operations.mean);
            lines.push(format_table_row(
                &[
                    concurrency.as_str(),
                    operation.as_str(),
                    throughput.as_str(),
                    latency.as_str(),
                    success.as_str(),
                    operations.as_str(),
                ],
                &widths,
            ));
        }
        lines.push(format_table_separator(&widths));
        lines.join("\n")
    }

    /// Write raw records and the grouped summary as JSON
    pub fn finalize(&self) -> Result<()> {
        info!("Finalizing {} experiment records", self.records.len());
        let timestamp = chrono::Utc::now();

        let raw = RawDataFile {
            run_id: &self.run_id,
            timestamp,
            system_info: SystemInfo::default(),
            records: &self.records,
        };
        write_json(&self.raw_data_path(), &raw)?;

        let summary = summarize(&self.records);
        let summary_file = SummaryFile {
            run_id: &self.run_id,
            timestamp,
            summary: &summary,
        };
        write_json(&self.summary_path(), &summary_file)?;

        info!(
            "Results saved to {:?} and {:?}",
            self.raw_data_path(),
            self.summary_path()
        );
        Ok(())
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to serialize results to {:?}", path))?;
    writer.flush()?;
    debug!("Wrote {:?}", path);
    Ok(())
}
