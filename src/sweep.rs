//! # Experiment Sweep Driver
//!
//! Repeats the throughput test across concurrency levels. For every level
//! and every repeat it runs a write phase and the read phase that depends
//! on it, and appends one `ExperimentRecord` per phase.
//!
//! Remote directories for the largest level are created once, up front. If
//! that fails the sweep aborts before any phase runs and produces no
//! records. A repeat whose write phase publishes nothing still runs its read
//! phase, which degenerates to a zero-valued record.

use crate::{
    benchmark::{BenchmarkRunner, TestConfig},
    error::BenchError,
    executor::CommandExecutor,
    results::ExperimentRecord,
};
use std::sync::Arc;
use tracing::info;

/// Concurrency levels for a sweep up to `max_threads`: every power of two
/// not above it, plus `max_threads` itself when it is not a power of two.
///
/// ```rust
/// # use dfs_bench::thread_counts;
/// assert_eq!(thread_counts(16), vec![1, 2, 4, 8, 16]);
/// assert_eq!(thread_counts(10), vec![1, 2, 4, 8, 10]);
/// ```
pub fn thread_counts(max_threads: usize) -> Vec<usize> {
    let mut counts: Vec<usize> = (0..usize::BITS - max_threads.leading_zeros())
        .map(|i| 1usize << i)
        .collect();
    if counts.last().map_or(false, |&last| last < max_threads) {
        counts.push(max_threads);
    }
    counts
}

/// Runs the throughput test for every concurrency level and repeat.
///
/// ```rust,no_run
/// # use dfs_bench::{thread_counts, ClientExecutor, ExperimentSweep, TestConfig};
/// # use std::sync::Arc;
/// # async fn sweep(template: TestConfig) -> anyhow::Result<()> {
/// let executor = Arc::new(ClientExecutor::from_config(&template));
/// let sweep = ExperimentSweep::new(template, thread_counts(8), 3, executor);
/// let records = sweep.run().await?;
/// assert_eq!(records.len(), 4 * 3 * 2);
/// # Ok(())
/// # }
/// ```
pub struct ExperimentSweep {
    template: TestConfig,
    levels: Vec<usize>,
    repeats: usize,
    executor: Arc<dyn CommandExecutor>,
}

impl ExperimentSweep {
    pub fn new(
        template: TestConfig,
        levels: Vec<usize>,
        repeats: usize,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        Self {
            template,
            levels,
            repeats,
            executor,
        }
    }

    /// Run every level and repeat in order.
    ///
    /// Records come back ordered by level, then repeat, then create before
    /// read. Setup failures abort the whole sweep.
    pub async fn run(&self) -> Result<Vec<ExperimentRecord>, BenchError> {
        let max_level = self.levels.iter().copied().max().unwrap_or(0);
        if max_level == 0 {
            return Err(BenchError::InvalidConfig(
                "a sweep needs at least one non-zero concurrency level".to_string(),
            ));
        }

        info!("Will test with {:?} concurrent workers", self.levels);
        info!("Each test will run for {:?}", self.template.duration);
        info!("Each configuration will be repeated {} times", self.repeats);

        let setup = BenchmarkRunner::new(
            self.template.for_run(max_level, self.template.staging_dir.clone()),
            Arc::clone(&self.executor),
        );
        setup.create_remote_directories(max_level).await?;

        let mut records = Vec::with_capacity(self.levels.len() * self.repeats * 2);
        for &level in &self.levels {
            info!("Testing with {} concurrent workers", level);

            for repeat in 0..self.repeats {
                info!("  Repeat {}/{}", repeat + 1, self.repeats);

                let staging_dir = self
                    .template
                    .staging_dir
                    .join(format!("run_{}_{}", level, repeat));
                let runner = BenchmarkRunner::new(
                    self.template.for_run(level, staging_dir),
                    Arc::clone(&self.executor),
                );

                let results = runner.run_phases().await?;
                records.push(ExperimentRecord::new(level, repeat, results.write));
                records.push(ExperimentRecord::new(level, repeat, results.read));
            }
        }

        // The per-run directories are gone; drop their parent if now empty.
        let _ = std::fs::remove_dir(&self.template.staging_dir);

        Ok(records)
    }
}
