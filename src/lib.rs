//! # DFS Benchmark Suite Library
//!
//! Measures throughput, latency and reliability of a remote file-storage
//! service by driving its command-line client through repeated create and
//! read operations under varying concurrency.
//!
//! ## Architecture Overview
//!
//! Data flows in one direction through the crate:
//!
//! - `workload`: generates the local payload files uploaded by the write phase
//! - `executor`: invokes the external client once and times the call
//! - `worker`: deadline-bounded write and read loops
//! - `registry`: the append-only set of remote paths confirmed written
//! - `pool`: spawns N workers per phase and merges their results
//! - `metrics`: reduces a phase's raw results into a `PhaseResult`
//! - `benchmark`: one write phase followed by one dependent read phase
//! - `sweep`: repeats the benchmark across concurrency levels
//! - `results`: experiment records, summaries and JSON output
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use dfs_bench::{BenchmarkRunner, ClientExecutor, Credentials, TestConfig};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = TestConfig {
//!         credentials: Credentials::new("alice", "secret"),
//!         concurrency: 4,
//!         file_size_mb: 1,
//!         num_files: 10,
//!         duration: Duration::from_secs(60),
//!         client_path: "./dfs-client".into(),
//!         staging_dir: "./test_files".into(),
//!     };
//!
//!     let executor = Arc::new(ClientExecutor::from_config(&config));
//!     let runner = BenchmarkRunner::new(config, executor);
//!     let results = runner.run().await?;
//!
//!     println!("{}", results.write);
//!     println!("{}", results.read);
//!     Ok(())
//! }
//! ```

/// Throughput test orchestration
///
/// Owns the `TestConfig` and the `BenchmarkRunner` that executes one write
/// phase followed by the read phase that depends on it.
pub mod benchmark;

/// Command-line interface and configuration
pub mod cli;

/// Library error types
pub mod error;

/// External client invocation behind the `CommandExecutor` trait
pub mod executor;

/// Console and file logging setup
pub mod logging;

/// Phase aggregation: throughput, latency, success rate
pub mod metrics;

/// Worker pool coordination
pub mod pool;

/// Shared registry of successfully written remote paths
pub mod registry;

/// Experiment records, summaries and output files
pub mod results;

/// Concurrency sweep driver
pub mod sweep;

pub mod utils;

/// Deadline-bounded write and read workers
pub mod worker;

/// Local payload generation
pub mod workload;

pub use benchmark::{BenchmarkRunner, RunResults, TestConfig};
pub use cli::{Args, Command, SweepArgs, ThroughputArgs};
pub use error::BenchError;
pub use executor::{
    Action, ClientExecutor, ClientRequest, CommandExecutor, Credentials, OperationResult, Target,
};
pub use metrics::{OperationKind, PhaseResult};
pub use registry::{PublishedPaths, WrittenPathRegistry};
pub use results::{ExperimentRecord, ResultsManager};
pub use sweep::{thread_counts, ExperimentSweep};

/// The current version of the DFS benchmark suite
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    /// Default number of concurrent workers for a single throughput test
    pub const CONCURRENCY: usize = 4;

    /// Default payload size in megabytes
    pub const FILE_SIZE_MB: u64 = 1;

    /// Default number of generated payload files
    pub const NUM_FILES: usize = 10;

    /// Default phase duration for a single throughput test
    pub const DURATION: Duration = Duration::from_secs(60);

    /// Default phase duration for each sweep point
    ///
    /// Shorter than the single-test default because a sweep multiplies it by
    /// every concurrency level and repeat.
    pub const SWEEP_DURATION: Duration = Duration::from_secs(30);

    /// Default local staging directory
    pub const STAGING_DIR: &str = "./test_files";

    /// Largest concurrency level visited by a sweep
    pub const MAX_THREADS: usize = 16;

    /// Trials per concurrency level
    pub const REPEATS: usize = 3;

    /// Prefix for sweep output files
    pub const OUTPUT_PREFIX: &str = "dfs_benchmark";

    /// Remote directory that holds every per-worker directory
    pub const REMOTE_BASE_DIR: &str = "/test";

    /// Latency percentiles reported for each phase
    pub const PERCENTILES: [f64; 3] = [50.0, 95.0, 99.0];
}
