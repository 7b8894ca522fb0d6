//! # Benchmark Engine Module
//!
//! Runs one throughput test: a write phase that uploads generated payloads
//! from N concurrent workers, followed by a read phase in which N workers
//! download what the write phase confirmed.
//!
//! ## Test Execution Lifecycle
//!
//! 1. **Remote setup**: create `/test` and one `/test/worker_{i}` per worker
//! 2. **Workload**: generate the local payload files
//! 3. **Write phase**: N write workers until the deadline, then join
//! 4. **Read phase**: N read workers over the frozen registry, then join
//! 5. **Cleanup**: remove payloads and the staging directory, always
//!
//! Steps 1 and 2 are setup: if either fails the run aborts before any
//! worker starts. Nothing after that point can abort the run because of a
//! failed client call; those only lower the success rate.
//!
//! The read phase never overlaps the write phase. It starts after every
//! write worker has joined, so it sees a registry nobody is still writing.

use crate::{
    cli::{ClientArgs, SweepArgs, ThroughputArgs},
    error::BenchError,
    executor::{ClientRequest, CommandExecutor, Credentials},
    metrics::{OperationKind, PhaseResult},
    pool::{run_read_pool, run_write_pool},
    registry::PublishedPaths,
    utils::{format_duration, validate_concurrency, validate_duration},
    worker::worker_directory,
    workload::{cleanup_payloads, generate_payloads},
};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Display helper for the per-run configuration banner
struct TestConfigDisplay<'a> {
    config: &'a TestConfig,
}

impl<'a> std::fmt::Display for TestConfigDisplay<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "-----------------------------------------------------------------"
        )?;
        writeln!(
            f,
            "Starting throughput test with {} concurrent workers",
            self.config.concurrency
        )?;
        writeln!(f, "  Client:             {:?}", self.config.client_path)?;
        writeln!(f, "  User:               {}", self.config.credentials.username)?;
        writeln!(f, "  File Size:          {} MB", self.config.file_size_mb)?;
        writeln!(f, "  Test Files:         {}", self.config.num_files)?;
        writeln!(
            f,
            "  Phase Duration:     {}",
            format_duration(self.config.duration)
        )?;
        writeln!(f, "  Staging Directory:  {:?}", self.config.staging_dir)?;
        write!(
            f,
            "-----------------------------------------------------------------"
        )
    }
}

/// Parameters of one throughput test. Immutable while a phase runs.
#[derive(Clone, Debug)]
pub struct TestConfig {
    pub credentials: Credentials,

    /// Number of workers per phase
    pub concurrency: usize,

    /// Size of every generated payload, in megabytes
    pub file_size_mb: u64,

    /// Number of payload files to generate
    pub num_files: usize,

    /// How long each phase keeps starting new operations
    pub duration: Duration,

    /// The storage client executable
    pub client_path: PathBuf,

    /// Where payloads are generated and downloads are staged
    pub staging_dir: PathBuf,
}

impl TestConfig {
    /// Build and validate a configuration from the `throughput` subcommand
    pub fn from_args(args: &ThroughputArgs) -> Result<Self> {
        let config = Self::from_parts(
            &args.client,
            args.concurrency,
            args.file_size,
            args.num_files,
            args.duration,
            args.test_files_dir.clone(),
        );
        config.validate()?;
        Ok(config)
    }

    /// Template for a sweep; the sweep overrides concurrency and staging
    /// directory per run.
    pub fn from_sweep_args(args: &SweepArgs) -> Result<Self> {
        let config = Self::from_parts(
            &args.client,
            args.max_threads,
            args.file_size,
            args.num_files,
            args.duration,
            args.test_files_dir.clone(),
        );
        config.validate()?;
        Ok(config)
    }

    fn from_parts(
        client: &ClientArgs,
        concurrency: usize,
        file_size_mb: u64,
        num_files: usize,
        duration: Duration,
        staging_dir: PathBuf,
    ) -> Self {
        Self {
            credentials: Credentials::new(client.username.clone(), client.password.clone()),
            concurrency,
            file_size_mb,
            num_files,
            duration,
            client_path: client.client_path.clone(),
            staging_dir,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_concurrency(self.concurrency)?;
        validate_duration(self.duration)?;
        if self.num_files == 0 {
            return Err(BenchError::InvalidConfig(
                "at least one test file is required".to_string(),
            )
            .into());
        }
        Ok(())
    }

    /// Copy of this configuration for one sweep point
    pub fn for_run(&self, concurrency: usize, staging_dir: PathBuf) -> Self {
        Self {
            concurrency,
            staging_dir,
            ..self.clone()
        }
    }
}

/// Write and read phase results of one throughput test
#[derive(Debug, Clone)]
pub struct RunResults {
    pub write: PhaseResult,
    pub read: PhaseResult,
    /// Size of the registry handed to the read phase
    pub written_files: usize,
}

/// Runs throughput tests against one executor
pub struct BenchmarkRunner {
    config: Arc<TestConfig>,
    executor: Arc<dyn CommandExecutor>,
}

impl BenchmarkRunner {
    pub fn new(config: TestConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            config: Arc::new(config),
            executor,
        }
    }

    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    /// Full throughput test: remote setup, both phases, cleanup.
    pub async fn run(&self) -> Result<RunResults, BenchError> {
        info!("{}", TestConfigDisplay { config: &self.config });
        let concurrency = self.config.concurrency;
        self.create_remote_directories(concurrency).await?;
        self.run_phases().await
    }

    /// Create `/test` and a directory for each of `workers` write workers.
    ///
    /// Each directory gets a single attempt; the first failure aborts.
    pub async fn create_remote_directories(&self, workers: usize) -> Result<(), BenchError> {
        info!("Creating remote directories");

        let mut directories = vec![crate::defaults::REMOTE_BASE_DIR.to_string()];
        directories.extend((0..workers).map(worker_directory));

        for directory in directories {
            let result = self
                .executor
                .execute(&ClientRequest::create_directory(directory.clone()))
                .await;
            if !result.success {
                error!("Failed to create remote directory: {}", directory);
                return Err(BenchError::RemoteDirectory { path: directory });
            }
            debug!("Created remote directory {}", directory);
        }

        info!("Successfully created all remote directories");
        Ok(())
    }

    /// Generate payloads, run the write phase then the read phase, and
    /// clean up the staging directory whatever the outcome.
    ///
    /// Remote directories must already exist.
    pub async fn run_phases(&self) -> Result<RunResults, BenchError> {
        let staging_dir = self.config.staging_dir.clone();
        let payloads = match generate_payloads(
            &staging_dir,
            self.config.num_files,
            self.config.file_size_mb,
        ) {
            Ok(payloads) => payloads,
            Err(e) => {
                // Generation already removed its own files; drop the
                // directory too if that left it empty.
                cleanup_payloads(&staging_dir, &[]);
                return Err(e);
            }
        };
        info!(
            "Generated {} test files in {:?}",
            payloads.len(),
            staging_dir
        );

        let outcome = self.run_write_then_read(payloads.clone().into()).await;
        cleanup_payloads(&staging_dir, &payloads);
        outcome
    }

    async fn run_write_then_read(
        &self,
        payloads: Arc<[PathBuf]>,
    ) -> Result<RunResults, BenchError> {
        let (write, published) = self.run_write_phase(payloads).await?;
        let written_files = published.len();
        let read = self.run_read_phase(published).await?;

        Ok(RunResults {
            write,
            read,
            written_files,
        })
    }

    /// Write phase: returns its aggregate and the paths confirmed written
    pub async fn run_write_phase(
        &self,
        payloads: Arc<[PathBuf]>,
    ) -> Result<(PhaseResult, PublishedPaths), BenchError> {
        let (outcome, published) = run_write_pool(
            Arc::clone(&self.config),
            Arc::clone(&self.executor),
            payloads,
        )
        .await?;

        let result = PhaseResult::aggregate(OperationKind::Create, &outcome.results, &self.config);
        debug!(
            "Write phase: {} operations from {} workers, {} published",
            result.total_operations,
            outcome.workers_joined,
            published.len()
        );
        Ok((result, published))
    }

    /// Read phase over the write phase's published paths.
    ///
    /// With nothing published every worker stops immediately and the
    /// result is the zero-valued `PhaseResult`.
    pub async fn run_read_phase(
        &self,
        published: PublishedPaths,
    ) -> Result<PhaseResult, BenchError> {
        if published.is_empty() {
            info!("No files available for read test");
        }

        let outcome = run_read_pool(
            Arc::clone(&self.config),
            Arc::clone(&self.executor),
            published,
        )
        .await?;

        Ok(PhaseResult::aggregate(OperationKind::Read, &outcome.results, &self.config))
    }
}
