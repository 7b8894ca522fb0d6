//! Worker pool coordination.
//!
//! A pool spawns exactly N workers of one kind as tokio tasks, waits for all
//! of them, and concatenates their private result lists. The order of the
//! merged list carries no meaning.

use crate::{
    benchmark::TestConfig,
    error::BenchError,
    executor::{CommandExecutor, OperationResult},
    metrics::OperationKind,
    registry::{PublishedPaths, WrittenPathRegistry},
    worker::{ReadWorker, WriteWorker},
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Merged output of one pool run
#[derive(Debug, Default)]
pub struct PoolOutcome {
    pub results: Vec<OperationResult>,
    /// Number of worker result lists merged into `results`
    pub workers_joined: usize,
}

/// Run `config.concurrency` write workers against `payloads`.
///
/// Returns the merged results together with the frozen registry of paths
/// whose upload succeeded. The registry is only frozen after every worker
/// has joined.
pub async fn run_write_pool(
    config: Arc<TestConfig>,
    executor: Arc<dyn CommandExecutor>,
    payloads: Arc<[PathBuf]>,
) -> Result<(PoolOutcome, PublishedPaths), BenchError> {
    info!(
        "Starting write test with {} concurrent workers",
        config.concurrency
    );

    let registry = Arc::new(WrittenPathRegistry::new());
    let handles: Vec<_> = (0..config.concurrency)
        .map(|worker_id| {
            let worker = WriteWorker::new(
                worker_id,
                Arc::clone(&config),
                Arc::clone(&executor),
                Arc::clone(&payloads),
                Arc::clone(&registry),
            );
            tokio::spawn(worker.run())
        })
        .collect();

    let outcome = join_workers(OperationKind::Create, handles).await?;

    // Every worker has joined, so this is the last reference.
    let published = match Arc::try_unwrap(registry) {
        Ok(registry) => registry.freeze(),
        Err(shared) => PublishedPaths::from(shared.snapshot()),
    };

    info!("Successfully wrote {} files", published.len());
    Ok((outcome, published))
}

/// Run `config.concurrency` read workers over `paths`.
pub async fn run_read_pool(
    config: Arc<TestConfig>,
    executor: Arc<dyn CommandExecutor>,
    paths: PublishedPaths,
) -> Result<PoolOutcome, BenchError> {
    info!(
        "Starting read test with {} concurrent workers over {} files",
        config.concurrency,
        paths.len()
    );

    let handles: Vec<_> = (0..config.concurrency)
        .map(|worker_id| {
            let worker = ReadWorker::new(
                worker_id,
                Arc::clone(&config),
                Arc::clone(&executor),
                paths.clone(),
            );
            tokio::spawn(worker.run())
        })
        .collect();

    join_workers(OperationKind::Read, handles).await
}

/// Await every handle before reporting a failure, so no worker is left
/// running detached after the phase has been given up.
async fn join_workers(
    kind: OperationKind,
    handles: Vec<JoinHandle<Vec<OperationResult>>>,
) -> Result<PoolOutcome, BenchError> {
    let mut outcome = PoolOutcome::default();
    let mut failure = None;

    for (worker_id, handle) in handles.into_iter().enumerate() {
        match handle.await {
            Ok(worker_results) => {
                debug!(
                    "Merged {} results from {} worker {}",
                    worker_results.len(),
                    kind,
                    worker_id
                );
                outcome.results.extend(worker_results);
                outcome.workers_joined += 1;
            }
            Err(e) => {
                error!("{} worker {} did not complete: {}", kind, worker_id, e);
                failure.get_or_insert(BenchError::WorkerPanicked {
                    kind,
                    worker_id,
                    reason: e.to_string(),
                });
            }
        }
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(outcome),
    }
}
