//! # Deadline-Bounded Workers
//!
//! A worker loops until its phase duration has elapsed, issuing one client
//! invocation per iteration and keeping its results privately. The deadline
//! is checked only at the top of the loop: an invocation already in flight
//! is allowed to finish, so a worker can overrun the deadline by at most one
//! client call.
//!
//! - `WriteWorker` uploads a randomly chosen payload to a fresh remote path
//!   and publishes the path to the shared registry when the upload succeeds.
//! - `ReadWorker` downloads a randomly chosen published path into a staging
//!   file of its own and deletes that file straight away.

use crate::{
    benchmark::TestConfig,
    executor::{ClientRequest, CommandExecutor, OperationResult},
    registry::{PublishedPaths, WrittenPathRegistry},
    utils::current_timestamp_us,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

/// Remote directory owned by one write worker
pub fn worker_directory(worker_id: usize) -> String {
    format!("{}/worker_{}", crate::defaults::REMOTE_BASE_DIR, worker_id)
}

/// Remote path for a worker's `operation`-th upload.
///
/// Worker id plus per-worker counter is already unique within a phase; the
/// timestamp keeps paths distinct across repeats that reuse worker ids.
pub fn remote_path_for(worker_id: usize, operation: u64, timestamp_us: u64) -> String {
    format!(
        "{}/file_{}_{}_{}.dat",
        worker_directory(worker_id),
        timestamp_us,
        worker_id,
        operation
    )
}

/// Staging file a read worker downloads `remote_path` into
pub fn staging_path_for(staging_dir: &Path, worker_id: usize, remote_path: &str) -> PathBuf {
    let file_name = remote_path.rsplit('/').next().unwrap_or(remote_path);
    staging_dir.join(format!("downloaded_{}_{}", worker_id, file_name))
}

/// Uploads payloads to fresh remote paths until the phase deadline.
///
/// Each worker writes only under its own `/test/worker_{id}` directory and
/// numbers its uploads, so no two workers can produce the same path.
pub struct WriteWorker {
    id: usize,
    config: Arc<TestConfig>,
    executor: Arc<dyn CommandExecutor>,
    payloads: Arc<[PathBuf]>,
    registry: Arc<WrittenPathRegistry>,
}

impl WriteWorker {
    pub fn new(
        id: usize,
        config: Arc<TestConfig>,
        executor: Arc<dyn CommandExecutor>,
        payloads: Arc<[PathBuf]>,
        registry: Arc<WrittenPathRegistry>,
    ) -> Self {
        Self {
            id,
            config,
            executor,
            payloads,
            registry,
        }
    }

    /// Run to the deadline and return this worker's results. Successful
    /// uploads are published to the registry as they complete.
    pub async fn run(self) -> Vec<OperationResult> {
        let mut results = Vec::new();
        let mut rng = StdRng::from_entropy();
        let mut operation_count: u64 = 0;
        let start = Instant::now();

        while start.elapsed() < self.config.duration {
            let Some(local_file) = self.payloads.choose(&mut rng) else {
                debug!("Write worker {} has no payloads, stopping", self.id);
                break;
            };

            let remote_path = remote_path_for(self.id, operation_count, current_timestamp_us());
            operation_count += 1;

            let request = ClientRequest::create_file(local_file.clone(), remote_path.clone());
            let result = self.executor.execute(&request).await;
            trace!(
                "Write worker {} {} -> {}",
                self.id, remote_path, result.success
            );

            results.push(result);
            if result.success {
                self.registry.publish(remote_path);
            }
        }

        debug!(
            "Write worker {} finished {} operations in {:?}",
            self.id,
            results.len(),
            start.elapsed()
        );
        results
    }
}

/// Downloads randomly sampled published paths until the phase deadline.
pub struct ReadWorker {
    id: usize,
    config: Arc<TestConfig>,
    executor: Arc<dyn CommandExecutor>,
    paths: PublishedPaths,
}

impl ReadWorker {
    pub fn new(
        id: usize,
        config: Arc<TestConfig>,
        executor: Arc<dyn CommandExecutor>,
        paths: PublishedPaths,
    ) -> Self {
        Self {
            id,
            config,
            executor,
            paths,
        }
    }

    /// Run to the deadline, or stop at once when nothing was published.
    pub async fn run(self) -> Vec<OperationResult> {
        let mut results = Vec::new();
        let mut rng = StdRng::from_entropy();
        let start = Instant::now();

        while start.elapsed() < self.config.duration {
            let Some(remote_path) = self.paths.sample(&mut rng) else {
                debug!("Read worker {} has nothing to read, stopping", self.id);
                break;
            };

            let local_path = staging_path_for(&self.config.staging_dir, self.id, remote_path);
            let request = ClientRequest::read_file(local_path.clone(), remote_path);
            let result = self.executor.execute(&request).await;
            trace!(
                "Read worker {} {} -> {}",
                self.id, remote_path, result.success
            );
            results.push(result);

            // Deletion failures are irrelevant to the measurement
            let _ = tokio::fs::remove_file(&local_path).await;
        }

        debug!(
            "Read worker {} finished {} operations in {:?}",
            self.id,
            results.len(),
            start.elapsed()
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_remote_path_layout() {
        assert_eq!(
            remote_path_for(3, 17, 1_700_000_000_000_000),
            "/test/worker_3/file_1700000000000000_3_17.dat"
        );
        assert_eq!(worker_directory(0), "/test/worker_0");
    }

    #[test]
    fn test_concurrent_workers_never_collide() {
        const WORKERS: usize = 8;
        const ITERATIONS: u64 = 500;

        let handles: Vec<_> = (0..WORKERS)
            .map(|worker_id| {
                std::thread::spawn(move || {
                    (0..ITERATIONS)
                        .map(|op| remote_path_for(worker_id, op, current_timestamp_us()))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut all = HashSet::new();
        for handle in handles {
            all.extend(handle.join().unwrap());
        }
        assert_eq!(all.len(), WORKERS * ITERATIONS as usize);
    }

    #[test]
    fn test_same_counter_and_timestamp_differ_by_worker() {
        assert_ne!(remote_path_for(1, 0, 42), remote_path_for(10, 0, 42));
        assert_ne!(remote_path_for(1, 10, 42), remote_path_for(11, 0, 42));
    }

    #[test]
    fn test_staging_path_is_worker_local() {
        let dir = Path::new("/tmp/staging");
        let remote = "/test/worker_0/file_1_0_0.dat";

        assert_eq!(
            staging_path_for(dir, 2, remote),
            PathBuf::from("/tmp/staging/downloaded_2_file_1_0_0.dat")
        );
        assert_ne!(staging_path_for(dir, 1, remote), staging_path_for(dir, 2, remote));
    }
}
