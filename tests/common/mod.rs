#![allow(dead_code)]

use async_trait::async_trait;
use dfs_bench::{Action, ClientRequest, CommandExecutor, Credentials, OperationResult, TestConfig};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Stand-in for the storage client.
///
/// Records every request, takes `latency` per call, and fails every
/// `fail_every`-th file create (1-based) when set.
pub struct FakeClient {
    pub requests: Mutex<Vec<ClientRequest>>,
    latency: Duration,
    fail_every: Option<usize>,
    fail_directories: bool,
    creates: AtomicUsize,
}

impl FakeClient {
    pub fn new(latency: Duration) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            latency,
            fail_every: None,
            fail_directories: false,
            creates: AtomicUsize::new(0),
        }
    }

    pub fn failing_every(mut self, n: usize) -> Self {
        self.fail_every = Some(n);
        self
    }

    pub fn failing_directories(mut self) -> Self {
        self.fail_directories = true;
        self
    }

    pub fn file_requests(&self, action: Action) -> Vec<ClientRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.target == dfs_bench::Target::File && r.action == action)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CommandExecutor for FakeClient {
    async fn execute(&self, request: &ClientRequest) -> OperationResult {
        let start = Instant::now();
        self.requests.lock().push(request.clone());
        tokio::time::sleep(self.latency).await;

        let success = match (request.target, request.action) {
            (dfs_bench::Target::Directory, _) => !self.fail_directories,
            (dfs_bench::Target::File, Action::Create) => {
                let n = self.creates.fetch_add(1, Ordering::SeqCst) + 1;
                !matches!(self.fail_every, Some(k) if n % k == 0)
            }
            (dfs_bench::Target::File, Action::Read) => true,
        };

        OperationResult {
            success,
            latency: start.elapsed(),
        }
    }
}

pub fn test_config(staging_dir: PathBuf, concurrency: usize, duration: Duration) -> TestConfig {
    TestConfig {
        credentials: Credentials::new("bench", "secret"),
        concurrency,
        file_size_mb: 1,
        num_files: 2,
        duration,
        client_path: PathBuf::from("dfs-client"),
        staging_dir,
    }
}

/// Worker id encoded in a write request's remote path
pub fn worker_of(request: &ClientRequest) -> usize {
    let path = request.remote_path.as_deref().unwrap_or_default();
    path.split('/')
        .find_map(|segment| segment.strip_prefix("worker_"))
        .and_then(|id| id.parse().ok())
        .unwrap_or(usize::MAX)
}
