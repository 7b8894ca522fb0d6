//! # Command Executor
//!
//! Every unit of benchmark work is a single invocation of the storage
//! service's command-line client. This module wraps that invocation behind
//! the `CommandExecutor` trait so that workers never know whether they are
//! talking to a real client process or to a test double.
//!
//! ## Client Contract
//!
//! ```text
//! <client> --username U --password P --target {file|directory}
//!          --action {create|read} [--local-path L] [--remote-path R]
//! ```
//!
//! Exit status `0` means success. Any other status, a launch failure, or an
//! I/O fault while waiting is a failed operation. Only the exit status and
//! the wall-clock time are consumed; stdout is discarded and stderr is kept
//! for diagnostics.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

/// Kind of remote object an invocation acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    File,
    Directory,
}

impl Target {
    /// Value passed to the client's `--target` flag
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::File => "file",
            Target::Directory => "directory",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the client should do with the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
}

impl Action {
    /// Value passed to the client's `--action` flag
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Username and password forwarded to every client invocation
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// One client invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRequest {
    pub target: Target,
    pub action: Action,
    pub local_path: Option<PathBuf>,
    pub remote_path: Option<String>,
}

impl ClientRequest {
    /// Upload `local_path` to `remote_path`
    pub fn create_file(local_path: impl Into<PathBuf>, remote_path: impl Into<String>) -> Self {
        Self {
            target: Target::File,
            action: Action::Create,
            local_path: Some(local_path.into()),
            remote_path: Some(remote_path.into()),
        }
    }

    /// Download `remote_path` into `local_path`
    pub fn read_file(local_path: impl Into<PathBuf>, remote_path: impl Into<String>) -> Self {
        Self {
            target: Target::File,
            action: Action::Read,
            local_path: Some(local_path.into()),
            remote_path: Some(remote_path.into()),
        }
    }

    /// Create a remote directory
    pub fn create_directory(remote_path: impl Into<String>) -> Self {
        Self {
            target: Target::Directory,
            action: Action::Create,
            local_path: None,
            remote_path: Some(remote_path.into()),
        }
    }

    /// Build the argument list for the client, credentials first.
    pub fn to_args(&self, credentials: &Credentials) -> Vec<String> {
        let mut args = vec![
            "--username".to_string(),
            credentials.username.clone(),
            "--password".to_string(),
            credentials.password.clone(),
            "--target".to_string(),
            self.target.to_string(),
            "--action".to_string(),
            self.action.to_string(),
        ];

        if let Some(ref local_path) = self.local_path {
            args.push("--local-path".to_string());
            args.push(local_path.to_string_lossy().into_owned());
        }
        if let Some(ref remote_path) = self.remote_path {
            args.push("--remote-path".to_string());
            args.push(remote_path.clone());
        }

        args
    }
}

/// Outcome of a single client invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    pub success: bool,
    pub latency: Duration,
}

impl OperationResult {
    pub fn succeeded(latency: Duration) -> Self {
        Self {
            success: true,
            latency,
        }
    }

    pub fn failed(latency: Duration) -> Self {
        Self {
            success: false,
            latency,
        }
    }
}

/// Executes one client request and reports how it went.
///
/// Implementations must not fail: every fault is folded into an
/// `OperationResult` with `success = false`, and the elapsed time is
/// measured up to the point the fault was observed. There are no retries.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, request: &ClientRequest) -> OperationResult;
}

/// Runs the real storage client as a child process
#[derive(Debug, Clone)]
pub struct ClientExecutor {
    client_path: PathBuf,
    credentials: Credentials,
}

impl ClientExecutor {
    /// Executor for the client binary at `client_path`. The path is
    /// resolved through `PATH` when it has no directory component.
    pub fn new(client_path: impl Into<PathBuf>, credentials: Credentials) -> Self {
        Self {
            client_path: client_path.into(),
            credentials,
        }
    }

    pub fn from_config(config: &crate::benchmark::TestConfig) -> Self {
        Self::new(config.client_path.clone(), config.credentials.clone())
    }
}

#[async_trait]
impl CommandExecutor for ClientExecutor {
    async fn execute(&self, request: &ClientRequest) -> OperationResult {
        let start = Instant::now();

        let output = Command::new(&self.client_path)
            .args(request.to_args(&self.credentials))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let latency = start.elapsed();

        match output {
            Ok(output) if output.status.success() => {
                debug!(
                    "{} {} {:?} completed in {:?}",
                    request.action, request.target, request.remote_path, latency
                );
                OperationResult::succeeded(latency)
            }
            Ok(output) => {
                warn!(
                    "Command failed ({}): {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                OperationResult::failed(latency)
            }
            Err(e) => {
                warn!("Error executing command {:?}: {}", self.client_path, e);
                OperationResult::failed(latency)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_args_for_file_create() {
        let credentials = Credentials::new("alice", "secret");
        let request = ClientRequest::create_file("/tmp/test_file_0.dat", "/test/worker_0/a.dat");

        assert_eq!(
            request.to_args(&credentials),
            vec![
                "--username",
                "alice",
                "--password",
                "secret",
                "--target",
                "file",
                "--action",
                "create",
                "--local-path",
                "/tmp/test_file_0.dat",
                "--remote-path",
                "/test/worker_0/a.dat",
            ]
        );
    }

    #[test]
    fn test_request_args_for_directory_omit_local_path() {
        let credentials = Credentials::new("bob", "pw");
        let args = ClientRequest::create_directory("/test").to_args(&credentials);

        assert!(!args.contains(&"--local-path".to_string()));
        assert_eq!(args[5], "directory");
        assert_eq!(args.last().map(String::as_str), Some("/test"));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = Credentials::new("alice", "hunter2");
        let debug = format!("{:?}", credentials);

        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_missing_client_is_a_failed_operation() {
        let executor = ClientExecutor::new(
            "/nonexistent/dfs-bench-client",
            Credentials::new("alice", "secret"),
        );
        let result = executor
            .execute(&ClientRequest::create_directory("/test"))
            .await;

        assert!(!result.success);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_status_decides_success() {
        let credentials = Credentials::new("alice", "secret");
        let request = ClientRequest::create_directory("/test");

        let ok = ClientExecutor::new("true", credentials.clone())
            .execute(&request)
            .await;
        assert!(ok.success);

        let failed = ClientExecutor::new("false", credentials)
            .execute(&request)
            .await;
        assert!(!failed.success);
    }
}
