use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort a benchmark run.
///
/// Individual client invocations never produce one of these: a failed
/// create or read is recorded as an unsuccessful `OperationResult` and only
/// shows up in the phase's success rate.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The client could not create a remote directory the workers write into
    #[error("failed to create remote directory {path}")]
    RemoteDirectory { path: String },

    /// The local staging directory could not be created
    #[error("failed to create staging directory {path:?}: {source}")]
    StagingDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A payload file could not be written
    #[error("failed to write payload file {path:?}: {source}")]
    PayloadWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A worker task panicked, so its result list is lost
    #[error("{kind} worker {worker_id} did not complete: {reason}")]
    WorkerPanicked {
        kind: crate::metrics::OperationKind,
        worker_id: usize,
        reason: String,
    },

    /// Configuration rejected before any work started
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BenchError {
    /// Setup failures are the ones that happen before any worker starts.
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            BenchError::RemoteDirectory { .. }
                | BenchError::StagingDirectory { .. }
                | BenchError::PayloadWrite { .. }
                | BenchError::InvalidConfig(_)
        )
    }
}
