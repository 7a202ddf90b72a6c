use thiserror::Error;

use crate::app::UploadTask;

/// Errors surfaced by a [`TaskQueue`](crate::ports::TaskQueue).
#[derive(Debug, Error)]
pub enum QueueError {
    /// The waiter was woken before an item arrived.
    #[error("interrupted while waiting for a work item")]
    Interrupted,

    #[error("{0}")]
    Other(String),
}

/// Errors returned by a [`StorageBackend`](crate::ports::StorageBackend).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("source file missing: {0}")]
    SourceMissing(String),

    #[error("upload rejected: {0}")]
    Rejected(String),
}

/// The cause carried by a failed [`UploadOutcome`](crate::domain::UploadOutcome).
#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("upload panicked: {0}")]
    Panicked(String),

    /// The pool was closed before the task could be scheduled.
    #[error("worker pool closed, task was never executed")]
    PoolClosed,
}

/// Submission to a closed [`WorkerPool`](crate::app::WorkerPool).
///
/// The rejected task is handed back so the caller can still report it.
#[derive(Error)]
pub enum PoolError {
    #[error("worker pool is closed")]
    Closed(UploadTask),
}

impl std::fmt::Debug for PoolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoolError::Closed(task) => f.debug_tuple("Closed").field(&task.item().id()).finish(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max_workers must be at least 1")]
    NoWorkers,

    #[error("poll_interval must be non-zero")]
    ZeroPollInterval,

    #[error("invalid value for {var}: {value}")]
    InvalidEnv { var: &'static str, value: String },
}
