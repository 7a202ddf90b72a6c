//! ferry-core
//!
//! Background dispatcher that drains a queue of discovered files into a
//! fixed-size pool of upload workers.
//!
//! # モジュール構成
//! - **domain**: WorkItem, ItemId, UploadOutcome
//! - **ports**: TaskQueue, StorageBackend, CompletionCallback
//! - **app**: Dispatcher, WorkerPool, UploadTask, LifecycleState
//! - **impls**: InMemoryTaskQueue, LocalDirBackend, QueueBookkeeping
//! - **config / observability / scan**: 設定、統計スナップショット、ディレクトリ走査

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod scan;

#[cfg(test)]
pub(crate) mod testing;

pub use app::{Dispatcher, DispatcherHandle, LifecycleState, UploadTask, WorkerPool};
pub use config::DispatcherConfig;
pub use domain::{ItemId, OutcomeKind, UploadOutcome, WorkItem};
pub use error::{ConfigError, PoolError, QueueError, StorageError, UploadError};
pub use impls::{FailureDisposition, InMemoryTaskQueue, LocalDirBackend, QueueBookkeeping};
pub use observability::{DispatcherStats, PoolStats};
pub use ports::{CompletionCallback, StorageBackend, TaskQueue};
