//! Dispatcher - キュー監視とワーカーへの割り当て
//!
//! # フロー（1 サイクル）
//! 1. キューの深さを報告
//! 2. キューが空になるまで take → UploadTask 化 → pool に submit（完了は待たない）
//! 3. poll interval だけ sleep して 1 に戻る
//!
//! take / sleep の割り込みは warning を出してループを続けます。
//! 停止要求はサイクルの境目でのみ確認されます。始まった drain はキューが空になるまで続きます。

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::lifecycle::{Lifecycle, LifecycleState};
use super::{UploadTask, WorkerPool};
use crate::config::DispatcherConfig;
use crate::domain::WorkItem;
use crate::error::{ConfigError, PoolError, QueueError};
use crate::observability::{DispatcherCounters, DispatcherStats, PoolStats};
use crate::ports::{CompletionCallback, StorageBackend, TaskQueue};

/// Wiring for one dispatcher: queue in, backend + callback out.
///
/// # 使用例
/// ```ignore
/// let handle = Dispatcher::new(queue, backend, callback, DispatcherConfig::default())?.start();
/// // ...
/// let stats = handle.shutdown().await;
/// ```
pub struct Dispatcher {
    queue: Arc<dyn TaskQueue>,
    backend: Arc<dyn StorageBackend>,
    callback: Arc<dyn CompletionCallback>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(
        queue: Arc<dyn TaskQueue>,
        backend: Arc<dyn StorageBackend>,
        callback: Arc<dyn CompletionCallback>,
        config: DispatcherConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            queue,
            backend,
            callback,
            config,
        })
    }

    /// Spawn the worker pool and the polling loop on the current runtime.
    pub fn start(self) -> DispatcherHandle {
        let pool = Arc::new(WorkerPool::spawn(self.config.max_workers));
        let lifecycle = Lifecycle::new();
        let counters = Arc::new(DispatcherCounters::default());
        let wakeup = Arc::new(Notify::new());

        let poll_loop = PollLoop {
            queue: self.queue,
            backend: self.backend,
            callback: self.callback,
            pool: Arc::clone(&pool),
            lifecycle: lifecycle.clone(),
            counters: Arc::clone(&counters),
            wakeup: Arc::clone(&wakeup),
            poll_interval: self.config.poll_interval,
        };
        info!(
            max_workers = self.config.max_workers,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "dispatcher started"
        );
        let join = tokio::spawn(poll_loop.run());

        DispatcherHandle {
            lifecycle,
            pool,
            counters,
            wakeup,
            join,
        }
    }
}

/// Control handle for a running dispatcher.
///
/// Dropping the handle without calling [`shutdown`](Self::shutdown) leaves the
/// loop running detached.
pub struct DispatcherHandle {
    lifecycle: Lifecycle,
    pool: Arc<WorkerPool>,
    counters: Arc<DispatcherCounters>,
    wakeup: Arc<Notify>,
    join: JoinHandle<()>,
}

impl DispatcherHandle {
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Watch lifecycle transitions from another task.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.lifecycle.subscribe()
    }

    pub fn stats(&self) -> DispatcherStats {
        self.counters.snapshot()
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn pool(&self) -> Arc<WorkerPool> {
        Arc::clone(&self.pool)
    }

    /// Cut the current poll sleep short. If the loop is not sleeping, the next
    /// sleep returns immediately.
    pub fn interrupt(&self) {
        self.wakeup.notify_one();
    }

    /// Ask the loop to stop after its current iteration without waiting.
    pub fn request_shutdown(&self) {
        if self.lifecycle.advance(LifecycleState::Draining) {
            info!("dispatcher shutdown requested");
        }
    }

    /// Stop polling, close the pool and wait for every submitted task.
    ///
    /// Items still sitting in the queue are left there.
    pub async fn shutdown(self) -> DispatcherStats {
        self.request_shutdown();

        if let Err(e) = self.join.await {
            error!(error = %e, "dispatcher loop terminated abnormally");
        }
        self.pool.close().await;
        self.lifecycle.advance(LifecycleState::Stopped);

        let stats = self.counters.snapshot();
        info!(
            cycles = stats.cycles,
            submitted = stats.submitted,
            rejected = stats.rejected,
            "dispatcher stopped"
        );
        stats
    }
}

struct PollLoop {
    queue: Arc<dyn TaskQueue>,
    backend: Arc<dyn StorageBackend>,
    callback: Arc<dyn CompletionCallback>,
    pool: Arc<WorkerPool>,
    lifecycle: Lifecycle,
    counters: Arc<DispatcherCounters>,
    wakeup: Arc<Notify>,
    poll_interval: Duration,
}

impl PollLoop {
    async fn run(self) {
        while self.lifecycle.is_running() {
            DispatcherCounters::bump(&self.counters.cycles);
            info!(pending = self.queue.pending_count(), "work queue depth");

            self.drain().await;

            // ノードを圧迫しないよう、次にキューを見るまで一定時間待つ
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = self.wakeup.notified() => {
                    DispatcherCounters::bump(&self.counters.interrupted);
                    warn!("interrupted while sleeping until next poll");
                }
            }
        }
        info!("dispatcher loop exited");
    }

    async fn drain(&self) {
        while self.queue.has_pending() {
            match self.queue.take().await {
                Ok(item) => self.dispatch(item).await,
                Err(QueueError::Interrupted) => {
                    DispatcherCounters::bump(&self.counters.interrupted);
                    warn!("interrupted while waiting to dequeue a task");
                }
                Err(e) => {
                    // 同じエラーで空回りしないよう、このサイクルはここで打ち切る
                    warn!(error = %e, "failed to dequeue a task");
                    break;
                }
            }
        }
    }

    async fn dispatch(&self, item: WorkItem) {
        let queued_ms = (Utc::now() - item.discovered_at()).num_milliseconds();
        info!(item = %item.id(), file = item.file_name(), queued_ms, "dequeued task");

        let task = UploadTask::new(item, Arc::clone(&self.backend), Arc::clone(&self.callback));
        match self.pool.submit(task) {
            Ok(()) => DispatcherCounters::bump(&self.counters.submitted),
            Err(PoolError::Closed(task)) => {
                DispatcherCounters::bump(&self.counters.rejected);
                error!(item = %task.item().id(), "worker pool closed, reporting task as failed");
                task.reject().await;
            }
        }
    }
}
