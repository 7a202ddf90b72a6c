//! WorkerPool - 固定数ワーカー + 上限なし backlog
//!
//! # 設計
//! - N 本の長寿命ワーカーが 1 本の unbounded mpsc（backlog）を共有して読む
//! - `submit` は待たない。閉じていない限り必ず受け付ける
//! - `close` は送信側を drop し、ワーカーが backlog を読み切って終わるのを待つ
//!   （実行中・積まれ済みのタスクはキャンセルしない）

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::UploadTask;
use crate::domain::OutcomeKind;
use crate::error::PoolError;
use crate::observability::{PoolCounters, PoolStats};

type Backlog = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<UploadTask>>>;

/// Fixed-size pool executing upload tasks.
pub struct WorkerPool {
    size: usize,
    backlog_tx: Mutex<Option<mpsc::UnboundedSender<UploadTask>>>,
    workers: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
    counters: Arc<PoolCounters>,
}

impl WorkerPool {
    /// Spawn `size` workers on the current tokio runtime (at least one).
    pub fn spawn(size: usize) -> Self {
        let size = size.max(1);
        let (tx, rx) = mpsc::unbounded_channel();
        let backlog: Backlog = Arc::new(tokio::sync::Mutex::new(rx));
        let counters = Arc::new(PoolCounters::default());

        let mut workers = Vec::with_capacity(size);
        for worker_id in 0..size {
            let backlog = Arc::clone(&backlog);
            let counters = Arc::clone(&counters);
            workers.push(tokio::spawn(worker_loop(worker_id, backlog, counters)));
        }
        debug!(workers = size, "worker pool started");

        Self {
            size,
            backlog_tx: Mutex::new(Some(tx)),
            workers: tokio::sync::Mutex::new(workers),
            counters,
        }
    }

    fn sender(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<UploadTask>>> {
        self.backlog_tx.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a task for execution. Never waits for a free worker.
    pub fn submit(&self, task: UploadTask) -> Result<(), PoolError> {
        let sender = self.sender();
        let Some(tx) = sender.as_ref() else {
            return Err(PoolError::Closed(task));
        };

        // backlog を先に増やす（ワーカー側の減算が先行しないように）
        self.counters.backlog.fetch_add(1, Ordering::AcqRel);
        if let Err(mpsc::error::SendError(task)) = tx.send(task) {
            self.counters.backlog.fetch_sub(1, Ordering::AcqRel);
            return Err(PoolError::Closed(task));
        }
        Ok(())
    }

    /// Stop accepting submissions and wait for running and backlogged tasks.
    ///
    /// Safe to call more than once; later callers wait for the first to finish.
    pub async fn close(&self) {
        let was_open = self.sender().take().is_some();
        if was_open {
            info!(backlog = self.counters.backlog.load(Ordering::Acquire), "worker pool closing");
        }

        let mut workers = self.workers.lock().await;
        for (worker_id, join) in workers.drain(..).enumerate() {
            if let Err(e) = join.await {
                error!(worker_id, error = %e, "worker terminated abnormally");
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender().is_none()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.size)
    }
}

async fn worker_loop(worker_id: usize, backlog: Backlog, counters: Arc<PoolCounters>) {
    loop {
        // 受信待ちの間だけロックを持つ。実行中は他のワーカーが次を取れる
        let next = backlog.lock().await.recv().await;
        let Some(task) = next else {
            break;
        };

        counters.backlog.fetch_sub(1, Ordering::AcqRel);
        counters.active.fetch_add(1, Ordering::AcqRel);
        debug!(worker_id, item = %task.item().id(), "worker picked up task");

        let outcome = match task.run().await {
            OutcomeKind::Success => &counters.succeeded,
            OutcomeKind::Failure => &counters.failed,
        };

        counters.active.fetch_sub(1, Ordering::AcqRel);
        outcome.fetch_add(1, Ordering::AcqRel);
        counters.completed.fetch_add(1, Ordering::AcqRel);
    }
    debug!(worker_id, "worker stopped");
}
