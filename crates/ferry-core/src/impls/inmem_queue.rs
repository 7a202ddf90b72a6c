//! InMemoryTaskQueue - プロセス内のアップロード待ちキュー
//!
//! # 実装詳細
//! - `std::sync::Mutex` で状態を保護（ロックは await を跨がない）
//! - `tokio::sync::Notify` で add / interrupt 時に待機中の take を起こす
//! - remote key の集合で「キュー中 or 処理中」を記録し、二重投入を防ぐ
//!
//! 帳簿（tracked）は take では消えません。完了後処理が `release` するまで残ります。

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;
use tracing::debug;

use crate::domain::WorkItem;
use crate::error::QueueError;
use crate::ports::TaskQueue;

struct QueueState {
    ready: VecDeque<WorkItem>,
    /// Remote keys that are queued or in flight.
    tracked: HashSet<String>,
    /// Bumped by `interrupt()`; takers compare against the value they started with.
    interrupts: u64,
}

/// FIFO task queue with per-key deduplication.
///
/// # 使用例
/// ```ignore
/// let queue = Arc::new(InMemoryTaskQueue::new());
/// queue.add(WorkItem::new("/data/a.db", "a.db", 1024));
/// let item = queue.take().await?;
/// // ... upload ...
/// queue.release(&item);
/// ```
pub struct InMemoryTaskQueue {
    state: Mutex<QueueState>,
    notify: Notify,
}

impl InMemoryTaskQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                ready: VecDeque::new(),
                tracked: HashSet::new(),
                interrupts: 0,
            }),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue an item unless one with the same remote key is queued or in flight.
    ///
    /// Returns `false` for a duplicate.
    pub fn add(&self, item: WorkItem) -> bool {
        {
            let mut state = self.lock();
            if !state.tracked.insert(item.remote_key().to_string()) {
                debug!(key = item.remote_key(), "work item already tracked, skipping");
                return false;
            }
            state.ready.push_back(item);
        }
        self.notify.notify_waiters();
        true
    }

    /// Put an in-flight item back at the tail, keeping its bookkeeping entry.
    pub fn requeue(&self, item: WorkItem) {
        {
            let mut state = self.lock();
            state.tracked.insert(item.remote_key().to_string());
            state.ready.push_back(item);
        }
        self.notify.notify_waiters();
    }

    /// Drop the bookkeeping entry once an item has been post-processed.
    pub fn release(&self, item: &WorkItem) -> bool {
        self.lock().tracked.remove(item.remote_key())
    }

    /// Wake every waiter currently blocked in `take` with `QueueError::Interrupted`.
    pub fn interrupt(&self) {
        self.lock().interrupts += 1;
        self.notify.notify_waiters();
    }

    /// Items queued or in flight (not yet released).
    pub fn outstanding(&self) -> usize {
        self.lock().tracked.len()
    }
}

impl Default for InMemoryTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskQueue for InMemoryTaskQueue {
    fn has_pending(&self) -> bool {
        !self.lock().ready.is_empty()
    }

    async fn take(&self) -> Result<WorkItem, QueueError> {
        let seen = self.lock().interrupts;
        loop {
            // 状態を見る前に登録しておき、その間の notify を取りこぼさない
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if let Some(item) = state.ready.pop_front() {
                    return Ok(item);
                }
                if state.interrupts != seen {
                    return Err(QueueError::Interrupted);
                }
            }

            notified.await;
        }
    }

    fn pending_count(&self) -> usize {
        self.lock().ready.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn item(key: &str) -> WorkItem {
        WorkItem::new(format!("/data/{key}"), key, 10)
    }

    #[tokio::test]
    async fn take_returns_items_in_fifo_order() {
        let queue = InMemoryTaskQueue::new();
        assert!(queue.add(item("a")));
        assert!(queue.add(item("b")));
        assert!(queue.add(item("c")));

        assert_eq!(queue.pending_count(), 3);
        assert_eq!(queue.take().await.unwrap().remote_key(), "a");
        assert_eq!(queue.take().await.unwrap().remote_key(), "b");
        assert_eq!(queue.take().await.unwrap().remote_key(), "c");
        assert!(!queue.has_pending());
    }

    #[tokio::test]
    async fn duplicate_keys_are_rejected_until_released() {
        let queue = InMemoryTaskQueue::new();
        assert!(queue.add(item("a")));
        assert!(!queue.add(item("a")));

        let taken = queue.take().await.unwrap();
        // still in flight
        assert!(!queue.add(item("a")));
        assert_eq!(queue.outstanding(), 1);

        assert!(queue.release(&taken));
        assert_eq!(queue.outstanding(), 0);
        assert!(queue.add(item("a")));
    }

    #[tokio::test]
    async fn requeue_keeps_bookkeeping() {
        let queue = InMemoryTaskQueue::new();
        queue.add(item("a"));
        let taken = queue.take().await.unwrap();
        let id = taken.id();

        queue.requeue(taken);
        assert_eq!(queue.outstanding(), 1);
        assert_eq!(queue.take().await.unwrap().id(), id);
    }

    #[tokio::test]
    async fn add_wakes_blocked_take() {
        let queue = Arc::new(InMemoryTaskQueue::new());

        let waiter = tokio::spawn({
            let queue = Arc::clone(&queue);
            async move { queue.take().await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());
        queue.add(item("late"));

        let taken = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(taken.remote_key(), "late");
    }

    #[tokio::test]
    async fn interrupt_wakes_blocked_take_with_error() {
        let queue = Arc::new(InMemoryTaskQueue::new());

        let waiter = tokio::spawn({
            let queue = Arc::clone(&queue);
            async move { queue.take().await }
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        queue.interrupt();

        let result = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result, Err(QueueError::Interrupted)));
    }

    #[tokio::test]
    async fn interrupt_does_not_poison_later_takes() {
        let queue = InMemoryTaskQueue::new();
        queue.interrupt();
        queue.add(item("a"));
        assert_eq!(queue.take().await.unwrap().remote_key(), "a");
    }
}
