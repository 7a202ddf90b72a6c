//! TaskQueue port - アップロード待ちキュー
//!
//! ディスパッチャはこの trait 越しにキューを消費するだけで、
//! 保存方法や並び順の実装には関与しません。

use async_trait::async_trait;

use crate::domain::WorkItem;
use crate::error::QueueError;

/// Pending-work queue consumed by the dispatcher.
///
/// # 設計原則
/// - 並行 add/remove の安全性は実装側の責任
/// - `has_pending` / `pending_count` は待たない（観測用、古い値でもよい）
/// - `take` は次の item が来るまで待つ。割り込まれたら `QueueError::Interrupted`
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// True if at least one item is currently available.
    fn has_pending(&self) -> bool;

    /// Remove the next item in queue order, waiting for one if necessary.
    async fn take(&self) -> Result<WorkItem, QueueError>;

    /// Size estimate, for observability only.
    fn pending_count(&self) -> usize;
}
