//! CompletionCallback port - 完了後処理
//!
//! # 契約
//! - upload task 1 件につきちょうど 1 回呼ばれる
//! - 異なる item については並行に呼ばれうる（同じ item で再入はしない）
//! - 失敗時の扱い（ログのみ / 再投入 / エスカレーション）は実装が決める

use async_trait::async_trait;

use crate::domain::{UploadOutcome, WorkItem};

/// Post-processing hook invoked once per finished upload task.
#[async_trait]
pub trait CompletionCallback: Send + Sync {
    async fn on_complete(&self, item: WorkItem, outcome: UploadOutcome);
}
