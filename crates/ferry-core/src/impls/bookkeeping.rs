//! QueueBookkeeping - デフォルトの完了後処理
//!
//! 成功したら InMemoryTaskQueue の帳簿から外し、同じファイルを再び投入できるようにします。
//! 失敗時の扱いは [`FailureDisposition`] で選びます。リトライ間隔などの方針は持ちません。

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::InMemoryTaskQueue;
use crate::domain::{UploadOutcome, WorkItem};
use crate::ports::CompletionCallback;

/// What to do with an item whose upload failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureDisposition {
    /// Warn and drop the item from bookkeeping.
    #[default]
    LogOnly,
    /// Warn and put the item back at the tail of the queue.
    Requeue,
}

pub struct QueueBookkeeping {
    queue: Arc<InMemoryTaskQueue>,
    on_failure: FailureDisposition,
}

impl QueueBookkeeping {
    pub fn new(queue: Arc<InMemoryTaskQueue>, on_failure: FailureDisposition) -> Self {
        Self { queue, on_failure }
    }
}

#[async_trait]
impl CompletionCallback for QueueBookkeeping {
    async fn on_complete(&self, item: WorkItem, outcome: UploadOutcome) {
        match outcome {
            UploadOutcome::Success => {
                self.queue.release(&item);
                info!(item = %item.id(), key = item.remote_key(), "upload completed");
            }
            UploadOutcome::Failure(error) => match self.on_failure {
                FailureDisposition::LogOnly => {
                    warn!(item = %item.id(), key = item.remote_key(), error = %error, "upload failed, dropping");
                    self.queue.release(&item);
                }
                FailureDisposition::Requeue => {
                    warn!(item = %item.id(), key = item.remote_key(), error = %error, "upload failed, requeueing");
                    self.queue.requeue(item);
                }
            },
        }
    }
}
