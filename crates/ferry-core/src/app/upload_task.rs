//! UploadTask - 1 ファイル分の作業単位
//!
//! item / backend / callback を束ね、`run(self)` で 1 回だけ実行されます。
//! アップロードの失敗（panic を含む）はここで捕まえて失敗 outcome に変換し、
//! ワーカーまで伝播させません。

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tracing::{debug, error};

use crate::domain::{OutcomeKind, UploadOutcome, WorkItem};
use crate::error::UploadError;
use crate::ports::{CompletionCallback, StorageBackend};

/// One work item bound to the backend call and its completion callback.
pub struct UploadTask {
    item: WorkItem,
    backend: Arc<dyn StorageBackend>,
    callback: Arc<dyn CompletionCallback>,
}

impl UploadTask {
    pub fn new(
        item: WorkItem,
        backend: Arc<dyn StorageBackend>,
        callback: Arc<dyn CompletionCallback>,
    ) -> Self {
        Self {
            item,
            backend,
            callback,
        }
    }

    pub fn item(&self) -> &WorkItem {
        &self.item
    }

    /// Upload the item and report the outcome to the callback.
    ///
    /// No retry here; the callback owns the failure policy.
    pub async fn run(self) -> OutcomeKind {
        let Self {
            item,
            backend,
            callback,
        } = self;

        let started = Instant::now();
        let outcome = match AssertUnwindSafe(backend.upload(&item)).catch_unwind().await {
            Ok(result) => UploadOutcome::from(result.map_err(UploadError::from)),
            Err(panic) => UploadOutcome::Failure(UploadError::Panicked(panic_message(panic))),
        };

        let kind = outcome.kind();
        debug!(
            item = %item.id(),
            outcome = ?kind,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upload task finished"
        );
        complete(callback.as_ref(), item, outcome).await;
        kind
    }

    /// Report a task that will never run (pool closed) as a failure.
    pub async fn reject(self) {
        complete(self.callback.as_ref(), self.item, UploadOutcome::Failure(UploadError::PoolClosed))
            .await;
    }
}

async fn complete(callback: &dyn CompletionCallback, item: WorkItem, outcome: UploadOutcome) {
    let id = item.id();
    if let Err(panic) = AssertUnwindSafe(callback.on_complete(item, outcome))
        .catch_unwind()
        .await
    {
        error!(item = %id, panic = %panic_message(panic), "completion callback panicked");
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(s) => *s,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(s) => (*s).to_string(),
            Err(_) => "unknown panic payload".to_string(),
        },
    }
}
