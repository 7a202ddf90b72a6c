//! StorageBackend port - リモートストレージ
//!
//! アップロードの仕組みは不透明な 1 回の呼び出しとして扱います。

use async_trait::async_trait;

use crate::domain::WorkItem;
use crate::error::StorageError;

/// Remote storage the upload tasks write to.
///
/// Implementations may block for as long as the transfer takes; the pool
/// bounds how many of these calls run at once.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn upload(&self, item: &WorkItem) -> Result<(), StorageError>;
}
