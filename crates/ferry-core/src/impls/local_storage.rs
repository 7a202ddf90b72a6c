//! LocalDirBackend - ローカルディレクトリをアップロード先とする StorageBackend
//!
//! 開発・テスト用。remote key をルートからの相対パスとしてファイルをコピーします。

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::domain::WorkItem;
use crate::error::StorageError;
use crate::ports::StorageBackend;

pub struct LocalDirBackend {
    root: PathBuf,
}

impl LocalDirBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Destination path for a remote key. Keys must stay below the root.
    fn destination(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(StorageError::Rejected(format!("invalid remote key: {key}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl StorageBackend for LocalDirBackend {
    async fn upload(&self, item: &WorkItem) -> Result<(), StorageError> {
        let dest = self.destination(item.remote_key())?;

        if !fs::try_exists(item.path()).await? {
            return Err(StorageError::SourceMissing(item.path().display().to_string()));
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        let copied = fs::copy(item.path(), &dest).await?;
        debug!(item = %item.id(), dest = %dest.display(), bytes = copied, "copied work item");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn upload_copies_under_remote_key() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let file = src.path().join("nb-1-Data.db");
        std::fs::write(&file, b"sstable").unwrap();

        let backend = LocalDirBackend::new(dst.path());
        let item = WorkItem::new(&file, "ks/tbl/nb-1-Data.db", 7);
        backend.upload(&item).await.unwrap();

        let copied = std::fs::read(dst.path().join("ks/tbl/nb-1-Data.db")).unwrap();
        assert_eq!(copied, b"sstable");
    }

    #[tokio::test]
    async fn missing_source_is_reported() {
        let dst = TempDir::new().unwrap();
        let backend = LocalDirBackend::new(dst.path());
        let item = WorkItem::new(dst.path().join("gone.db"), "gone.db", 0);

        let err = backend.upload(&item).await.unwrap_err();
        assert!(matches!(err, StorageError::SourceMissing(_)));
    }

    #[tokio::test]
    async fn keys_cannot_escape_the_root() {
        let dst = TempDir::new().unwrap();
        let backend = LocalDirBackend::new(dst.path());
        let item = WorkItem::new("/etc/hosts", "../hosts", 0);

        let err = backend.upload(&item).await.unwrap_err();
        assert!(matches!(err, StorageError::Rejected(_)));
    }
}
