use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use super::ItemId;

/// A discovered file awaiting upload.
///
/// Immutable once enqueued. Ownership moves queue -> upload task -> callback;
/// the remote key is what the queue deduplicates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    id: ItemId,
    path: PathBuf,
    remote_key: String,
    size_bytes: u64,
    discovered_at: DateTime<Utc>,
}

impl WorkItem {
    pub fn new(path: impl Into<PathBuf>, remote_key: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            id: ItemId::generate(),
            path: path.into(),
            remote_key: remote_key.into(),
            size_bytes,
            discovered_at: Utc::now(),
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Local path of the file to upload.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Destination key on the storage backend (`/`-separated).
    pub fn remote_key(&self) -> &str {
        &self.remote_key
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn discovered_at(&self) -> DateTime<Utc> {
        self.discovered_at
    }

    /// File name component, for log lines.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(self.remote_key.as_str())
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.remote_key, self.id)
    }
}
