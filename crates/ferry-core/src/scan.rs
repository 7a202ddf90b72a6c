//! Discover files under a directory and turn them into work items.

use std::io;
use std::path::{Component, Path};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::domain::WorkItem;

/// One work item per regular file below `root`, in lexical order.
///
/// The remote key is the path relative to `root`, `/`-separated. Entries that
/// cannot be read are logged and skipped.
pub fn discover(root: &Path) -> io::Result<Vec<WorkItem>> {
    if !root.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("not a directory: {}", root.display()),
        ));
    }

    let mut items = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "skipping file without metadata");
                continue;
            }
        };
        let Some(key) = remote_key(root, entry.path()) else {
            continue;
        };
        items.push(WorkItem::new(entry.path(), key, size));
    }

    debug!(root = %root.display(), found = items.len(), "scan finished");
    Ok(items)
}

fn remote_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> = relative
        .components()
        .map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    parts.map(|p| p.join("/"))
}
