//! Dispatcher lifecycle flag.
//!
//! `watch` チャネルで状態を共有するので、ディスパッチャ以外の観測者も
//! `subscribe()` して遷移を待てます。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Running -> Draining -> Stopped. Never moves backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Polling the queue and submitting work.
    Running,
    /// Shutdown requested; no new drain cycle starts.
    Draining,
    /// Pool closed and every submitted task finished.
    Stopped,
}

#[derive(Debug, Clone)]
pub(crate) struct Lifecycle {
    tx: Arc<watch::Sender<LifecycleState>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(LifecycleState::Running);
        Self { tx: Arc::new(tx) }
    }

    pub fn state(&self) -> LifecycleState {
        *self.tx.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.tx.subscribe()
    }

    /// Move forward to `next`. Returns false if already at or past it.
    pub fn advance(&self, next: LifecycleState) -> bool {
        self.tx.send_if_modified(|state| {
            if *state < next {
                *state = next;
                true
            } else {
                false
            }
        })
    }
}
