use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

/// Point-in-time view of a worker pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub workers: usize,
    /// Tasks currently executing.
    pub active: usize,
    /// Tasks submitted but not yet picked up by a worker.
    pub backlog: usize,
    pub completed: u64,
    /// Of `completed`, uploads that succeeded.
    pub succeeded: u64,
    /// Of `completed`, uploads that failed or panicked.
    pub failed: u64,
}

/// Point-in-time view of a dispatcher loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherStats {
    /// Poll cycles started (one depth report each).
    pub cycles: u64,
    pub submitted: u64,
    /// Submissions the pool refused.
    pub rejected: u64,
    /// Interrupted takes and sleeps.
    pub interrupted: u64,
}

#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub active: AtomicUsize,
    pub backlog: AtomicUsize,
    pub completed: AtomicU64,
    pub succeeded: AtomicU64,
    pub failed: AtomicU64,
}

impl PoolCounters {
    pub fn snapshot(&self, workers: usize) -> PoolStats {
        PoolStats {
            workers,
            active: self.active.load(Ordering::Acquire),
            backlog: self.backlog.load(Ordering::Acquire),
            completed: self.completed.load(Ordering::Acquire),
            succeeded: self.succeeded.load(Ordering::Acquire),
            failed: self.failed.load(Ordering::Acquire),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct DispatcherCounters {
    pub cycles: AtomicU64,
    pub submitted: AtomicU64,
    pub rejected: AtomicU64,
    pub interrupted: AtomicU64,
}

impl DispatcherCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::AcqRel);
    }

    pub fn snapshot(&self) -> DispatcherStats {
        DispatcherStats {
            cycles: self.cycles.load(Ordering::Acquire),
            submitted: self.submitted.load(Ordering::Acquire),
            rejected: self.rejected.load(Ordering::Acquire),
            interrupted: self.interrupted.load(Ordering::Acquire),
        }
    }
}
