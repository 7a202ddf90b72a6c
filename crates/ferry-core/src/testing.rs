//! Test doubles shared by the app-layer tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::domain::{OutcomeKind, UploadOutcome, WorkItem};
use crate::error::StorageError;
use crate::ports::{CompletionCallback, StorageBackend};

pub fn item(key: &str) -> WorkItem {
    WorkItem::new(format!("/data/{key}"), key, 1)
}

/// Let every runnable task make progress (paused clock advances 1ms).
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// Tracks how many uploads run at once.
#[derive(Default)]
pub struct Concurrency {
    active: AtomicUsize,
    max: AtomicUsize,
}

impl Concurrency {
    pub fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
    }

    pub fn exit(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn max(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }
}

/// Uploads block until the test hands out permits.
pub struct GatedBackend {
    gate: Semaphore,
    started: Mutex<Vec<String>>,
    pub concurrency: Concurrency,
}

impl GatedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            started: Mutex::new(Vec::new()),
            concurrency: Concurrency::default(),
        })
    }

    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageBackend for GatedBackend {
    async fn upload(&self, item: &WorkItem) -> Result<(), StorageError> {
        self.started.lock().unwrap().push(item.remote_key().to_string());
        self.concurrency.enter();
        if let Ok(permit) = self.gate.acquire().await {
            permit.forget();
        }
        self.concurrency.exit();
        Ok(())
    }
}

/// Uploads take a fixed amount of (paused) time.
pub struct SlowBackend {
    delay: Duration,
    pub concurrency: Concurrency,
}

impl SlowBackend {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            concurrency: Concurrency::default(),
        })
    }
}

#[async_trait]
impl StorageBackend for SlowBackend {
    async fn upload(&self, _item: &WorkItem) -> Result<(), StorageError> {
        self.concurrency.enter();
        tokio::time::sleep(self.delay).await;
        self.concurrency.exit();
        Ok(())
    }
}

pub struct FailingBackend;

#[async_trait]
impl StorageBackend for FailingBackend {
    async fn upload(&self, item: &WorkItem) -> Result<(), StorageError> {
        Err(StorageError::Rejected(format!("no space for {}", item.remote_key())))
    }
}

pub struct PanickingBackend;

#[async_trait]
impl StorageBackend for PanickingBackend {
    async fn upload(&self, _item: &WorkItem) -> Result<(), StorageError> {
        panic!("backend exploded");
    }
}

/// Records every `on_complete` call.
#[derive(Default)]
pub struct RecordingCallback {
    calls: Mutex<Vec<(WorkItem, OutcomeKind, Option<String>)>>,
}

impl RecordingCallback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn keys(&self) -> Vec<String> {
        let calls = self.calls.lock().unwrap();
        calls.iter().map(|(i, _, _)| i.remote_key().to_string()).collect()
    }

    pub fn kinds(&self) -> Vec<OutcomeKind> {
        self.calls.lock().unwrap().iter().map(|(_, k, _)| *k).collect()
    }

    pub fn errors(&self) -> Vec<String> {
        let calls = self.calls.lock().unwrap();
        calls.iter().filter_map(|(_, _, e)| e.clone()).collect()
    }
}

#[async_trait]
impl CompletionCallback for RecordingCallback {
    async fn on_complete(&self, item: WorkItem, outcome: UploadOutcome) {
        let error = outcome.error().map(|e| e.to_string());
        self.calls.lock().unwrap().push((item, outcome.kind(), error));
    }
}

pub struct PanickingCallback;

#[async_trait]
impl CompletionCallback for PanickingCallback {
    async fn on_complete(&self, _item: WorkItem, _outcome: UploadOutcome) {
        panic!("callback exploded");
    }
}
