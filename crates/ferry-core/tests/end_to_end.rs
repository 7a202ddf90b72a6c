use std::fs;
use std::sync::Arc;
use std::time::Duration;

use ferry_core::{
    Dispatcher, DispatcherConfig, FailureDisposition, InMemoryTaskQueue, LifecycleState,
    LocalDirBackend, QueueBookkeeping, TaskQueue, WorkItem, scan,
};
use tempfile::TempDir;

async fn wait_until_settled(queue: &InMemoryTaskQueue) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while queue.outstanding() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("queue never settled");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn scanned_files_are_copied_to_the_destination() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    fs::create_dir_all(src.path().join("ks1/tbl")).unwrap();
    fs::create_dir_all(src.path().join("ks2/tbl")).unwrap();
    for i in 0..8 {
        fs::write(src.path().join(format!("ks1/tbl/nb-{i}-Data.db")), format!("ks1-{i}")).unwrap();
        fs::write(src.path().join(format!("ks2/tbl/nb-{i}-Data.db")), format!("ks2-{i}")).unwrap();
    }

    let queue = Arc::new(InMemoryTaskQueue::new());
    for item in scan::discover(src.path()).unwrap() {
        assert!(queue.add(item));
    }
    assert_eq!(queue.pending_count(), 16);

    let callback = Arc::new(QueueBookkeeping::new(queue.clone(), FailureDisposition::LogOnly));
    let handle = Dispatcher::new(
        queue.clone(),
        Arc::new(LocalDirBackend::new(dst.path())),
        callback,
        DispatcherConfig::new(3, Duration::from_millis(20)),
    )
    .unwrap()
    .start();

    wait_until_settled(&queue).await;
    let pool = handle.pool();
    let stats = handle.shutdown().await;

    assert_eq!(stats.submitted, 16);
    assert_eq!(stats.rejected, 0);
    assert_eq!(pool.stats().succeeded, 16);
    for i in 0..8 {
        let copied = fs::read_to_string(dst.path().join(format!("ks2/tbl/nb-{i}-Data.db"))).unwrap();
        assert_eq!(copied, format!("ks2-{i}"));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_uploads_are_released_and_do_not_stop_the_dispatcher() {
    let src = TempDir::new().unwrap();
    let dst = TempDir::new().unwrap();
    fs::write(src.path().join("present.db"), b"ok").unwrap();

    let queue = Arc::new(InMemoryTaskQueue::new());
    queue.add(WorkItem::new(src.path().join("present.db"), "present.db", 2));
    queue.add(WorkItem::new(src.path().join("vanished.db"), "vanished.db", 2));

    let callback = Arc::new(QueueBookkeeping::new(queue.clone(), FailureDisposition::LogOnly));
    let handle = Dispatcher::new(
        queue.clone(),
        Arc::new(LocalDirBackend::new(dst.path())),
        callback,
        DispatcherConfig::new(2, Duration::from_millis(20)),
    )
    .unwrap()
    .start();

    wait_until_settled(&queue).await;
    assert_eq!(handle.state(), LifecycleState::Running);

    // still polling: a new file added later is uploaded too
    fs::write(src.path().join("later.db"), b"later").unwrap();
    queue.add(WorkItem::new(src.path().join("later.db"), "later.db", 5));
    wait_until_settled(&queue).await;

    let mut lifecycle = handle.subscribe();
    let pool = handle.pool();
    handle.shutdown().await;
    assert_eq!(*lifecycle.borrow_and_update(), LifecycleState::Stopped);

    let uploads = pool.stats();
    assert_eq!((uploads.completed, uploads.succeeded, uploads.failed), (3, 2, 1));

    assert!(dst.path().join("present.db").exists());
    assert!(dst.path().join("later.db").exists());
    assert!(!dst.path().join("vanished.db").exists());
}
