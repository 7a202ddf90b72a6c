//! Impls - port の実装
//!
//! # 含まれる実装
//! - **InMemoryTaskQueue**: プロセス内のアップロード待ちキュー
//! - **LocalDirBackend**: ローカルディレクトリへのコピー（開発・テスト用）
//! - **QueueBookkeeping**: デフォルトの完了後処理

pub mod bookkeeping;
pub mod inmem_queue;
pub mod local_storage;

pub use self::bookkeeping::{FailureDisposition, QueueBookkeeping};
pub use self::inmem_queue::InMemoryTaskQueue;
pub use self::local_storage::LocalDirBackend;
