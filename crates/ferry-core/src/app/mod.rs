//! App - アプリケーション層
//!
//! ports を組み合わせてディスパッチの本体を実装します。
//!
//! # 主要コンポーネント
//! - **Dispatcher**: キューを監視し、item ごとに UploadTask を pool に投入するループ
//! - **WorkerPool**: 固定数のワーカーと上限なしの backlog
//! - **UploadTask**: item + backend + callback をまとめた 1 回きりの作業単位

pub mod dispatcher;
pub mod lifecycle;
pub mod pool;
pub mod upload_task;

pub use self::dispatcher::{Dispatcher, DispatcherHandle};
pub use self::lifecycle::LifecycleState;
pub use self::pool::WorkerPool;
pub use self::upload_task::UploadTask;
