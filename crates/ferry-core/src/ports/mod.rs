//! Ports - 抽象化レイヤー
//!
//! ディスパッチャが外部と接する境界を trait で定義します。
//! コアはこれらの契約だけに依存し、実装の詳細（キューの内部構造、
//! アップロード先の仕組み、完了後の帳簿付け）は知りません。
//!
//! # 含まれる port
//! - **TaskQueue**: アップロード待ちのファイルを保持するキュー
//! - **StorageBackend**: リモートストレージへのアップロード
//! - **CompletionCallback**: 完了（成功/失敗）の通知先

pub mod callback;
pub mod storage;
pub mod task_queue;

pub use self::callback::CompletionCallback;
pub use self::storage::StorageBackend;
pub use self::task_queue::TaskQueue;
