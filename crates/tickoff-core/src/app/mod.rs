//! App - アプリケーション層
//!
//! ports を組み合わせて自動完了サブシステムと todo 管理を実装します。
//!
//! # 主要コンポーネント
//! - **AutoCompleteWorker**: ライフサイクル（start / enqueue / stop）
//! - **WorkerPool**: キューの consumer 群（dispatch のみ、待機しない）
//! - **CompletionProcessor**: delay → 再取得 → 条件付き completed
//! - **TodoService**: todo の CRUD。作成直後に enqueue する
//! - **Status**: 観測用カウンタ

pub mod auto_complete;
pub mod completion;
pub mod status;
pub mod todo_service;
pub mod worker_pool;

pub use self::auto_complete::AutoCompleteWorker;
pub use self::completion::{CompletionOutcome, CompletionProcessor};
pub use self::status::WorkerCounts;
pub use self::todo_service::{ListQuery, Page, TodoService};
