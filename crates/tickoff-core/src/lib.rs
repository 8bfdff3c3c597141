//! tickoff-core
//!
//! Todo backend core: domain model, the store port, and the deferred
//! auto-completion worker that marks todos completed a fixed delay after
//! creation unless the owner finished them first.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, todo, user）
//! - **ports**: 抽象化レイヤー（TodoStore, Clock, IdGenerator）
//! - **impls**: 実装（InMemoryTodoStore）
//! - **queue**: completion ジョブの bounded キュー
//! - **app**: AutoCompleteWorker, WorkerPool, CompletionProcessor, TodoService
//! - **config**: 環境変数からの設定
//! - **observability**: tracing の初期化
//! - **error**: エラー型

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod queue;

pub use app::{AutoCompleteWorker, CompletionOutcome, TodoService, WorkerCounts};
pub use config::AutoCompleteConfig;
pub use error::{ConfigError, QueueError, StoreError, TodoError, WorkerError};
