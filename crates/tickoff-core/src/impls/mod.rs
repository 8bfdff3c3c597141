//! Impls - ports の実装（開発用・テスト用）
//!
//! # 含まれる実装
//! - **InMemoryTodoStore**: メモリ上の TodoStore
//!
//! 本番用の DB 実装はこのクレートの外側に置きます。

pub mod inmem_todo_store;

pub use self::inmem_todo_store::InMemoryTodoStore;
