//! TodoStore port - todo の正本（source of truth）
//!
//! 本番ではリレーショナル DB が実装する想定。スキーマ・マイグレーション・
//! コネクションプールはこのクレートの外側の責務です。
//!
//! # 設計原則
//! - 同時アクセスに安全であること（任意数の completion 処理から呼ばれる）
//! - 同じ todo への競合書き込みの直列化はストア側に任せる
//! - `update` は upsert しない（削除済みなら `StoreError::NotFound`）

use async_trait::async_trait;

use crate::domain::{Todo, TodoId, TodoStatus, UserId};
use crate::error::StoreError;

/// Listing filter. `owner: None` means every owner (admin view).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoFilter {
    pub owner: Option<UserId>,
    pub status: Option<TodoStatus>,
    /// Rows to skip, newest first.
    pub offset: usize,
    pub limit: usize,
}

impl TodoFilter {
    pub fn matches(&self, todo: &Todo) -> bool {
        self.owner.is_none_or(|owner| todo.owner == owner)
            && self.status.is_none_or(|status| todo.status == status)
    }
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn create(&self, todo: &Todo) -> Result<(), StoreError>;

    /// `Ok(None)` when no todo has this id.
    async fn get_by_id(&self, id: TodoId) -> Result<Option<Todo>, StoreError>;

    async fn update(&self, todo: &Todo) -> Result<(), StoreError>;

    async fn delete(&self, id: TodoId) -> Result<(), StoreError>;

    /// One page of matching todos (newest first) plus the total match count.
    async fn list(&self, filter: &TodoFilter) -> Result<(Vec<Todo>, u64), StoreError>;
}
