//! InMemoryTodoStore - 開発用・テスト用の TodoStore
//!
//! # 実装詳細
//! - `tokio::sync::Mutex<HashMap<TodoId, Todo>>` で排他制御
//! - ロックは各メソッド内で完結（await を跨がない）
//! - `update` の呼び出し回数を todo ごとに記録（no-op 検証用）
//! - `fail_gets` / `fail_updates` でインフラ障害を再現できる

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{Todo, TodoId};
use crate::error::StoreError;
use crate::ports::{TodoFilter, TodoStore};

#[derive(Default)]
struct StoreState {
    todos: HashMap<TodoId, Todo>,
    update_calls: HashMap<TodoId, usize>,
}

#[derive(Default)]
pub struct InMemoryTodoStore {
    state: Mutex<StoreState>,
    fail_gets: AtomicBool,
    fail_updates: AtomicBool,
}

impl InMemoryTodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `get_by_id` fail with `StoreError::Unavailable`.
    pub fn fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `update` fail with `StoreError::Unavailable`.
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    /// Number of `update` calls received for `id`, successful or not.
    pub async fn update_calls(&self, id: TodoId) -> usize {
        let state = self.state.lock().await;
        state.update_calls.get(&id).copied().unwrap_or(0)
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.todos.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TodoStore for InMemoryTodoStore {
    async fn create(&self, todo: &Todo) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.todos.insert(todo.id, todo.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: TodoId) -> Result<Option<Todo>, StoreError> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected get failure".to_string()));
        }
        let state = self.state.lock().await;
        Ok(state.todos.get(&id).cloned())
    }

    async fn update(&self, todo: &Todo) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        *state.update_calls.entry(todo.id).or_default() += 1;

        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected update failure".to_string()));
        }

        // upsert しない: 削除済みの todo を復活させない
        let Some(slot) = state.todos.get_mut(&todo.id) else {
            return Err(StoreError::NotFound(todo.id));
        };
        *slot = todo.clone();
        Ok(())
    }

    async fn delete(&self, id: TodoId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state
            .todos
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }

    async fn list(&self, filter: &TodoFilter) -> Result<(Vec<Todo>, u64), StoreError> {
        let state = self.state.lock().await;
        let mut matching: Vec<&Todo> = state.todos.values().filter(|t| filter.matches(t)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let limit = if filter.limit == 0 { usize::MAX } else { filter.limit };
        let page = matching
            .into_iter()
            .skip(filter.offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((page, total))
    }
}
