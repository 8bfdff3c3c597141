//! CompletionProcessor - 遅延後に todo を自動完了する
//!
//! # フロー
//! 1. 設定された delay だけ待つ（意図的な待機はここだけ）
//! 2. TodoStore から最新の状態を取り直す
//! 3. 取得失敗 / 見つからない → ログを残して終了
//! 4. pending / in_progress → completed にして update
//! 5. すでに completed → 何もしない（書き込みもしない）
//! 6. update 失敗 → ログを残して終了（リトライなし）
//!
//! ジョブは enqueue 時の状態を持たないので、待機中にユーザーが更新・完了・
//! 削除しても、常に発火時点の状態で判断します。

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::error::StoreError;
use crate::ports::{Clock, SystemClock, TodoStore};
use crate::queue::CompletionJob;

/// What one completion invocation ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Status moved to completed and was persisted.
    Completed,
    /// The owner finished it first; nothing was written.
    AlreadyCompleted,
    /// The todo was deleted before the job fired.
    NotFound,
    FetchFailed,
    PersistFailed,
}

pub struct CompletionProcessor {
    store: Arc<dyn TodoStore>,
    clock: Arc<dyn Clock>,
    delay: Duration,
}

impl CompletionProcessor {
    pub fn new(store: Arc<dyn TodoStore>, delay: Duration) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            delay,
        }
    }

    /// Clock used for the `updated_at` stamp of auto-completed todos.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait out the delay, then re-check and maybe complete the todo.
    pub async fn process(&self, job: CompletionJob) -> CompletionOutcome {
        tokio::time::sleep(self.delay).await;
        self.complete_now(job).await
    }

    /// The check-then-act half of [`process`](Self::process), without the delay.
    pub async fn complete_now(&self, job: CompletionJob) -> CompletionOutcome {
        let todo_id = job.todo_id();

        let mut todo = match self.store.get_by_id(todo_id).await {
            Ok(Some(todo)) => todo,
            Ok(None) => {
                // 削除済みは正常系。エスカレーションしない
                debug!(%todo_id, "todo no longer exists, skipping auto-complete");
                return CompletionOutcome::NotFound;
            }
            Err(err) => {
                warn!(%todo_id, error = %err, "failed to load todo for auto-complete");
                return CompletionOutcome::FetchFailed;
            }
        };

        if !todo.auto_complete(self.clock.now()) {
            debug!(%todo_id, status = %todo.status, "todo already completed, nothing to do");
            return CompletionOutcome::AlreadyCompleted;
        }

        match self.store.update(&todo).await {
            Ok(()) => {
                info!(%todo_id, "todo auto-completed");
                CompletionOutcome::Completed
            }
            Err(StoreError::NotFound(_)) => {
                // fetch と update の間に削除された
                debug!(%todo_id, "todo deleted before auto-complete was persisted");
                CompletionOutcome::NotFound
            }
            Err(err) => {
                error!(%todo_id, error = %err, "failed to auto-complete todo");
                CompletionOutcome::PersistFailed
            }
        }
    }
}
