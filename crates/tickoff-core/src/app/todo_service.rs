//! TodoService - todo の作成・一覧・更新・削除
//!
//! 作成直後に completion ジョブを enqueue する唯一の producer。
//! HTTP・JWT は外側の責務で、ここには認証済みの [`Viewer`] が渡される。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::auto_complete::AutoCompleteWorker;
use crate::domain::{NewTodo, Todo, TodoId, TodoPatch, TodoStatus, Viewer};
use crate::error::TodoError;
use crate::ports::{Clock, IdGenerator, SystemClock, TodoFilter, TodoStore, UlidGenerator};

pub const DEFAULT_PAGE_LIMIT: usize = 10;
pub const MAX_PAGE_LIMIT: usize = 100;

/// Listing parameters as they arrive from the caller (1-based page).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub status: Option<TodoStatus>,
}

impl ListQuery {
    /// `page < 1` becomes 1; `limit` outside `1..=100` becomes 10.
    fn normalized(&self) -> (usize, usize) {
        let page = self.page.filter(|p| *p >= 1).unwrap_or(1);
        let limit = self
            .limit
            .filter(|l| (1..=MAX_PAGE_LIMIT).contains(l))
            .unwrap_or(DEFAULT_PAGE_LIMIT);
        (page, limit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub limit: usize,
    pub total: u64,
    pub total_pages: u64,
}

pub struct TodoService {
    store: Arc<dyn TodoStore>,
    worker: Arc<AutoCompleteWorker>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl TodoService {
    pub fn new(store: Arc<dyn TodoStore>, worker: Arc<AutoCompleteWorker>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            store,
            worker,
            ids: Arc::new(UlidGenerator::new(Arc::clone(&clock))),
            clock,
        }
    }

    /// Use `clock` for timestamps and id generation.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.ids = Arc::new(UlidGenerator::new(Arc::clone(&clock)));
        self.clock = clock;
        self
    }

    /// Persist a new todo owned by `viewer`, then schedule its auto-completion.
    ///
    /// A closed queue (shutdown in progress) does not fail the creation.
    pub async fn create(&self, viewer: &Viewer, input: NewTodo) -> Result<Todo, TodoError> {
        input.validate()?;

        let todo = Todo::new(
            self.ids.generate_todo_id(),
            viewer.user_id,
            input,
            self.clock.now(),
        );
        self.store.create(&todo).await?;

        if todo.status.is_auto_completable() {
            if let Err(err) = self.worker.enqueue(todo.id).await {
                warn!(todo_id = %todo.id, error = %err, "auto-complete not scheduled");
            }
        } else {
            debug!(todo_id = %todo.id, "created already completed, not scheduling auto-complete");
        }

        Ok(todo)
    }

    /// Admins see every todo, users only their own. Newest first.
    pub async fn list(&self, viewer: &Viewer, query: ListQuery) -> Result<Page<Todo>, TodoError> {
        let (page, limit) = query.normalized();
        let filter = TodoFilter {
            owner: (!viewer.is_admin()).then_some(viewer.user_id),
            status: query.status,
            offset: (page - 1).saturating_mul(limit),
            limit,
        };

        let (items, total) = self.store.list(&filter).await?;
        Ok(Page {
            items,
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit as u64),
        })
    }

    /// Replace title, description and status. Owner only; a completed todo
    /// cannot be moved back to an open status.
    pub async fn update(
        &self,
        viewer: &Viewer,
        id: TodoId,
        patch: TodoPatch,
    ) -> Result<Todo, TodoError> {
        patch.validate()?;

        let mut todo = self.owned_todo(viewer, id).await?;
        todo.apply(patch, self.clock.now())?;
        self.store.update(&todo).await?;
        Ok(todo)
    }

    /// Owner only. A pending auto-complete job for this todo becomes a no-op.
    pub async fn delete(&self, viewer: &Viewer, id: TodoId) -> Result<(), TodoError> {
        self.owned_todo(viewer, id).await?;
        self.store.delete(id).await?;
        Ok(())
    }

    async fn owned_todo(&self, viewer: &Viewer, id: TodoId) -> Result<Todo, TodoError> {
        let todo = self
            .store
            .get_by_id(id)
            .await?
            .ok_or(TodoError::NotFound(id))?;
        if todo.owner != viewer.user_id {
            return Err(TodoError::Forbidden);
        }
        Ok(todo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use crate::impls::InMemoryTodoStore;
    use crate::ports::FixedClock;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use rstest::rstest;
    use std::time::Duration;
    use ulid::Ulid;

    struct Fixture {
        store: Arc<InMemoryTodoStore>,
        worker: Arc<AutoCompleteWorker>,
        clock: Arc<FixedClock>,
        service: TodoService,
    }

    fn fixture(delay: Duration) -> Fixture {
        let store = Arc::new(InMemoryTodoStore::new());
        let worker = Arc::new(AutoCompleteWorker::new(store.clone(), delay));
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        ));
        let service =
            TodoService::new(store.clone(), Arc::clone(&worker)).with_clock(clock.clone());
        Fixture {
            store,
            worker,
            clock,
            service,
        }
    }

    const ALICE: Viewer = Viewer {
        user_id: UserId::new(1),
        role: crate::domain::Role::User,
    };
    const BOB: Viewer = Viewer {
        user_id: UserId::new(2),
        role: crate::domain::Role::User,
    };

    #[tokio::test(start_paused = true)]
    async fn created_todo_is_auto_completed() {
        let fx = fixture(Duration::from_secs(600));
        fx.worker.start(2).unwrap();

        let todo = fx
            .service
            .create(&ALICE, NewTodo::new("file taxes"))
            .await
            .unwrap();
        assert_eq!(todo.status, TodoStatus::Pending);
        assert_eq!(todo.owner, ALICE.user_id);
        assert_eq!(fx.worker.counts().enqueued, 1);

        tokio::time::sleep(Duration::from_secs(601)).await;
        let stored = fx.store.get_by_id(todo.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TodoStatus::Completed);

        fx.worker.stop().await;
    }

    #[tokio::test]
    async fn completed_todo_is_not_scheduled() {
        let fx = fixture(Duration::ZERO);

        fx.service
            .create(
                &ALICE,
                NewTodo::new("already done").with_status(TodoStatus::Completed),
            )
            .await
            .unwrap();

        assert_eq!(fx.worker.counts().enqueued, 0);
    }

    #[tokio::test]
    async fn creation_survives_a_closed_queue() {
        let fx = fixture(Duration::ZERO);
        fx.worker.stop().await;

        let todo = fx
            .service
            .create(&ALICE, NewTodo::new("late todo"))
            .await
            .unwrap();

        assert!(fx.store.get_by_id(todo.id).await.unwrap().is_some());
        assert_eq!(fx.worker.counts().rejected, 1);
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_persisting() {
        let fx = fixture(Duration::ZERO);

        let err = fx.service.create(&ALICE, NewTodo::new("  ")).await.unwrap_err();

        assert!(matches!(err, TodoError::Validation(_)));
        assert!(fx.store.is_empty().await);
    }

    #[tokio::test]
    async fn only_the_owner_can_update_or_delete() {
        let fx = fixture(Duration::ZERO);
        let todo = fx
            .service
            .create(&ALICE, NewTodo::new("mine"))
            .await
            .unwrap();
        let patch = TodoPatch {
            title: "hijacked".to_string(),
            description: String::new(),
            status: TodoStatus::InProgress,
        };

        assert!(matches!(
            fx.service.update(&BOB, todo.id, patch.clone()).await,
            Err(TodoError::Forbidden)
        ));
        assert!(matches!(
            fx.service.delete(&BOB, todo.id).await,
            Err(TodoError::Forbidden)
        ));

        fx.clock.advance(ChronoDuration::minutes(1));
        let updated = fx.service.update(&ALICE, todo.id, patch).await.unwrap();
        assert_eq!(updated.title, "hijacked");
        assert_eq!(updated.status, TodoStatus::InProgress);
        assert_eq!(updated.updated_at, todo.created_at + ChronoDuration::minutes(1));

        fx.service.delete(&ALICE, todo.id).await.unwrap();
        assert!(matches!(
            fx.service.delete(&ALICE, todo.id).await,
            Err(TodoError::NotFound(id)) if id == todo.id
        ));
    }

    #[tokio::test]
    async fn missing_todo_is_not_found() {
        let fx = fixture(Duration::ZERO);
        let id = TodoId::from_ulid(Ulid::new());

        assert!(matches!(
            fx.service.delete(&ALICE, id).await,
            Err(TodoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn users_see_their_own_todos_and_admins_see_all() {
        let fx = fixture(Duration::ZERO);
        for i in 0..3 {
            fx.clock.advance(ChronoDuration::seconds(1));
            fx.service
                .create(&ALICE, NewTodo::new(format!("alice {i}")))
                .await
                .unwrap();
        }
        fx.clock.advance(ChronoDuration::seconds(1));
        fx.service
            .create(
                &BOB,
                NewTodo::new("bob").with_status(TodoStatus::Completed),
            )
            .await
            .unwrap();

        let page = fx.service.list(&ALICE, ListQuery::default()).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items[0].title, "alice 2");

        let admin = Viewer::admin(UserId::new(99));
        let page = fx.service.list(&admin, ListQuery::default()).await.unwrap();
        assert_eq!(page.total, 4);
        assert_eq!(page.items[0].title, "bob");

        let page = fx
            .service
            .list(
                &admin,
                ListQuery {
                    status: Some(TodoStatus::Completed),
                    ..ListQuery::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[rstest]
    #[case(None, None, 1, 10)]
    #[case(Some(0), Some(0), 1, 10)]
    #[case(Some(3), Some(101), 3, 10)]
    #[case(Some(2), Some(100), 2, 100)]
    fn list_query_is_normalized(
        #[case] page: Option<usize>,
        #[case] limit: Option<usize>,
        #[case] want_page: usize,
        #[case] want_limit: usize,
    ) {
        let query = ListQuery {
            page,
            limit,
            status: None,
        };
        assert_eq!(query.normalized(), (want_page, want_limit));
    }

    #[tokio::test]
    async fn pagination_reports_total_pages() {
        let fx = fixture(Duration::ZERO);
        for i in 0..5 {
            fx.clock.advance(ChronoDuration::seconds(1));
            fx.service
                .create(&ALICE, NewTodo::new(format!("t{i}")))
                .await
                .unwrap();
        }

        let query = ListQuery {
            page: Some(3),
            limit: Some(2),
            status: None,
        };
        let page = fx.service.list(&ALICE, query).await.unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].title, "t0");
    }

    #[tokio::test(start_paused = true)]
    async fn auto_completed_todo_cannot_be_reopened() {
        let fx = fixture(Duration::from_secs(10));
        fx.worker.start(1).unwrap();
        let todo = fx
            .service
            .create(&ALICE, NewTodo::new("ship it"))
            .await
            .unwrap();
        fx.worker.stop().await;

        let reopen = TodoPatch {
            title: "ship it".to_string(),
            description: String::new(),
            status: TodoStatus::Pending,
        };
        let err = fx.service.update(&ALICE, todo.id, reopen).await.unwrap_err();

        assert!(matches!(err, TodoError::Validation(_)));
        let stored = fx.store.get_by_id(todo.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TodoStatus::Completed);
        assert_eq!(fx.store.update_calls(todo.id).await, 1);
    }
}
