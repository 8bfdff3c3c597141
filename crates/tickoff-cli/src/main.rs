use std::error::Error;
use std::future::Future;
use std::sync::Arc;

use tickoff_core::domain::{NewTodo, TodoStatus, UserId, Viewer};
use tickoff_core::impls::InMemoryTodoStore;
use tickoff_core::{AutoCompleteConfig, AutoCompleteWorker, TodoService, observability};
use tracing::info;

const DEMO_VIEWER: Viewer = Viewer::user(UserId::new(1));

/// demo：設定 → store → worker → service をつなぎ、ctrl-c で graceful shutdown
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    observability::init();

    // (A) 設定と store を用意（本番は DB 実装に差し替える）
    let config = AutoCompleteConfig::from_env()?;
    let store = Arc::new(InMemoryTodoStore::new());

    // (B) worker を起動
    let worker = Arc::new(AutoCompleteWorker::from_config(store.clone(), &config)?);
    worker.start(config.worker_count)?;

    let service = TodoService::new(store.clone(), Arc::clone(&worker));

    // (C) デモ本体 → (D) graceful shutdown
    // 途中で失敗しても stop は必ず通す（待機中のジョブもすべて終わるまで待つ）
    let result = with_graceful_stop(&worker, run(&service, &config)).await;
    println!("{}", serde_json::to_string_pretty(&worker.counts())?);
    result?;

    let page = service.list(&DEMO_VIEWER, Default::default()).await?;
    for todo in &page.items {
        info!(todo_id = %todo.id, status = %todo.status, title = %todo.title, "final state");
    }

    Ok(())
}

/// `body` の成否にかかわらず worker を stop してから結果を返す
async fn with_graceful_stop<T, F>(worker: &AutoCompleteWorker, body: F) -> Result<T, Box<dyn Error>>
where
    F: Future<Output = Result<T, Box<dyn Error>>>,
{
    let result = body.await;
    worker.stop().await;
    result
}

/// デモ用の todo を投入して ctrl-c を待つ
async fn run(service: &TodoService, config: &AutoCompleteConfig) -> Result<(), Box<dyn Error>> {
    let seeds = [
        NewTodo::new("write the weekly report"),
        NewTodo::new("review pull requests").with_status(TodoStatus::InProgress),
        NewTodo::new("book flights").with_status(TodoStatus::Completed),
    ];
    for input in seeds {
        let todo = service.create(&DEMO_VIEWER, input).await?;
        info!(todo_id = %todo.id, status = %todo.status, title = %todo.title, "created todo");
    }

    info!(
        delay_secs = config.delay.as_secs(),
        "waiting for ctrl-c (auto-complete keeps running)"
    );
    tokio::signal::ctrl_c().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tickoff_core::ports::TodoStore;

    #[tokio::test(start_paused = true)]
    async fn failed_demo_still_drains_scheduled_jobs() {
        let store = Arc::new(InMemoryTodoStore::new());
        let worker = Arc::new(AutoCompleteWorker::new(store.clone(), Duration::from_secs(60)));
        worker.start(1).unwrap();
        let service = TodoService::new(store.clone(), Arc::clone(&worker));

        let result: Result<(), _> = with_graceful_stop(&worker, async {
            service
                .create(&DEMO_VIEWER, NewTodo::new("scheduled then aborted"))
                .await?;
            Err::<(), Box<dyn Error>>("signal handler unavailable".into())
        })
        .await;

        assert!(result.is_err());
        assert!(!worker.is_running());
        let counts = worker.counts();
        assert_eq!(counts.completed, 1);
        assert_eq!(counts.in_flight, 0);

        let page = service.list(&DEMO_VIEWER, Default::default()).await.unwrap();
        let stored = store.get_by_id(page.items[0].id).await.unwrap().unwrap();
        assert_eq!(stored.status, TodoStatus::Completed);
    }
}
