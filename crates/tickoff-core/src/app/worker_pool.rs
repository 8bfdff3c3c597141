use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::{debug, trace};

use super::completion::CompletionProcessor;
use super::status::WorkerCounters;
use crate::queue::JobReceiver;

/// Default ceiling on concurrently running completion tasks.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 1024;

/// Pool of queue consumers.
///
/// - 各 consumer は job を 1 件取り出して completion タスクを spawn するだけ
///   （delay の待機は consumer 上では行わない）
/// - consumer と completion タスクはどちらも同じ `TaskTracker` に載る
/// - `shutdown()` はキューが閉じている前提で、全 consumer の終了と
///   全 completion タスクの完了を待つ
///
/// Fan-out is capped by `max_in_flight`: a consumer takes a permit before it
/// dequeues, so at the ceiling consumers stop pulling, the queue fills up
/// and producers see backpressure. Below the ceiling dispatch never waits on
/// a running job.
pub(crate) struct WorkerPool {
    tracker: TaskTracker,
    consumers: usize,
}

impl WorkerPool {
    /// Spawn `n` consumers on `receiver`.
    pub(crate) fn spawn(
        n: usize,
        receiver: JobReceiver,
        processor: Arc<CompletionProcessor>,
        max_in_flight: usize,
        counters: Arc<WorkerCounters>,
    ) -> Self {
        let tracker = TaskTracker::new();
        let in_flight = Arc::new(Semaphore::new(max_in_flight));

        for worker_id in 0..n {
            tracker.spawn(consumer_loop(
                worker_id,
                receiver.clone(),
                Arc::clone(&processor),
                Arc::clone(&in_flight),
                tracker.clone(),
                Arc::clone(&counters),
            ));
        }

        Self {
            tracker,
            consumers: n,
        }
    }

    pub(crate) fn consumers(&self) -> usize {
        self.consumers
    }

    /// Wait for consumers to see the closed queue and for every dispatched
    /// completion task to finish. Safe to call from several tasks at once;
    /// each caller returns once the pool is drained.
    pub(crate) async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

async fn consumer_loop(
    worker_id: usize,
    receiver: JobReceiver,
    processor: Arc<CompletionProcessor>,
    in_flight: Arc<Semaphore>,
    tracker: TaskTracker,
    counters: Arc<WorkerCounters>,
) {
    debug!(worker_id, "consumer started");

    loop {
        // 上限に達していたら dequeue しない（キュー側に backpressure が伝わる）
        let Ok(permit) = Arc::clone(&in_flight).acquire_owned().await else {
            break;
        };

        // None = キューが閉じられ、バッファも空
        let Some(job) = receiver.recv().await else {
            break;
        };

        trace!(worker_id, %job, "dispatching completion job");
        counters.record_dispatched();

        let processor = Arc::clone(&processor);
        let counters = Arc::clone(&counters);
        tracker.spawn(async move {
            let outcome = processor.process(job).await;
            counters.record_outcome(outcome);
            drop(permit);
        });
    }

    debug!(worker_id, "consumer stopped");
}
