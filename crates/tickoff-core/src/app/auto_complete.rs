//! AutoCompleteWorker - 自動完了サブシステムのライフサイクル
//!
//! プロセスに 1 つだけ作る。外から使うのは `start` / `enqueue` / `stop` のみ。
//!
//! # 使用例
//! ```ignore
//! let worker = Arc::new(AutoCompleteWorker::from_config(store.clone(), &config)?);
//! worker.start(config.worker_count)?;
//! // ... todo 作成直後に
//! worker.enqueue(todo.id).await?;
//! // ... graceful shutdown で
//! worker.stop().await;
//! ```

use std::mem;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{info, warn};

use super::completion::CompletionProcessor;
use super::status::{WorkerCounters, WorkerCounts};
use super::worker_pool::{DEFAULT_MAX_IN_FLIGHT, WorkerPool};
use crate::config::{AutoCompleteConfig, MAX_IN_FLIGHT_KEY, QUEUE_CAPACITY_KEY};
use crate::domain::TodoId;
use crate::error::{ConfigError, QueueError, WorkerError};
use crate::ports::TodoStore;
use crate::queue::{CompletionJob, DEFAULT_CAPACITY, JobQueue, JobReceiver};

enum Lifecycle {
    /// Created; jobs may already be buffered.
    Idle(JobReceiver),
    Running(Arc<WorkerPool>),
    Stopped,
}

pub struct AutoCompleteWorker {
    queue: JobQueue,
    processor: Arc<CompletionProcessor>,
    max_in_flight: usize,
    lifecycle: Mutex<Lifecycle>,
    counters: Arc<WorkerCounters>,
}

impl AutoCompleteWorker {
    /// Worker with the given completion delay and default limits.
    pub fn new(store: Arc<dyn TodoStore>, delay: Duration) -> Self {
        Self::assemble(
            CompletionProcessor::new(store, delay),
            DEFAULT_CAPACITY,
            DEFAULT_MAX_IN_FLIGHT,
        )
    }

    /// Fails with `ConfigError::OutOfRange` when a count in `config` is zero.
    pub fn from_config(
        store: Arc<dyn TodoStore>,
        config: &AutoCompleteConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::assemble(
            CompletionProcessor::new(store, config.delay),
            config.queue_capacity,
            config.max_in_flight,
        ))
    }

    /// Worker around a pre-built processor (e.g. one with a custom clock).
    ///
    /// `capacity` and `max_in_flight` must be at least 1: a zero-capacity
    /// channel cannot be built, and a zero ceiling would park every consumer
    /// before its first dequeue so `stop` could never drain.
    pub fn with_processor(
        processor: CompletionProcessor,
        capacity: usize,
        max_in_flight: usize,
    ) -> Result<Self, ConfigError> {
        for (key, value) in [
            (QUEUE_CAPACITY_KEY, capacity),
            (MAX_IN_FLIGHT_KEY, max_in_flight),
        ] {
            if value == 0 {
                return Err(ConfigError::OutOfRange { key, value });
            }
        }
        Ok(Self::assemble(processor, capacity, max_in_flight))
    }

    fn assemble(processor: CompletionProcessor, capacity: usize, max_in_flight: usize) -> Self {
        let (queue, receiver) = JobQueue::bounded(capacity);
        Self {
            queue,
            processor: Arc::new(processor),
            max_in_flight,
            lifecycle: Mutex::new(Lifecycle::Idle(receiver)),
            counters: Arc::new(WorkerCounters::default()),
        }
    }

    pub fn delay(&self) -> Duration {
        self.processor.delay()
    }

    /// Spawn `worker_count` queue consumers.
    pub fn start(&self, worker_count: usize) -> Result<(), WorkerError> {
        if worker_count == 0 {
            return Err(WorkerError::InvalidWorkerCount(worker_count));
        }
        if self.queue.is_closed() {
            return Err(WorkerError::Stopped);
        }

        let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        let receiver = match mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Idle(receiver) => receiver,
            running @ Lifecycle::Running(_) => {
                *lifecycle = running;
                return Err(WorkerError::AlreadyStarted);
            }
            Lifecycle::Stopped => return Err(WorkerError::Stopped),
        };

        let pool = WorkerPool::spawn(
            worker_count,
            receiver,
            Arc::clone(&self.processor),
            self.max_in_flight,
            Arc::clone(&self.counters),
        );
        let consumers = pool.consumers();
        *lifecycle = Lifecycle::Running(Arc::new(pool));

        info!(
            workers = consumers,
            delay_secs = self.processor.delay().as_secs_f64(),
            capacity = self.queue.capacity(),
            max_in_flight = self.max_in_flight,
            "auto-complete worker started"
        );
        Ok(())
    }

    /// Schedule `todo_id` for auto-completion after the configured delay.
    ///
    /// Suspends while the queue is full. Fails with `QueueError::Closed` once
    /// `stop` has been called.
    pub async fn enqueue(&self, todo_id: TodoId) -> Result<(), QueueError> {
        let result = self.queue.enqueue(CompletionJob::new(todo_id)).await;
        self.record_enqueue(&result);
        result
    }

    /// Like [`enqueue`](Self::enqueue) but rejects with `QueueError::Full`
    /// instead of waiting.
    pub fn try_enqueue(&self, todo_id: TodoId) -> Result<(), QueueError> {
        let result = self.queue.try_enqueue(CompletionJob::new(todo_id));
        self.record_enqueue(&result);
        result
    }

    fn record_enqueue(&self, result: &Result<(), QueueError>) {
        match result {
            Ok(()) => self.counters.record_enqueued(),
            Err(_) => self.counters.record_rejected(),
        }
    }

    /// Close the queue and wait until every consumer has exited and every
    /// dispatched job has finished.
    ///
    /// Repeated or concurrent calls are safe; each returns after the drain.
    pub async fn stop(&self) {
        if self.queue.close() {
            info!("auto-complete worker stopping, draining in-flight jobs");
        }

        let pool = {
            let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
            if matches!(*lifecycle, Lifecycle::Idle(_)) {
                // start されていない: バッファ済みのジョブは捨てられる
                let dropped = self.counters.snapshot().enqueued;
                if dropped > 0 {
                    warn!(dropped, "auto-complete worker stopped before start, dropping queued jobs");
                }
                *lifecycle = Lifecycle::Stopped;
            }
            match &*lifecycle {
                Lifecycle::Running(pool) => Some(Arc::clone(pool)),
                Lifecycle::Idle(_) | Lifecycle::Stopped => None,
            }
        };

        if let Some(pool) = pool {
            pool.shutdown().await;
            info!(counts = ?self.counts(), "auto-complete worker stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        !self.queue.is_closed()
            && matches!(
                *self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner),
                Lifecycle::Running(_)
            )
    }

    pub fn counts(&self) -> WorkerCounts {
        self.counters.snapshot()
    }
}
