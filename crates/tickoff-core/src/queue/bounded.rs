//! Bounded in-memory job queue.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc::{self, error::TrySendError};

use super::CompletionJob;
use crate::error::QueueError;

/// Default number of buffered jobs.
pub const DEFAULT_CAPACITY: usize = 100;

/// Producer side of the completion queue.
///
/// Backed by a bounded `tokio::sync::mpsc` channel. The sender sits in an
/// `Option` so closing is a single `take()`: once taken, new producers get
/// `QueueError::Closed`, while a producer that was already suspended on a
/// full buffer still lands its job (consumers keep draining until the
/// buffer is empty).
pub struct JobQueue {
    sender: Mutex<Option<mpsc::Sender<CompletionJob>>>,
    capacity: usize,
}

/// Consumer side, shared by every pool consumer.
///
/// `mpsc::Receiver` is single-consumer, so the pool shares it behind an
/// async mutex; whoever holds the lock waits for the next job.
#[derive(Clone)]
pub struct JobReceiver {
    inner: Arc<tokio::sync::Mutex<mpsc::Receiver<CompletionJob>>>,
}

impl JobQueue {
    /// Create a queue holding at most `capacity` pending jobs.
    ///
    /// # Panics
    /// Panics if `capacity` is zero (same contract as `mpsc::channel`).
    /// `AutoCompleteConfig` rejects zero before it gets here.
    pub fn bounded(capacity: usize) -> (JobQueue, JobReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        let queue = JobQueue {
            sender: Mutex::new(Some(tx)),
            capacity,
        };
        let receiver = JobReceiver {
            inner: Arc::new(tokio::sync::Mutex::new(rx)),
        };
        (queue, receiver)
    }

    fn sender(&self) -> Result<mpsc::Sender<CompletionJob>, QueueError> {
        // ロックは clone の間だけ。send の await は跨がない
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(QueueError::Closed)
    }

    /// Buffer a job, suspending while the queue is full.
    pub async fn enqueue(&self, job: CompletionJob) -> Result<(), QueueError> {
        let sender = self.sender()?;
        sender.send(job).await.map_err(|_| QueueError::Closed)
    }

    /// Buffer a job without waiting; `QueueError::Full` at capacity.
    pub fn try_enqueue(&self, job: CompletionJob) -> Result<(), QueueError> {
        let sender = self.sender()?;
        sender.try_send(job).map_err(|err| match err {
            TrySendError::Full(_) => QueueError::Full(self.capacity),
            TrySendError::Closed(_) => QueueError::Closed,
        })
    }

    /// Stop accepting jobs. Returns `true` only for the call that closed it.
    pub fn close(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl JobReceiver {
    /// Next job, or `None` once the queue is closed and fully drained.
    pub(crate) async fn recv(&self) -> Option<CompletionJob> {
        let mut rx = self.inner.lock().await;
        rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TodoId;
    use std::time::Duration;
    use ulid::Ulid;

    fn job() -> CompletionJob {
        CompletionJob::new(TodoId::from_ulid(Ulid::new()))
    }

    #[tokio::test]
    async fn enqueue_then_recv() {
        let (queue, rx) = JobQueue::bounded(4);
        let j = job();
        queue.enqueue(j).await.unwrap();

        assert_eq!(rx.recv().await, Some(j));
    }

    #[tokio::test]
    async fn try_enqueue_rejects_when_full() {
        let (queue, _rx) = JobQueue::bounded(1);
        queue.try_enqueue(job()).unwrap();

        assert_eq!(queue.try_enqueue(job()), Err(QueueError::Full(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn enqueue_blocks_until_space_frees() {
        let (queue, rx) = JobQueue::bounded(1);
        let queue = Arc::new(queue);
        let first = job();
        let second = job();
        queue.enqueue(first).await.unwrap();

        let producer = tokio::spawn({
            let queue = Arc::clone(&queue);
            async move { queue.enqueue(second).await }
        });

        // 満杯なので producer は待たされる
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!producer.is_finished());

        assert_eq!(rx.recv().await, Some(first));
        producer.await.unwrap().unwrap();
        assert_eq!(rx.recv().await, Some(second));
    }

    #[tokio::test]
    async fn close_is_once_and_rejects_new_jobs() {
        let (queue, rx) = JobQueue::bounded(4);
        let buffered = job();
        queue.enqueue(buffered).await.unwrap();

        assert!(queue.close());
        assert!(!queue.close());
        assert!(queue.is_closed());
        assert_eq!(queue.enqueue(job()).await, Err(QueueError::Closed));
        assert_eq!(queue.try_enqueue(job()), Err(QueueError::Closed));

        // 閉じた後もバッファ済みのジョブは取り出せる
        assert_eq!(rx.recv().await, Some(buffered));
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn suspended_producer_still_lands_its_job_after_close() {
        let (queue, rx) = JobQueue::bounded(1);
        let queue = Arc::new(queue);
        let first = job();
        let second = job();
        queue.enqueue(first).await.unwrap();

        let producer = tokio::spawn({
            let queue = Arc::clone(&queue);
            async move { queue.enqueue(second).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        queue.close();

        assert_eq!(rx.recv().await, Some(first));
        producer.await.unwrap().unwrap();
        assert_eq!(rx.recv().await, Some(second));
        assert_eq!(rx.recv().await, None);
    }
}
