//! Status - worker の観測用カウンタ

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::completion::CompletionOutcome;

/// Point-in-time snapshot of the auto-complete worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerCounts {
    /// Jobs accepted by the queue.
    pub enqueued: u64,
    /// Enqueue attempts refused (closed or full).
    pub rejected: u64,
    /// Jobs handed to a completion task.
    pub dispatched: u64,
    /// Completion tasks currently sleeping or talking to the store.
    pub in_flight: u64,
    pub completed: u64,
    pub already_completed: u64,
    pub not_found: u64,
    /// Fetch or persist failures (not retried).
    pub failed: u64,
}

#[derive(Debug, Default)]
pub(crate) struct WorkerCounters {
    enqueued: AtomicU64,
    rejected: AtomicU64,
    dispatched: AtomicU64,
    finished: AtomicU64,
    completed: AtomicU64,
    already_completed: AtomicU64,
    not_found: AtomicU64,
    failed: AtomicU64,
}

impl WorkerCounters {
    pub(crate) fn record_enqueued(&self) {
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_outcome(&self, outcome: CompletionOutcome) {
        let counter = match outcome {
            CompletionOutcome::Completed => &self.completed,
            CompletionOutcome::AlreadyCompleted => &self.already_completed,
            CompletionOutcome::NotFound => &self.not_found,
            CompletionOutcome::FetchFailed | CompletionOutcome::PersistFailed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.finished.fetch_add(1, Ordering::Release);
    }

    pub(crate) fn snapshot(&self) -> WorkerCounts {
        let finished = self.finished.load(Ordering::Acquire);
        let dispatched = self.dispatched.load(Ordering::Acquire);
        WorkerCounts {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            dispatched,
            in_flight: dispatched.saturating_sub(finished),
            completed: self.completed.load(Ordering::Relaxed),
            already_completed: self.already_completed.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}
