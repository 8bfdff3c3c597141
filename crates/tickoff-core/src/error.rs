use thiserror::Error;

use crate::domain::TodoId;

/// Errors from the completion job queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// Shutdown has begun; the queue no longer accepts jobs.
    #[error("job queue is closed")]
    Closed,

    /// Returned by `try_enqueue` when every slot is taken.
    #[error("job queue is full (capacity={0})")]
    Full(usize),
}

/// Errors reported by a [`TodoStore`](crate::ports::TodoStore) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("todo not found: {0}")]
    NotFound(TodoId),

    /// Infrastructure failure (connection lost, timeout, ...).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by the todo management service.
#[derive(Debug, Error)]
pub enum TodoError {
    #[error("invalid status {0:?}: must be 'pending', 'in_progress', or 'completed'")]
    InvalidStatus(String),

    #[error("invalid role {0:?}: must be 'user' or 'admin'")]
    InvalidRole(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("todo not found: {0}")]
    NotFound(TodoId),

    #[error("you are not allowed to modify this todo")]
    Forbidden,

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for TodoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => TodoError::NotFound(id),
            other => TodoError::Store(other),
        }
    }
}

/// Lifecycle errors of the auto-complete worker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    #[error("worker pool is already running")]
    AlreadyStarted,

    #[error("worker pool has been stopped")]
    Stopped,

    #[error("worker count must be at least 1 (got {0})")]
    InvalidWorkerCount(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} must be at least 1 (got {value})")]
    OutOfRange { key: &'static str, value: usize },
}
