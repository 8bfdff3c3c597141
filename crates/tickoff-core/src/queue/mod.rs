//! Completion job queue.
//!
//! The queue carries todo ids only. Status and every other field are re-read
//! from the store when the job fires, so a job never acts on a stale snapshot.

mod bounded;

pub use bounded::{DEFAULT_CAPACITY, JobQueue, JobReceiver};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::TodoId;

/// A scheduled request to re-check (and maybe auto-complete) one todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompletionJob {
    todo_id: TodoId,
}

impl CompletionJob {
    pub fn new(todo_id: TodoId) -> Self {
        Self { todo_id }
    }

    pub fn todo_id(&self) -> TodoId {
        self.todo_id
    }
}

impl From<TodoId> for CompletionJob {
    fn from(todo_id: TodoId) -> Self {
        Self::new(todo_id)
    }
}

impl fmt::Display for CompletionJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "complete({})", self.todo_id)
    }
}
