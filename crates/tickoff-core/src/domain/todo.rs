//! Todo entity and its status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{TodoId, UserId};
use crate::error::TodoError;

/// Todo status (closed set).
///
/// Auto-completion transitions:
/// - Pending -> Completed
/// - InProgress -> Completed
/// - Completed は終端。auto-complete でも明示的な update でも戻らない
///
/// Explicit updates may move between pending and in_progress, or to completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TodoStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TodoStatus::Pending => "pending",
            TodoStatus::InProgress => "in_progress",
            TodoStatus::Completed => "completed",
        }
    }

    /// Is this todo eligible for the deferred auto-completion?
    pub fn is_auto_completable(self) -> bool {
        matches!(self, TodoStatus::Pending | TodoStatus::InProgress)
    }

    pub fn is_completed(self) -> bool {
        self == TodoStatus::Completed
    }
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TodoStatus {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TodoStatus::Pending),
            "in_progress" => Ok(TodoStatus::InProgress),
            "completed" => Ok(TodoStatus::Completed),
            other => Err(TodoError::InvalidStatus(other.to_string())),
        }
    }
}

/// A persisted todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub description: String,
    pub status: TodoStatus,
    pub owner: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Build a fresh todo from validated input.
    pub fn new(id: TodoId, owner: UserId, input: NewTodo, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: input.title,
            description: input.description,
            status: input.status.unwrap_or_default(),
            owner,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark this todo completed if it is still pending or in progress.
    ///
    /// Returns `false` (and leaves the todo untouched) when it is already
    /// completed, so callers can skip the write entirely.
    pub fn auto_complete(&mut self, now: DateTime<Utc>) -> bool {
        if !self.status.is_auto_completable() {
            return false;
        }
        self.status = TodoStatus::Completed;
        self.updated_at = now;
        true
    }

    /// Replace the user-editable fields.
    ///
    /// A completed todo stays completed: moving it back to pending or
    /// in_progress is a `TodoError::Validation` and leaves it untouched.
    pub fn apply(&mut self, patch: TodoPatch, now: DateTime<Utc>) -> Result<(), TodoError> {
        if self.status.is_completed() && !patch.status.is_completed() {
            return Err(TodoError::Validation(format!(
                "a completed todo cannot move back to {}",
                patch.status
            )));
        }
        self.title = patch.title;
        self.description = patch.description;
        self.status = patch.status;
        self.updated_at = now;
        Ok(())
    }
}

/// Input for creating a todo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to `pending` when omitted.
    #[serde(default)]
    pub status: Option<TodoStatus>,
}

impl NewTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_status(mut self, status: TodoStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn validate(&self) -> Result<(), TodoError> {
        validate_title(&self.title)
    }
}

/// Full replacement of the user-editable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoPatch {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TodoStatus,
}

impl TodoPatch {
    pub fn validate(&self) -> Result<(), TodoError> {
        validate_title(&self.title)
    }
}

const MAX_TITLE_LEN: usize = 255;

fn validate_title(title: &str) -> Result<(), TodoError> {
    if title.trim().is_empty() {
        return Err(TodoError::Validation("title must not be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(TodoError::Validation(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}
