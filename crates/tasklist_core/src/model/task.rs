//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record persisted under the `tasks` key.
//! - Provide pure transformations used by the task list service.
//!
//! # Invariants
//! - Names set through this module are trimmed and never empty.
//! - `created_at` is set once at creation and never mutated.
//! - Transformations return new values; existing tasks are never edited in place.

use crate::model::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Identifier of a task, unique within one collection.
///
/// Assigned as `max(existing ids) + 1`, so it is only unique relative to the
/// current collection, not across the full history of deleted tasks.
pub type TaskId = u64;

/// Lifecycle state derived from [`Task::completed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Initial state after `add`.
    Incomplete,
    /// Reached through `toggle`; toggling again returns to `Incomplete`.
    Completed,
}

/// Validation failures for task fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    /// Name is empty after trimming surrounding whitespace.
    EmptyName,
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "task name must not be empty"),
        }
    }
}

impl Error for TaskValidationError {}

/// One entry of the task list.
///
/// Wire shape: `{"id": 1, "name": "...", "completed": false, "createdAt": "..."}`.
/// Missing `completed` reads as `false`; missing `createdAt` reads as the
/// hydration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(with = "timestamp", default = "timestamp::now")]
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Creates an incomplete task stamped with the current time.
    ///
    /// # Errors
    /// - Returns [`TaskValidationError::EmptyName`] when `name` is blank.
    pub fn new(id: TaskId, name: &str) -> Result<Self, TaskValidationError> {
        Self::with_created_at(id, name, timestamp::now())
    }

    /// Creates an incomplete task with a caller-provided creation time.
    pub fn with_created_at(
        id: TaskId,
        name: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TaskValidationError> {
        Ok(Self {
            id,
            name: normalize_name(name)?,
            completed: false,
            created_at,
        })
    }

    pub fn state(&self) -> TaskState {
        if self.completed {
            TaskState::Completed
        } else {
            TaskState::Incomplete
        }
    }

    /// Returns a copy with `name` replaced; all other fields are kept.
    pub fn renamed(&self, name: &str) -> Result<Self, TaskValidationError> {
        Ok(Self {
            name: normalize_name(name)?,
            ..self.clone()
        })
    }

    /// Returns a copy with `completed` flipped.
    pub fn toggled(&self) -> Self {
        Self {
            completed: !self.completed,
            ..self.clone()
        }
    }
}

/// Trims surrounding whitespace and rejects blank names.
pub fn normalize_name(name: &str) -> Result<String, TaskValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TaskValidationError::EmptyName);
    }
    Ok(trimmed.to_string())
}

/// Next id for a collection: one past the current maximum, or 1 when empty.
///
/// Returns `None` when the maximum is already `TaskId::MAX`.
pub fn next_task_id(tasks: &[Task]) -> Option<TaskId> {
    match tasks.iter().map(|task| task.id).max() {
        Some(max) => max.checked_add(1),
        None => Some(1),
    }
}

/// Read-only status filter used by list views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TaskFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
        }
    }
}

/// Aggregate counters over one collection snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

impl TaskCounts {
    pub fn of(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|task| task.completed).count();
        Self {
            total: tasks.len(),
            active: tasks.len() - completed,
            completed,
        }
    }
}
