//! Task list use-case service.
//!
//! # Responsibility
//! - Own the authoritative in-memory task collection.
//! - Apply add/edit/toggle/delete as whole-collection replacements.
//! - Mirror every replacement to the durable store under [`TASKS_KEY`].
//!
//! # Invariants
//! - Task ids are unique within the collection at all times.
//! - Insertion order is preserved; no operation re-sorts the collection.
//! - Invalid input leaves both memory and storage untouched.
//! - A failed write keeps the new in-memory collection and marks it unsynced;
//!   the next successful write persists the whole collection again.

use crate::model::task::{
    next_task_id, normalize_name, Task, TaskCounts, TaskFilter, TaskId, TaskValidationError,
};
use crate::repo::kv_repo::KvRepository;
use crate::store::durable_store::{DurableStore, StoreError, Stored};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage key of the persisted task collection.
pub const TASKS_KEY: &str = "tasks";

pub type TaskListResult<T> = Result<T, TaskListError>;

/// Service error for task list mutations.
#[derive(Debug)]
pub enum TaskListError {
    /// Input rejected before any state change.
    Validation(TaskValidationError),
    /// In-memory state changed but could not be persisted.
    Persist(StoreError),
    /// The collection already holds `TaskId::MAX`; no new id can be assigned.
    IdSpaceExhausted,
}

impl Display for TaskListError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Persist(err) => write!(f, "task list not saved: {err}"),
            Self::IdSpaceExhausted => write!(f, "no task id left after {}", TaskId::MAX),
        }
    }
}

impl Error for TaskListError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persist(err) => Some(err),
            Self::IdSpaceExhausted => None,
        }
    }
}

impl From<TaskValidationError> for TaskListError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for TaskListError {
    fn from(value: StoreError) -> Self {
        Self::Persist(value)
    }
}

/// Task list state manager bound to one durable store.
pub struct TaskListService<R: KvRepository> {
    store: DurableStore<R>,
    tasks: Vec<Task>,
    synced: bool,
}

impl<R: KvRepository> TaskListService<R> {
    /// Hydrates the collection once from `store`.
    ///
    /// Missing data yields an empty, synced collection. Unreadable data
    /// yields an empty collection reported as unsynced: the damaged entry
    /// stays in storage until the next write or [`Self::flush`] replaces it.
    /// Persisted duplicates of an id keep their first occurrence; the
    /// repaired collection is also reported as unsynced.
    pub fn hydrate(store: DurableStore<R>) -> Self {
        let (stored, unreadable) = match store.load::<Vec<Task>>(TASKS_KEY) {
            Stored::Decoded(tasks) => (tasks, false),
            Stored::Absent => (Vec::new(), false),
            Stored::Unreadable => (Vec::new(), true),
        };
        let (tasks, dropped) = drop_duplicate_ids(stored);

        if unreadable {
            warn!("event=task_list_hydrate module=service status=reset count=0 pending_sync=true");
        } else if dropped > 0 {
            warn!(
                "event=task_list_hydrate module=service status=repaired count={} dropped_duplicates={}",
                tasks.len(),
                dropped
            );
        } else {
            info!(
                "event=task_list_hydrate module=service status=ok count={}",
                tasks.len()
            );
        }

        Self {
            store,
            tasks,
            synced: !unreadable && dropped == 0,
        }
    }

    /// Read-only snapshot of the collection in insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Tasks matching `filter`, in insertion order.
    pub fn filtered(&self, filter: TaskFilter) -> impl Iterator<Item = &Task> + '_ {
        self.tasks.iter().filter(move |task| filter.matches(task))
    }

    pub fn counts(&self) -> TaskCounts {
        TaskCounts::of(&self.tasks)
    }

    /// Whether the in-memory collection matches the last persisted value.
    pub fn is_synced(&self) -> bool {
        self.synced
    }

    pub fn store(&self) -> &DurableStore<R> {
        &self.store
    }

    /// Appends a new incomplete task and persists the collection.
    ///
    /// # Contract
    /// - `name` is trimmed and must not be empty.
    /// - New id is `max(existing ids) + 1`, or 1 for an empty collection.
    ///
    /// # Errors
    /// - `Validation` for a blank name; nothing changes.
    /// - `IdSpaceExhausted` when the largest id is `TaskId::MAX`; nothing changes.
    /// - `Persist` when the write fails; the task stays in memory.
    pub fn add(&mut self, name: &str) -> TaskListResult<Task> {
        let name = normalize_name(name)?;
        let Some(id) = next_task_id(&self.tasks) else {
            warn!(
                "event=task_add module=service status=error error_code=id_space_exhausted count={}",
                self.tasks.len()
            );
            return Err(TaskListError::IdSpaceExhausted);
        };
        let task = Task::new(id, &name)?;

        let mut next = Vec::with_capacity(self.tasks.len() + 1);
        next.extend(self.tasks.iter().cloned());
        next.push(task.clone());

        self.commit("task_add", task.id, next)?;
        Ok(task)
    }

    /// Replaces the name of task `id`, keeping every other field.
    ///
    /// Returns `Ok(false)` without touching storage when `id` is absent.
    pub fn edit(&mut self, id: TaskId, new_name: &str) -> TaskListResult<bool> {
        let name = normalize_name(new_name)?;
        if self.get(id).is_none() {
            return Ok(self.skip("task_edit", id));
        }

        let next = self
            .tasks
            .iter()
            .map(|task| {
                if task.id == id {
                    task.renamed(&name)
                } else {
                    Ok(task.clone())
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.commit("task_edit", id, next)?;
        Ok(true)
    }

    /// Flips the completion flag of task `id`.
    ///
    /// Returns `Ok(false)` without touching storage when `id` is absent.
    pub fn toggle(&mut self, id: TaskId) -> TaskListResult<bool> {
        if self.get(id).is_none() {
            return Ok(self.skip("task_toggle", id));
        }

        let next = self
            .tasks
            .iter()
            .map(|task| {
                if task.id == id {
                    task.toggled()
                } else {
                    task.clone()
                }
            })
            .collect();

        self.commit("task_toggle", id, next)?;
        Ok(true)
    }

    /// Removes task `id`, keeping the relative order of the rest.
    ///
    /// Returns `Ok(false)` without touching storage when `id` is absent.
    pub fn delete(&mut self, id: TaskId) -> TaskListResult<bool> {
        if self.get(id).is_none() {
            return Ok(self.skip("task_delete", id));
        }

        let next = self
            .tasks
            .iter()
            .filter(|task| task.id != id)
            .cloned()
            .collect();

        self.commit("task_delete", id, next)?;
        Ok(true)
    }

    /// Persists the current collection again, e.g. after a failed write.
    pub fn flush(&mut self) -> TaskListResult<()> {
        self.persist("task_list_flush")
    }

    fn commit(&mut self, event: &str, id: TaskId, next: Vec<Task>) -> TaskListResult<()> {
        self.tasks = next;
        self.persist(event)?;
        info!(
            "event={} module=service status=ok task_id={} count={}",
            event,
            id,
            self.tasks.len()
        );
        Ok(())
    }

    fn persist(&mut self, event: &str) -> TaskListResult<()> {
        match self.store.write(TASKS_KEY, &self.tasks) {
            Ok(()) => {
                self.synced = true;
                Ok(())
            }
            Err(err) => {
                self.synced = false;
                warn!(
                    "event={} module=service status=error pending_sync=true count={}",
                    event,
                    self.tasks.len()
                );
                Err(err.into())
            }
        }
    }

    fn skip(&self, event: &str, id: TaskId) -> bool {
        debug!("event={event} module=service status=noop task_id={id} reason=not_found");
        false
    }
}

fn drop_duplicate_ids(tasks: Vec<Task>) -> (Vec<Task>, usize) {
    let total = tasks.len();
    let mut seen = HashSet::with_capacity(total);
    let kept: Vec<Task> = tasks.into_iter().filter(|task| seen.insert(task.id)).collect();
    let dropped = total - kept.len();
    (kept, dropped)
}
