//! Authoritative in-memory store of live tasks.
//!
//! Iteration follows insertion order. Every mutating call on an unknown id
//! is a silent no-op so that deferred cleanup can race user clears freely.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::error::{CoreError, Result};
use crate::task::{NewTask, Task, TaskId, TaskStatus};

#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: IndexMap<TaskId, Task>,
    next_id: u64,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            tasks: IndexMap::new(),
            next_id: 1,
        }
    }

    /// Validate `request` and insert a fresh task.
    ///
    /// The task starts `Scheduled` only if its start time is strictly after `now`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` for an empty name or negative duration.
    pub fn create(&mut self, request: NewTask, now: DateTime<Utc>) -> Result<TaskId> {
        let total_secs = request.validate()?;
        let id = self.allocate_id();
        let task = Task::new(
            id,
            request.name,
            request.category,
            total_secs,
            request.scheduled_start,
            now,
        );
        info!(
            task_id = %id,
            name = task.name(),
            total_secs,
            status = %task.status(),
            "task created"
        );
        self.tasks.insert(id, task);
        Ok(id)
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.get(&id)
    }

    /// Like [`get`](Self::get), but absence is an error.
    pub fn require(&self, id: TaskId) -> Result<&Task> {
        self.get(id).ok_or(CoreError::NotFound(id))
    }

    pub fn list_all(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Task> {
        self.tasks.values_mut()
    }

    /// Remove a task. Returns it if it was present.
    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        let removed = self.tasks.shift_remove(&id);
        if removed.is_some() {
            debug!(task_id = %id, "task removed from registry");
        }
        removed
    }

    /// Toggle pause on a running or paused task.
    ///
    /// Returns `true` only when the status actually changed.
    pub fn set_paused(&mut self, id: TaskId, paused: bool) -> bool {
        let Some(task) = self.tasks.get_mut(&id) else {
            return false;
        };
        let next = match (task.status(), paused) {
            (TaskStatus::Running, true) => TaskStatus::Paused,
            (TaskStatus::Paused, false) => TaskStatus::Running,
            _ => return false,
        };
        task.set_status(next);
        debug!(task_id = %id, status = %next, "pause toggled");
        true
    }

    /// Remove every `Done` task, returning their ids in insertion order.
    pub fn clear_done(&mut self) -> Vec<TaskId> {
        let done: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|t| t.status() == TaskStatus::Done)
            .map(Task::id)
            .collect();
        for id in &done {
            self.tasks.shift_remove(id);
        }
        done
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn allocate_id(&mut self) -> TaskId {
        // Default-constructed registries start at zero; ids are 1-based.
        self.next_id = self.next_id.max(1);
        let id = TaskId(self.next_id);
        self.next_id += 1;
        id
    }
}
