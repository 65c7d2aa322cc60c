use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskId, TaskStatus};

/// Why a task left the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalReason {
    /// The user cleared it.
    Cleared,
    /// The grace period after completion elapsed.
    Expired,
}

/// Every state change in the kitchen produces an Event.
/// The front end renders them; `advance()` returns one batch per tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TaskCreated {
        task_id: TaskId,
        name: String,
        total_secs: u64,
        status: TaskStatus,
        at: DateTime<Utc>,
    },
    /// A scheduled task reached its start time.
    TaskActivated {
        task_id: TaskId,
        at: DateTime<Utc>,
    },
    TaskPaused {
        task_id: TaskId,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TaskResumed {
        task_id: TaskId,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TaskCompleted {
        task_id: TaskId,
        name: String,
        at: DateTime<Utc>,
    },
    TaskRemoved {
        task_id: TaskId,
        reason: RemovalReason,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        tick_seq: u64,
        tasks: Vec<Task>,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// The task this event is about, if any.
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            Event::TaskCreated { task_id, .. }
            | Event::TaskActivated { task_id, .. }
            | Event::TaskPaused { task_id, .. }
            | Event::TaskResumed { task_id, .. }
            | Event::TaskCompleted { task_id, .. }
            | Event::TaskRemoved { task_id, .. } => Some(*task_id),
            Event::StateSnapshot { .. } => None,
        }
    }
}
