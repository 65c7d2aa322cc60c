//! Per-task transition function.
//!
//! ```text
//! Scheduled -> Running <-> Paused
//!                 |
//!                 v
//!               Done -> (removed after grace period)
//! ```
//!
//! One call handles one task for one tick. The activation tick of a
//! scheduled task does not also count down, and a task is decremented at
//! most once per tick sequence number no matter how often it is evaluated.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::alarm::AlarmDispatcher;
use crate::task::{Task, TaskStatus};

/// What happened to a task during one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub activated: bool,
    pub decremented: bool,
    pub completed: bool,
    pub alarm_fired: bool,
    pub clamped: bool,
}

/// Advance `task` by one tick.
pub fn step(
    task: &mut Task,
    now: DateTime<Utc>,
    tick_seq: u64,
    dispatcher: &AlarmDispatcher,
) -> StepOutcome {
    let mut outcome = StepOutcome {
        clamped: clamp_remaining(task),
        ..StepOutcome::default()
    };
    if outcome.clamped {
        debug_assert!(false, "task {} had remaining > total", task.id());
        warn!(task_id = %task.id(), "remaining exceeded total; clamped");
    }

    match task.status() {
        TaskStatus::Scheduled => {
            let due = task.scheduled_start().map_or(true, |start| start <= now);
            if due {
                task.set_status(TaskStatus::Running);
                outcome.activated = true;
                debug!(task_id = %task.id(), "scheduled task activated");
            }
        }
        TaskStatus::Running => {
            if task.counted_in(tick_seq) {
                return outcome;
            }
            task.mark_counted(tick_seq);
            let next = task.remaining_secs().saturating_sub(1);
            task.set_remaining(next);
            outcome.decremented = true;

            if next == 0 {
                task.set_status(TaskStatus::Done);
                task.set_completed_at(now);
                outcome.completed = true;
                outcome.alarm_fired = dispatcher.notify(task, now);
                debug!(task_id = %task.id(), "task done");
            }
        }
        TaskStatus::Paused | TaskStatus::Done => {}
    }

    outcome
}

/// Restore `remaining <= total`. Returns `true` if the task was out of range.
pub(crate) fn clamp_remaining(task: &mut Task) -> bool {
    if task.remaining_secs() > task.total_secs() {
        task.set_remaining(task.total_secs());
        return true;
    }
    false
}
