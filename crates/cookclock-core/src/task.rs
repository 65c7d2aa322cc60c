//! The kitchen task entity.
//!
//! A task is a named countdown. It is owned by the [`TaskRegistry`] and only
//! mutated by the state machine on a tick or by an explicit pause/resume.
//!
//! [`TaskRegistry`]: crate::registry::TaskRegistry

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Stable task identifier. Allocated monotonically, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse().map(TaskId)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Waiting for `scheduled_start`.
    Scheduled,
    Running,
    /// Frozen by the user; only an explicit resume leaves this state.
    Paused,
    /// Countdown finished; removed after the grace period.
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Scheduled => "Scheduled",
            TaskStatus::Running => "Running",
            TaskStatus::Paused => "Paused",
            TaskStatus::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to create a task, as collected from user input.
///
/// The duration is signed because it comes straight from a form field;
/// [`NewTask::validate`] rejects negatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub name: String,
    pub duration_secs: i64,
    pub category: String,
    pub scheduled_start: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn new(name: impl Into<String>, duration_secs: i64) -> Self {
        Self {
            name: name.into(),
            duration_secs,
            category: crate::storage::CUSTOM_CATEGORY.to_string(),
            scheduled_start: None,
        }
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn scheduled_at(mut self, start: DateTime<Utc>) -> Self {
        self.scheduled_start = Some(start);
        self
    }

    /// Check the name and duration, returning the duration as unsigned seconds.
    pub fn validate(&self) -> Result<u64, ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        u64::try_from(self.duration_secs)
            .map_err(|_| ValidationError::NegativeDuration(self.duration_secs))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    name: String,
    category: String,
    total_secs: u64,
    remaining_secs: u64,
    scheduled_start: Option<DateTime<Utc>>,
    status: TaskStatus,
    alarm_fired: bool,
    created_at: DateTime<Utc>,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
    /// Sequence number of the last tick that decremented this task.
    #[serde(default)]
    last_counted_tick: Option<u64>,
}

impl Task {
    /// Build a task from an already validated request.
    pub(crate) fn new(
        id: TaskId,
        name: String,
        category: String,
        total_secs: u64,
        scheduled_start: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        let status = match scheduled_start {
            Some(start) if start > now => TaskStatus::Scheduled,
            _ => TaskStatus::Running,
        };
        Self {
            id,
            name,
            category,
            total_secs,
            remaining_secs: total_secs,
            scheduled_start,
            status,
            alarm_fired: false,
            created_at: now,
            completed_at: None,
            last_counted_tick: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn scheduled_start(&self) -> Option<DateTime<Utc>> {
        self.scheduled_start
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn alarm_fired(&self) -> bool {
        self.alarm_fired
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn is_paused(&self) -> bool {
        self.status == TaskStatus::Paused
    }

    /// Remaining time as an integer percentage of the total, 0 for zero-length tasks.
    pub fn progress_pct(&self) -> u8 {
        if self.total_secs == 0 {
            return 0;
        }
        let pct = self.remaining_secs.min(self.total_secs) * 100 / self.total_secs;
        pct as u8
    }

    /// `MM:SS` countdown, or `--:--` while the task has not started yet.
    pub fn remaining_label(&self) -> String {
        match self.status {
            TaskStatus::Scheduled => "--:--".to_string(),
            _ => format_clock(self.remaining_secs),
        }
    }

    // ── Mutation (state machine only) ────────────────────────────────

    pub(crate) fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }

    pub(crate) fn set_remaining(&mut self, secs: u64) {
        self.remaining_secs = secs;
    }

    pub(crate) fn mark_counted(&mut self, tick: u64) {
        self.last_counted_tick = Some(tick);
    }

    pub(crate) fn counted_in(&self, tick: u64) -> bool {
        self.last_counted_tick == Some(tick)
    }

    pub(crate) fn set_alarm_fired(&mut self) {
        self.alarm_fired = true;
    }

    pub(crate) fn set_completed_at(&mut self, at: DateTime<Utc>) {
        self.completed_at = Some(at);
    }
}

/// Format seconds as `MM:SS`. Minutes are not wrapped into hours.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn format_clock_pads_minutes_and_seconds() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(90), "01:30");
        assert_eq!(format_clock(25 * 60), "25:00");
        assert_eq!(format_clock(100 * 60 + 5), "100:05");
    }

    #[test]
    fn future_schedule_starts_scheduled() {
        let task = Task::new(
            TaskId(1),
            "Rice".into(),
            "Scheduled".into(),
            5,
            Some(at(2)),
            at(0),
        );
        assert_eq!(task.status(), TaskStatus::Scheduled);
        assert_eq!(task.remaining_label(), "--:--");
    }

    #[test]
    fn past_or_present_schedule_starts_running() {
        let now = at(10);
        for start in [now, now - Duration::seconds(30)] {
            let task = Task::new(TaskId(1), "Rice".into(), "Custom".into(), 5, Some(start), now);
            assert_eq!(task.status(), TaskStatus::Running);
        }
    }

    #[test]
    fn progress_is_zero_for_zero_length_task() {
        let task = Task::new(TaskId(1), "Flash".into(), "Custom".into(), 0, None, at(0));
        assert_eq!(task.progress_pct(), 0);
    }

    #[test]
    fn progress_tracks_remaining_fraction() {
        let mut task = Task::new(TaskId(1), "Kebab".into(), "Custom".into(), 90, None, at(0));
        assert_eq!(task.progress_pct(), 100);
        task.set_remaining(45);
        assert_eq!(task.progress_pct(), 50);
    }

    #[test]
    fn validate_rejects_blank_names_and_negative_durations() {
        assert_eq!(NewTask::new("  ", 10).validate(), Err(ValidationError::EmptyName));
        assert_eq!(
            NewTask::new("Tea", -1).validate(),
            Err(ValidationError::NegativeDuration(-1))
        );
        assert_eq!(NewTask::new("Tea", 0).validate(), Ok(0));
    }

    #[test]
    fn task_id_parses_with_optional_hash() {
        assert_eq!("#12".parse::<TaskId>().unwrap(), TaskId(12));
        assert_eq!(" 3 ".parse::<TaskId>().unwrap(), TaskId(3));
        assert!("abc".parse::<TaskId>().is_err());
    }
}
