//! Completion alarms.
//!
//! The dispatcher fires at most once per task, gated by the task's
//! `alarm_fired` flag. Rendering the alarm is the sink's business; a sink
//! that fails to render swallows the failure.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::task::{Task, TaskId};

/// Payload forwarded to the front end when a task completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmNotice {
    pub task_id: TaskId,
    pub task_name: String,
    pub at: DateTime<Utc>,
}

/// Receiver side of completion alarms.
pub trait AlarmSink: Send + Sync {
    fn task_completed(&self, notice: AlarmNotice);
}

/// Discards every alarm.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl AlarmSink for NullSink {
    fn task_completed(&self, _notice: AlarmNotice) {}
}

/// Forwards alarms over an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<AlarmNotice>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AlarmNotice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AlarmSink for ChannelSink {
    fn task_completed(&self, notice: AlarmNotice) {
        // Receiver gone means nobody is listening; best effort only.
        if self.tx.send(notice).is_err() {
            debug!("alarm receiver dropped");
        }
    }
}

/// Keeps every alarm in memory. Clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    notices: Arc<Mutex<Vec<AlarmNotice>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<AlarmNotice> {
        self.notices.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn count_for(&self, id: TaskId) -> usize {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|n| n.task_id == id)
            .count()
    }
}

impl AlarmSink for RecordingSink {
    fn task_completed(&self, notice: AlarmNotice) {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notice);
    }
}

pub struct AlarmDispatcher {
    sink: Arc<dyn AlarmSink>,
}

impl AlarmDispatcher {
    pub fn new(sink: Arc<dyn AlarmSink>) -> Self {
        Self { sink }
    }

    /// Fire the completion alarm for `task` unless it already fired.
    ///
    /// Returns `true` if the sink was invoked.
    pub fn notify(&self, task: &mut Task, at: DateTime<Utc>) -> bool {
        if task.alarm_fired() {
            return false;
        }
        task.set_alarm_fired();
        info!(task_id = %task.id(), name = task.name(), "alarm fired");
        self.sink.task_completed(AlarmNotice {
            task_id: task.id(),
            task_name: task.name().to_string(),
            at,
        });
        true
    }
}

impl Default for AlarmDispatcher {
    fn default() -> Self {
        Self::new(Arc::new(NullSink))
    }
}

impl std::fmt::Debug for AlarmDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlarmDispatcher").finish_non_exhaustive()
    }
}
