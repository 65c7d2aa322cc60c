//! Kitchen engine.
//!
//! Owns the registry, the alarm dispatcher and the deferred removal queue.
//! There are no internal threads: the caller delivers ticks through
//! [`Kitchen::advance`] and renders [`Kitchen::list_all`] afterwards.
//!
//! ## Usage
//!
//! ```ignore
//! let mut kitchen = Kitchen::new(KitchenConfig::default(), clock, sink);
//! kitchen.create(NewTask::new("Kebab Frying", 90))?;
//! // Once per second:
//! for event in kitchen.advance() { /* render */ }
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use super::machine;
use super::reaper::RemovalQueue;
use crate::alarm::{AlarmDispatcher, AlarmSink};
use crate::clock::Clock;
use crate::error::Result;
use crate::events::{Event, RemovalReason};
use crate::preset::Preset;
use crate::registry::TaskRegistry;
use crate::task::{NewTask, Task, TaskId, TaskStatus};

/// Default delay between `Done` and automatic removal.
pub const DEFAULT_GRACE_PERIOD_SECS: u64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KitchenConfig {
    pub grace_period_secs: u64,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: DEFAULT_GRACE_PERIOD_SECS,
        }
    }
}

impl KitchenConfig {
    pub fn grace_period(&self) -> Duration {
        i64::try_from(self.grace_period_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }
}

pub struct Kitchen {
    config: KitchenConfig,
    registry: TaskRegistry,
    dispatcher: AlarmDispatcher,
    removals: RemovalQueue,
    clock: Arc<dyn Clock>,
    /// Sequence number of the last tick applied.
    tick_seq: u64,
    /// Events produced since the last drain.
    outbox: Vec<Event>,
}

impl Kitchen {
    pub fn new(config: KitchenConfig, clock: Arc<dyn Clock>, sink: Arc<dyn AlarmSink>) -> Self {
        Self {
            config,
            registry: TaskRegistry::new(),
            dispatcher: AlarmDispatcher::new(sink),
            removals: RemovalQueue::new(),
            clock,
            tick_seq: 0,
            outbox: Vec::new(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> KitchenConfig {
        self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn tick_seq(&self) -> u64 {
        self.tick_seq
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.registry.get(id)
    }

    /// # Errors
    ///
    /// Returns `CoreError::NotFound` if the task no longer exists.
    pub fn require(&self, id: TaskId) -> Result<&Task> {
        self.registry.require(id)
    }

    pub fn list_all(&self) -> Vec<&Task> {
        self.registry.list_all().collect()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Earliest pending automatic removal.
    pub fn next_removal_at(&self) -> Option<DateTime<Utc>> {
        self.removals.next_due()
    }

    /// Wall time until the earliest pending removal, zero if already due.
    pub fn time_until_next_removal(&self) -> Option<std::time::Duration> {
        let at = self.next_removal_at()?;
        Some((at - self.now()).to_std().unwrap_or_default())
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            tick_seq: self.tick_seq,
            tasks: self.registry.list_all().cloned().collect(),
            at: self.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` for an empty name or negative duration.
    pub fn create(&mut self, request: NewTask) -> Result<TaskId> {
        let now = self.now();
        let id = self.registry.create(request, now)?;
        if let Some(task) = self.registry.get(id) {
            self.outbox.push(Event::TaskCreated {
                task_id: id,
                name: task.name().to_string(),
                total_secs: task.total_secs(),
                status: task.status(),
                at: now,
            });
        }
        Ok(id)
    }

    /// Start a predefined task immediately.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidInput` if the preset itself is malformed.
    pub fn create_from_preset(&mut self, preset: &Preset) -> Result<TaskId> {
        self.create(preset.to_request())
    }

    /// Pause (`true`) or resume (`false`). Returns the event if the status changed.
    pub fn set_paused(&mut self, id: TaskId, paused: bool) -> Option<Event> {
        if !self.registry.set_paused(id, paused) {
            return None;
        }
        let remaining_secs = self.registry.get(id)?.remaining_secs();
        let at = self.now();
        let event = if paused {
            Event::TaskPaused {
                task_id: id,
                remaining_secs,
                at,
            }
        } else {
            Event::TaskResumed {
                task_id: id,
                remaining_secs,
                at,
            }
        };
        self.outbox.push(event.clone());
        Some(event)
    }

    pub fn pause(&mut self, id: TaskId) -> Option<Event> {
        self.set_paused(id, true)
    }

    pub fn resume(&mut self, id: TaskId) -> Option<Event> {
        self.set_paused(id, false)
    }

    /// Clear a task right away. Unknown ids are ignored.
    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        let task = self.registry.remove(id)?;
        info!(task_id = %id, "task cleared");
        self.outbox.push(Event::TaskRemoved {
            task_id: id,
            reason: RemovalReason::Cleared,
            at: self.now(),
        });
        Some(task)
    }

    /// Clear every finished task without waiting for its grace period.
    pub fn clear_done(&mut self) -> Vec<TaskId> {
        let cleared = self.registry.clear_done();
        let at = self.now();
        for id in &cleared {
            self.outbox.push(Event::TaskRemoved {
                task_id: *id,
                reason: RemovalReason::Cleared,
                at,
            });
        }
        cleared
    }

    /// Remove tasks whose grace period has elapsed. Returns how many were removed.
    pub fn reap_expired(&mut self) -> usize {
        let now = self.now();
        let mut removed = 0;
        for id in self.removals.pop_due(now) {
            if self.registry.remove(id).is_some() {
                info!(task_id = %id, "finished task expired");
                self.outbox.push(Event::TaskRemoved {
                    task_id: id,
                    reason: RemovalReason::Expired,
                    at: now,
                });
                removed += 1;
            }
        }
        removed
    }

    /// Deliver the next tick. Returns every event produced since the previous
    /// drain, user actions first, then this tick's transitions.
    pub fn advance(&mut self) -> Vec<Event> {
        self.apply_tick(self.tick_seq + 1)
    }

    /// Deliver a tick with an explicit sequence number.
    ///
    /// A sequence number at or below the last applied one is a duplicate
    /// delivery and changes nothing.
    pub fn apply_tick(&mut self, seq: u64) -> Vec<Event> {
        if seq <= self.tick_seq {
            debug!(seq, last = self.tick_seq, "duplicate tick ignored");
            return self.drain_events();
        }
        self.tick_seq = seq;
        self.reap_expired();

        let now = self.now();
        let grace = self.config.grace_period();
        let mut finished = Vec::new();

        for task in self.registry.iter_mut() {
            let outcome = machine::step(task, now, seq, &self.dispatcher);
            if outcome.activated {
                self.outbox.push(Event::TaskActivated {
                    task_id: task.id(),
                    at: now,
                });
            }
            if outcome.completed {
                self.outbox.push(Event::TaskCompleted {
                    task_id: task.id(),
                    name: task.name().to_string(),
                    at: now,
                });
                finished.push(task.id());
            }
        }

        for id in finished {
            match now.checked_add_signed(grace) {
                Some(at) => self.removals.schedule(id, at),
                None => debug!(task_id = %id, "grace period out of range; task kept"),
            }
        }

        self.drain_events()
    }

    /// Take pending events without ticking.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.outbox)
    }

    /// Number of tasks in `status`.
    pub fn count(&self, status: TaskStatus) -> usize {
        self.registry
            .list_all()
            .filter(|t| t.status() == status)
            .count()
    }
}

impl std::fmt::Debug for Kitchen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kitchen")
            .field("config", &self.config)
            .field("tasks", &self.registry.len())
            .field("pending_removals", &self.removals.len())
            .field("tick_seq", &self.tick_seq)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::{NullSink, RecordingSink};
    use crate::clock::ManualClock;

    fn kitchen() -> (Kitchen, ManualClock, RecordingSink) {
        let clock = ManualClock::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap());
        let sink = RecordingSink::new();
        let kitchen = Kitchen::new(
            KitchenConfig::default(),
            Arc::new(clock.clone()),
            Arc::new(sink.clone()),
        );
        (kitchen, clock, sink)
    }

    fn tick(kitchen: &mut Kitchen, clock: &ManualClock) -> Vec<Event> {
        clock.advance_secs(1);
        kitchen.advance()
    }

    #[test]
    fn completion_schedules_removal_after_grace() {
        let (mut k, clock, sink) = kitchen();
        let id = k.create(NewTask::new("Kebab", 1)).unwrap();

        let events = tick(&mut k, &clock);
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::TaskCompleted { task_id, .. } if *task_id == id)));
        assert_eq!(k.next_removal_at(), Some(clock.now() + Duration::seconds(15)));
        assert_eq!(k.time_until_next_removal(), Some(std::time::Duration::from_secs(15)));
        assert_eq!(sink.count_for(id), 1);

        clock.advance_secs(14);
        assert_eq!(k.reap_expired(), 0);
        clock.advance_secs(1);
        assert_eq!(k.reap_expired(), 1);
        assert!(k.get(id).is_none());
        assert!(k.next_removal_at().is_none());
    }

    #[test]
    fn duplicate_tick_sequence_is_ignored() {
        let (mut k, clock, _) = kitchen();
        let id = k.create(NewTask::new("Tea", 10)).unwrap();
        clock.advance_secs(1);
        k.apply_tick(1);
        k.apply_tick(1);
        k.apply_tick(1);
        assert_eq!(k.get(id).unwrap().remaining_secs(), 9);
        k.apply_tick(2);
        assert_eq!(k.get(id).unwrap().remaining_secs(), 8);
        assert_eq!(k.tick_seq(), 2);
    }

    #[test]
    fn user_events_are_returned_before_tick_events() {
        let (mut k, clock, _) = kitchen();
        let id = k.create(NewTask::new("Tea", 1)).unwrap();
        let events = tick(&mut k, &clock);
        assert!(matches!(events[0], Event::TaskCreated { .. }));
        assert!(matches!(events[1], Event::TaskCompleted { .. }));
        assert_eq!(events[1].task_id(), Some(id));
        assert!(k.drain_events().is_empty());
    }

    #[test]
    fn pause_and_resume_emit_events_only_on_change() {
        let (mut k, _clock, _) = kitchen();
        let id = k.create(NewTask::new("Tea", 10)).unwrap();
        assert!(matches!(k.pause(id), Some(Event::TaskPaused { remaining_secs: 10, .. })));
        assert!(k.pause(id).is_none());
        assert!(matches!(k.resume(id), Some(Event::TaskResumed { .. })));
        assert!(k.resume(TaskId(77)).is_none());
    }

    #[test]
    fn remove_reports_cleared_once() {
        let (mut k, _clock, _) = kitchen();
        let id = k.create(NewTask::new("Tea", 10)).unwrap();
        k.drain_events();
        assert!(k.remove(id).is_some());
        assert!(k.remove(id).is_none());
        let events = k.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Event::TaskRemoved { reason: RemovalReason::Cleared, .. }
        ));
    }

    #[test]
    fn clear_done_skips_grace_period() {
        let (mut k, clock, _) = kitchen();
        let quick = k.create(NewTask::new("Quick", 0)).unwrap();
        let slow = k.create(NewTask::new("Slow", 60)).unwrap();
        tick(&mut k, &clock);
        assert_eq!(k.count(TaskStatus::Done), 1);
        assert_eq!(k.clear_done(), vec![quick]);
        assert!(k.get(slow).is_some());

        // The stale removal entry later fires as a no-op.
        clock.advance_secs(20);
        assert_eq!(k.reap_expired(), 0);
    }

    #[test]
    fn snapshot_lists_tasks_in_order() {
        let (mut k, _clock, _) = kitchen();
        k.create(NewTask::new("A", 1)).unwrap();
        k.create(NewTask::new("B", 2)).unwrap();
        match k.snapshot() {
            Event::StateSnapshot { tasks, tick_seq, .. } => {
                assert_eq!(tick_seq, 0);
                let names: Vec<&str> = tasks.iter().map(Task::name).collect();
                assert_eq!(names, vec!["A", "B"]);
            }
            other => panic!("expected StateSnapshot, got {other:?}"),
        }
    }

    #[test]
    fn custom_grace_period_is_honoured() {
        let clock = ManualClock::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap());
        let mut k = Kitchen::new(
            KitchenConfig { grace_period_secs: 3 },
            Arc::new(clock.clone()),
            Arc::new(NullSink),
        );
        let id = k.create(NewTask::new("Toast", 0)).unwrap();
        for _ in 0..3 {
            tick(&mut k, &clock);
            assert!(k.get(id).is_some());
        }
        tick(&mut k, &clock);
        assert!(k.get(id).is_none());
    }
}
