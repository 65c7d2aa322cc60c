//! Deferred removal of finished tasks.
//!
//! A min-heap of `(fire_at, TaskId)`. Entries are never cancelled: if the
//! task was already cleared by the user, popping its entry removes nothing.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use chrono::{DateTime, Utc};

use crate::task::TaskId;

#[derive(Debug, Default, Clone)]
pub struct RemovalQueue {
    heap: BinaryHeap<Reverse<(DateTime<Utc>, TaskId)>>,
}

impl RemovalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, id: TaskId, fire_at: DateTime<Utc>) {
        self.heap.push(Reverse((fire_at, id)));
    }

    /// Earliest pending deadline.
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.heap.peek().map(|Reverse((at, _))| *at)
    }

    /// Pop every entry with `fire_at <= now`, earliest first.
    pub fn pop_due(&mut self, now: DateTime<Utc>) -> Vec<TaskId> {
        let mut due = Vec::new();
        while let Some(Reverse((at, id))) = self.heap.peek() {
            if *at > now {
                break;
            }
            due.push(*id);
            self.heap.pop();
        }
        due
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
