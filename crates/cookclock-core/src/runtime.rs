//! Tick source and deferred-removal driver.
//!
//! [`KitchenDriver`] delivers one tick per interval to a shared [`Kitchen`]
//! and, independently of ticks, wakes at the earliest grace-period deadline
//! to remove expired tasks. Each batch holds the kitchen lock for its whole
//! duration, so user calls land strictly before or after it.
//!
//! ```rust,ignore
//! let kitchen = shared(Kitchen::new(config, Arc::new(SystemClock), Arc::new(sink)));
//! let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
//! let cancel = CancellationToken::new();
//! tokio::spawn(KitchenDriver::new(kitchen.clone(), tx, cancel.child_token()).run());
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::events::Event;
use crate::timer::Kitchen;

pub type SharedKitchen = Arc<Mutex<Kitchen>>;

const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Used as the removal deadline when nothing is pending; the branch is disabled anyway.
const IDLE_WAIT: Duration = Duration::from_secs(3600);

pub fn shared(kitchen: Kitchen) -> SharedKitchen {
    Arc::new(Mutex::new(kitchen))
}

/// Lock the kitchen. A panic while holding the lock does not poison it for
/// the rest of the session.
pub fn lock(kitchen: &SharedKitchen) -> MutexGuard<'_, Kitchen> {
    kitchen.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct KitchenDriver {
    kitchen: SharedKitchen,
    events: mpsc::UnboundedSender<Event>,
    cancel: CancellationToken,
    tick_interval: Duration,
}

impl KitchenDriver {
    /// Events from every batch are forwarded on `events`. Runs until `cancel` fires.
    pub fn new(
        kitchen: SharedKitchen,
        events: mpsc::UnboundedSender<Event>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            kitchen,
            events,
            cancel,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub async fn run(self) {
        let period = self.tick_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        // Late ticks are still delivered one by one; no catch-up arithmetic.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
        info!(tick_ms = period.as_millis() as u64, "kitchen driver started");

        loop {
            let pending = lock(&self.kitchen).time_until_next_removal();
            let reap_at = Instant::now() + pending.unwrap_or(IDLE_WAIT);

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("kitchen driver stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let events = lock(&self.kitchen).advance();
                    self.forward(events);
                }
                _ = tokio::time::sleep_until(reap_at), if pending.is_some() => {
                    let events = {
                        let mut kitchen = lock(&self.kitchen);
                        kitchen.reap_expired();
                        kitchen.drain_events()
                    };
                    self.forward(events);
                }
            }
        }
    }

    fn forward(&self, events: Vec<Event>) {
        for event in events {
            if self.events.send(event).is_err() {
                debug!("event receiver dropped");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::RecordingSink;
    use crate::clock::Clock;
    use crate::events::RemovalReason;
    use crate::task::{NewTask, TaskStatus};
    use crate::timer::KitchenConfig;
    use chrono::{DateTime, Utc};

    /// Wall clock that follows tokio's (pausable) time.
    struct TokioClock {
        base: DateTime<Utc>,
        start: Instant,
    }

    impl TokioClock {
        fn new() -> Self {
            Self {
                base: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
                start: Instant::now(),
            }
        }
    }

    impl Clock for TokioClock {
        fn now(&self) -> DateTime<Utc> {
            self.base + chrono::Duration::from_std(Instant::now() - self.start).unwrap()
        }
    }

    fn kitchen(grace_period_secs: u64, sink: &RecordingSink) -> SharedKitchen {
        shared(Kitchen::new(
            KitchenConfig { grace_period_secs },
            Arc::new(TokioClock::new()),
            Arc::new(sink.clone()),
        ))
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn kebab_runs_to_done_then_expires() {
        let sink = RecordingSink::new();
        let kitchen = kitchen(15, &sink);
        let id = lock(&kitchen).create(NewTask::new("Kebab", 3)).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(KitchenDriver::new(kitchen.clone(), tx, cancel.clone()).run());

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(lock(&kitchen).get(id).unwrap().remaining_secs(), 1);

        tokio::time::sleep(Duration::from_secs(1)).await;
        {
            let k = lock(&kitchen);
            let task = k.get(id).unwrap();
            assert_eq!(task.status(), TaskStatus::Done);
            assert_eq!(task.remaining_secs(), 0);
        }
        assert_eq!(sink.count_for(id), 1);

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert!(lock(&kitchen).get(id).is_none());
        assert_eq!(sink.count_for(id), 1);

        let events = drain(&mut rx);
        let completed = events
            .iter()
            .filter(|e| matches!(e, Event::TaskCompleted { .. }))
            .count();
        assert_eq!(completed, 1);
        assert!(events.iter().any(|e| matches!(
            e,
            Event::TaskRemoved { reason: RemovalReason::Expired, .. }
        )));

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn removal_does_not_wait_for_next_tick() {
        let sink = RecordingSink::new();
        let kitchen = kitchen(2, &sink);
        let id = lock(&kitchen).create(NewTask::new("Flash", 0)).unwrap();

        let (tx, _rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(
            KitchenDriver::new(kitchen.clone(), tx, cancel.clone())
                .with_tick_interval(Duration::from_secs(10))
                .run(),
        );

        // First tick at 10s completes the task; removal is due at 12s,
        // well before the next tick at 20s.
        tokio::time::sleep(Duration::from_millis(10_500)).await;
        assert_eq!(lock(&kitchen).get(id).unwrap().status(), TaskStatus::Done);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(lock(&kitchen).get(id).is_none());
        assert_eq!(lock(&kitchen).tick_seq(), 1);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn user_clear_before_expiry_is_not_undone() {
        let sink = RecordingSink::new();
        let kitchen = kitchen(5, &sink);
        let id = lock(&kitchen).create(NewTask::new("Tea", 1)).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(KitchenDriver::new(kitchen.clone(), tx, cancel.clone()).run());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(lock(&kitchen).remove(id).is_some());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(lock(&kitchen).get(id).is_none());
        assert_eq!(sink.count_for(id), 1);

        let expired = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, Event::TaskRemoved { reason: RemovalReason::Expired, .. }))
            .count();
        assert_eq!(expired, 0);

        cancel.cancel();
        handle.await.unwrap();
    }
}
