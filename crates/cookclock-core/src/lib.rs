//! # CookClock Core Library
//!
//! The task lifecycle and countdown engine behind the CookClock kitchen timer.
//! Front ends (the `cookclock` CLI) call into this library on a fixed tick and
//! render whatever state it returns.
//!
//! ## Architecture
//!
//! - **Task Registry**: insertion-ordered store of live tasks keyed by id
//! - **State Machine**: per-task transition logic, evaluated once per tick
//! - **Alarm Dispatcher**: fires exactly once when a task finishes
//! - **Removal Queue**: min-heap of grace-period deadlines for finished tasks
//! - **Driver**: tokio loop delivering ticks and deadline-driven removals
//!
//! ## Key Components
//!
//! - [`Kitchen`]: owns every task and exposes `advance()`
//! - [`TaskRegistry`]: the store itself
//! - [`AlarmDispatcher`] / [`AlarmSink`]: completion notification
//! - [`KitchenDriver`]: async tick source
//! - [`Config`]: presets, colors and engine timing

pub mod alarm;
pub mod clock;
pub mod error;
pub mod events;
pub mod preset;
pub mod registry;
pub mod runtime;
pub mod storage;
pub mod task;
pub mod timer;

pub use alarm::{AlarmDispatcher, AlarmNotice, AlarmSink, ChannelSink, NullSink, RecordingSink};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, Result, ValidationError};
pub use events::{Event, RemovalReason};
pub use preset::Preset;
pub use registry::TaskRegistry;
pub use runtime::{KitchenDriver, SharedKitchen};
pub use storage::Config;
pub use task::{format_clock, NewTask, Task, TaskId, TaskStatus};
pub use timer::{Kitchen, KitchenConfig};
