mod engine;
pub mod machine;
mod reaper;

pub use engine::{Kitchen, KitchenConfig, DEFAULT_GRACE_PERIOD_SECS};
pub use machine::StepOutcome;
pub use reaper::RemovalQueue;
