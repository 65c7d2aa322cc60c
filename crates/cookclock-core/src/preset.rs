//! Predefined kitchen tasks.

use serde::{Deserialize, Serialize};

use crate::task::NewTask;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub duration_secs: u64,
}

impl Preset {
    pub fn new(name: impl Into<String>, duration_secs: u64) -> Self {
        Self {
            name: name.into(),
            duration_secs,
        }
    }

    /// A start request for this preset. The preset name doubles as category.
    pub fn to_request(&self) -> NewTask {
        let secs = i64::try_from(self.duration_secs).unwrap_or(i64::MAX);
        NewTask::new(self.name.clone(), secs).category(self.name.clone())
    }
}

/// The built-in menu.
pub fn default_presets() -> Vec<Preset> {
    vec![
        Preset::new("Kebab Frying", 90),
        Preset::new("Rice Cooking", 25 * 60),
        Preset::new("Test 1", 10),
        Preset::new("Water Motor", 30 * 60),
    ]
}

/// Case-insensitive lookup by name.
pub fn find<'a>(presets: &'a [Preset], name: &str) -> Option<&'a Preset> {
    let name = name.trim();
    presets.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}
