//! Plugin-wide settings.
//!
//! Settings live outside any single binding. A change fans out as
//! [`SETTINGS_UPDATE`] on the event bus and every mounted binding
//! re-renders itself against the new values. Persistence and the settings
//! UI belong to the host.

use crate::event_bus::{EventBus, SETTINGS_UPDATE};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct Settings {
    /// Sort folders before files in the rendered index.
    pub sort_folders_first: bool,
    /// Keep the file extension in link labels.
    pub show_file_extension: bool,
    /// Depth limit applied when a block does not specify `depth`;
    /// `-1` lifts the limit entirely.
    pub default_recursion_limit: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sort_folders_first: true,
            show_file_extension: false,
            default_recursion_limit: 0,
        }
    }
}

/// Holds the live [`Settings`] and fans updates out on the bus.
pub struct SettingsStore {
    current: Mutex<Settings>,
    bus: Arc<EventBus>,
}

impl SettingsStore {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self::with_settings(Settings::default(), bus)
    }

    pub fn with_settings(settings: Settings, bus: Arc<EventBus>) -> Self {
        Self {
            current: Mutex::new(settings),
            bus,
        }
    }

    /// Snapshot of the current settings.
    pub fn current(&self) -> Settings {
        self.current.lock().clone()
    }

    /// Apply `update` to the settings, then emit [`SETTINGS_UPDATE`] with
    /// the serialized result as detail.
    pub fn update(&self, update: impl FnOnce(&mut Settings)) {
        let updated = {
            let mut current = self.current.lock();
            update(&mut current);
            current.clone()
        };
        let detail = serde_json::to_value(&updated).unwrap_or(Value::Null);
        tracing::debug!(settings = ?updated, "Settings updated, notifying bindings");
        self.bus.emit(SETTINGS_UPDATE, &detail);
    }
}
