//! Minimal named-event publish/subscribe.
//!
//! Backs the cross-cutting notifications that are not tied to the file
//! tree, currently only [`SETTINGS_UPDATE`]. The bus tracks every
//! registration it performs itself, so [`EventBus::remove_all_listeners`]
//! can reverse all of them exactly without consulting any external
//! registry.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Emitted after the plugin settings changed. The detail is the serialized
/// [`Settings`](crate::settings::Settings).
pub const SETTINGS_UPDATE: &str = "settingsUpdate";

/// A registered event callback.
///
/// Listeners are matched by reference identity: clones of the same `Arc`
/// name the same registration for [`EventBus::off`], while two separately
/// created listeners are never equal even if their code is identical.
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<HashMap<String, Vec<Listener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronously deliver `detail` to every listener currently
    /// registered for `event`, in registration order. No effect when
    /// nobody listens.
    pub fn emit(&self, event: &str, detail: &Value) {
        // Snapshot under the lock, invoke outside it: a listener may call
        // back into the bus.
        let snapshot: Vec<Listener> = {
            let listeners = self.listeners.lock();
            match listeners.get(event) {
                Some(registered) => registered.clone(),
                None => return,
            }
        };
        for listener in snapshot {
            listener(detail);
        }
    }

    /// Register `listener` for `event`.
    ///
    /// No deduplication: registering the same listener twice yields two
    /// independent deliveries per emit.
    pub fn on(&self, event: &str, listener: Listener) {
        self.listeners
            .lock()
            .entry(event.to_string())
            .or_default()
            .push(listener);
    }

    /// Remove exactly one registration of `listener` for `event`, matched
    /// by reference identity. No-op when no such registration exists.
    pub fn off(&self, event: &str, listener: &Listener) {
        let mut listeners = self.listeners.lock();
        if let Some(registered) = listeners.get_mut(event) {
            if let Some(position) = registered.iter().position(|l| Arc::ptr_eq(l, listener)) {
                registered.remove(position);
            }
        }
    }

    /// Drop every registration for every event and reset the bookkeeping.
    /// Safe to call repeatedly and from teardown paths.
    pub fn remove_all_listeners(&self) {
        self.listeners.lock().clear();
    }
}
