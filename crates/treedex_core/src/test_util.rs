//! Hand-rolled test doubles shared by the crate's tests: an in-memory
//! vault, a spy text renderer and a collecting Markdown engine.

use crate::binding::{BindingId, MountTarget};
use crate::tree::{
    EntryHandle, EntryKind, MarkdownEngine, ProduceOptions, RenderError, Subscription,
    TextRenderer, TreeChange, TreeChangeCallback, TreeEntry, Vault,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

pub struct MemoryEntry {
    path: String,
    kind: EntryKind,
    parent: Mutex<Option<Weak<MemoryEntry>>>,
    children: Mutex<Vec<Arc<MemoryEntry>>>,
}

impl MemoryEntry {
    pub fn file(path: &str) -> Arc<Self> {
        Self::with_kind(path, EntryKind::File)
    }

    pub fn folder(path: &str) -> Arc<Self> {
        Self::with_kind(path, EntryKind::Folder)
    }

    pub fn unknown(path: &str) -> Arc<Self> {
        Self::with_kind(path, EntryKind::Unknown)
    }

    fn with_kind(path: &str, kind: EntryKind) -> Arc<Self> {
        Arc::new(Self {
            path: path.to_string(),
            kind,
            parent: Mutex::new(None),
            children: Mutex::new(Vec::new()),
        })
    }

    pub fn attach(parent: &Arc<MemoryEntry>, child: &Arc<MemoryEntry>) {
        *child.parent.lock() = Some(Arc::downgrade(parent));
        parent.children.lock().push(child.clone());
    }
}

impl TreeEntry for MemoryEntry {
    fn path(&self) -> String {
        self.path.clone()
    }

    fn name(&self) -> String {
        match self.path.rsplit_once('/') {
            Some((_, name)) => name.to_string(),
            None => self.path.clone(),
        }
    }

    fn kind(&self) -> EntryKind {
        self.kind
    }

    fn parent(&self) -> Option<EntryHandle> {
        self.parent
            .lock()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|parent| parent as EntryHandle)
    }

    fn children(&self) -> Vec<EntryHandle> {
        self.children
            .lock()
            .iter()
            .map(|child| child.clone() as EntryHandle)
            .collect()
    }
}

type Registration = (u64, TreeChange, TreeChangeCallback);

enum LayoutState {
    Pending(Vec<Box<dyn FnOnce() + Send>>),
    Ready,
}

/// In-memory [`Vault`] with manually fired change notifications and a
/// controllable layout-ready gate (starts pending, like a host mid-startup).
pub struct MemoryVault {
    entries: Mutex<HashMap<String, Arc<MemoryEntry>>>,
    registrations: Arc<Mutex<Vec<Registration>>>,
    next_registration: AtomicU64,
    layout: Mutex<LayoutState>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            registrations: Arc::new(Mutex::new(Vec::new())),
            next_registration: AtomicU64::new(0),
            layout: Mutex::new(LayoutState::Pending(Vec::new())),
        }
    }

    pub fn add(&self, entry: Arc<MemoryEntry>) -> Arc<MemoryEntry> {
        self.entries
            .lock()
            .insert(entry.path.clone(), entry.clone());
        entry
    }

    pub fn add_folder(&self, path: &str) -> Arc<MemoryEntry> {
        self.add(MemoryEntry::folder(path))
    }

    pub fn add_folder_in(&self, path: &str, parent: &Arc<MemoryEntry>) -> Arc<MemoryEntry> {
        let folder = self.add(MemoryEntry::folder(path));
        MemoryEntry::attach(parent, &folder);
        folder
    }

    pub fn add_file_in(&self, path: &str, parent: &Arc<MemoryEntry>) -> Arc<MemoryEntry> {
        let file = self.add(MemoryEntry::file(path));
        MemoryEntry::attach(parent, &file);
        file
    }

    pub fn remove(&self, path: &str) {
        let Some(entry) = self.entries.lock().remove(path) else {
            return;
        };
        let parent = entry.parent.lock().as_ref().and_then(Weak::upgrade);
        if let Some(parent) = parent {
            parent.children.lock().retain(|child| child.path != path);
        }
    }

    /// Deliver one change notification to every matching registration,
    /// the way the host's notification transport would.
    pub fn notify(&self, change: TreeChange) {
        let callbacks: Vec<TreeChangeCallback> = self
            .registrations
            .lock()
            .iter()
            .filter(|(_, registered, _)| *registered == change)
            .map(|(_, _, callback)| callback.clone())
            .collect();
        for callback in callbacks {
            callback(change);
        }
    }

    pub fn registration_count(&self) -> usize {
        self.registrations.lock().len()
    }

    /// Flip the layout gate to ready and run the deferred callbacks.
    pub fn finish_layout(&self) {
        let deferred = {
            let mut layout = self.layout.lock();
            match std::mem::replace(&mut *layout, LayoutState::Ready) {
                LayoutState::Pending(deferred) => deferred,
                LayoutState::Ready => Vec::new(),
            }
        };
        for callback in deferred {
            callback();
        }
    }
}

impl Vault for MemoryVault {
    fn lookup(&self, path: &str) -> Option<EntryHandle> {
        self.entries
            .lock()
            .get(path)
            .map(|entry| entry.clone() as EntryHandle)
    }

    fn on_tree_change(&self, change: TreeChange, callback: TreeChangeCallback) -> Subscription {
        let id = self.next_registration.fetch_add(1, Ordering::SeqCst);
        self.registrations.lock().push((id, change, callback));
        let registrations = self.registrations.clone();
        Subscription::new(move || {
            registrations
                .lock()
                .retain(|(registered, _, _)| *registered != id);
        })
    }

    fn on_layout_ready(&self, f: Box<dyn FnOnce() + Send>) {
        let mut layout = self.layout.lock();
        match &mut *layout {
            LayoutState::Pending(deferred) => deferred.push(f),
            LayoutState::Ready => {
                drop(layout);
                f();
            }
        }
    }
}

/// Text renderer double: joins entry names, counts calls, records the last
/// options it was handed.
#[derive(Default)]
pub struct SpyRenderer {
    calls: AtomicUsize,
    last_options: Mutex<Option<ProduceOptions>>,
}

impl SpyRenderer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<ProduceOptions> {
        *self.last_options.lock()
    }
}

#[async_trait::async_trait]
impl TextRenderer for SpyRenderer {
    async fn produce(
        &self,
        entries: &[EntryHandle],
        options: ProduceOptions,
    ) -> Result<String, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock() = Some(options);
        Ok(entries
            .iter()
            .map(|entry| entry.name())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// Markdown engine double: "renders" by storing the text in the target and
/// keeping a log of everything it was asked to render.
#[derive(Default)]
pub struct CollectingEngine {
    renders: Mutex<Vec<(BindingId, String)>>,
}

impl CollectingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn renders(&self) -> Vec<(BindingId, String)> {
        self.renders.lock().clone()
    }
}

#[async_trait::async_trait]
impl MarkdownEngine for CollectingEngine {
    async fn render(
        &self,
        text: &str,
        target: &MountTarget,
        _source_path: &str,
        scope: BindingId,
    ) -> Result<(), RenderError> {
        self.renders.lock().push((scope, text.to_string()));
        target.set_content(text.to_string());
        Ok(())
    }
}

/// Engine double that always fails.
pub struct FailingEngine;

#[async_trait::async_trait]
impl MarkdownEngine for FailingEngine {
    async fn render(
        &self,
        _text: &str,
        _target: &MountTarget,
        _source_path: &str,
        _scope: BindingId,
    ) -> Result<(), RenderError> {
        Err(RenderError::Other("engine offline".to_string()))
    }
}

/// Poll `predicate` until it holds, for at most ~1s.
pub async fn wait_until(predicate: impl Fn() -> bool) -> bool {
    for _ in 0..200 {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    predicate()
}
