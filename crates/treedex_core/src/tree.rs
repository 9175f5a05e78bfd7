//! Collaborator contracts at the host boundary.
//!
//! The host environment owns the file tree, the Markdown-to-visual engine
//! and the routine turning tree entries into Markdown text. This module
//! pins down the slice of their behavior the index core relies on;
//! everything else about them is the host's business.

use crate::binding::{BindingId, MountTarget};
use std::sync::Arc;

/// Node kind as reported by the host tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    File,
    Folder,
    /// A node kind this core does not recognize; it resolves but lists nothing.
    Unknown,
}

/// Borrowed handle to a node in the host's file tree.
///
/// Handles are resolved by path lookup at render time and never cached
/// across renders, the tree may have changed in between.
pub trait TreeEntry: Send + Sync {
    /// Tree path of this entry, unique within the vault.
    fn path(&self) -> String;

    /// Display name, typically the last path segment.
    fn name(&self) -> String;

    fn kind(&self) -> EntryKind;

    /// Parent folder, `None` at the tree root.
    fn parent(&self) -> Option<EntryHandle>;

    /// Child entries; empty for files.
    fn children(&self) -> Vec<EntryHandle>;
}

pub type EntryHandle = Arc<dyn TreeEntry>;

/// Tree change notifications a mounted binding re-renders on.
///
/// The payload carries no details on purpose: bindings re-render
/// unconditionally on any of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeChange {
    Create,
    Delete,
    Rename,
}

pub type TreeChangeCallback = Arc<dyn Fn(TreeChange) + Send + Sync>;

/// Handle releasing one registration made against the host.
///
/// Disposal happens at most once; dropping an undisposed subscription
/// disposes it.
pub struct Subscription(Option<Box<dyn FnOnce() + Send>>);

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self(Some(Box::new(release)))
    }

    pub fn dispose(&mut self) {
        if let Some(release) = self.0.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// The host's file-tree provider.
pub trait Vault: Send + Sync {
    /// Resolve a path to a tree entry, `None` when nothing lives there.
    fn lookup(&self, path: &str) -> Option<EntryHandle>;

    /// Register `callback` for one kind of tree change. The returned
    /// [`Subscription`] releases exactly that registration.
    fn on_tree_change(&self, change: TreeChange, callback: TreeChangeCallback) -> Subscription;

    /// Run `f` once the host layout is fully ready. Hosts that are already
    /// past startup may invoke it immediately.
    fn on_layout_ready(&self, f: Box<dyn FnOnce() + Send>);
}

/// Error type for render passes.
///
/// Collaborator failures pass through here unwrapped; this core adds no
/// context of its own and leaves surfacing them to the host.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// I/O error during tree traversal or rendering.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// General rendering error.
    #[error("render error: {0}")]
    Other(String),
}

/// Options handed to a [`TextRenderer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProduceOptions {
    /// Folder levels the renderer may descend below the given collection;
    /// `-1` lifts the limit. When unset the renderer picks its own default.
    pub recursion_limit: Option<i64>,
}

/// Converts an entry collection into Markdown text.
///
/// A pure function of its inputs from the binding's perspective: the same
/// entries and options must yield the same text.
#[async_trait::async_trait]
pub trait TextRenderer: Send + Sync {
    async fn produce(
        &self,
        entries: &[EntryHandle],
        options: ProduceOptions,
    ) -> Result<String, RenderError>;
}

/// The host's Markdown-to-visual engine.
#[async_trait::async_trait]
pub trait MarkdownEngine: Send + Sync {
    /// Render `text` into `target`. `source_path` anchors relative links;
    /// `scope` identifies the binding so the host can drop rendering side
    /// effects once that binding unmounts.
    async fn render(
        &self,
        text: &str,
        target: &MountTarget,
        source_path: &str,
        scope: BindingId,
    ) -> Result<(), RenderError>;
}
