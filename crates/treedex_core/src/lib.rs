//! Core library for live folder-index blocks.
//!
//! A document can embed a small directive block that renders a navigable
//! Markdown index of files and subfolders at that location. This crate
//! implements everything behind one such rendered block:
//!
//! - [`event_bus`] - named-event publish/subscribe for cross-cutting
//!   notifications, currently just `"settingsUpdate"`
//! - [`block_config`] - forgiving line-oriented parser for the directive text
//! - [`resolver`] - selects which slice of the file tree a block lists
//! - [`binding`] - per-block render lifecycle: mount, re-render on change
//!   notifications, unmount with full subscription cleanup
//! - [`settings`] - plugin-wide settings whose updates fan out on the bus
//! - [`tree`] - collaborator contracts for the host file tree, the text
//!   renderer and the Markdown engine
//!
//! The host environment owns file-tree storage and the Markdown-to-visual
//! engine; this crate only consumes them through the traits in [`tree`].
//! A default text renderer lives in the `treedex_markdown` crate.

pub mod binding;
pub mod block_config;
pub mod event_bus;
pub mod resolver;
pub mod settings;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_util;

// Re-export commonly used types at crate root
pub use binding::{BindingId, BindingState, HostContext, IndexBinding, MountTarget};
pub use block_config::BlockConfig;
pub use event_bus::{EventBus, Listener, SETTINGS_UPDATE};
pub use resolver::resolve_entries;
pub use settings::{Settings, SettingsStore};
pub use tree::{
    EntryHandle, EntryKind, MarkdownEngine, ProduceOptions, RenderError, Subscription,
    TextRenderer, TreeChange, TreeChangeCallback, TreeEntry, Vault,
};
