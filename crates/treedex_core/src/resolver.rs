//! Tree-slice selection.
//!
//! Decides which collection of tree entries one index block lists. The
//! listing policy: an explicit `path` wins over the document's own
//! location; a file lists its parent's children (its own sibling set,
//! itself included), a folder lists its own children, anything else lists
//! nothing.

use crate::block_config::BlockConfig;
use crate::tree::{EntryHandle, EntryKind, Vault};

/// Resolve the entry collection for one render pass.
///
/// Returns `None` when the target path resolves to nothing. That is not an
/// error: the path may start existing later, and the binding re-renders on
/// the next tree change anyway.
pub fn resolve_entries(
    vault: &dyn Vault,
    config: &BlockConfig,
    source_path: &str,
) -> Option<Vec<EntryHandle>> {
    let target_path = config.path.as_deref().unwrap_or(source_path);
    let target = vault.lookup(target_path)?;
    let entries = match target.kind() {
        EntryKind::File => target
            .parent()
            .map(|parent| parent.children())
            .unwrap_or_default(),
        EntryKind::Folder => target.children(),
        EntryKind::Unknown => Vec::new(),
    };
    Some(entries)
}
