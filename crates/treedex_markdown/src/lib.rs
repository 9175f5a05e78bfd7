//! Default Markdown text renderer for folder-index blocks.
//!
//! Turns a tree-entry collection into a nested Markdown bullet list: files
//! become links, folders become bold labels whose children are listed one
//! indent level deeper, down to the recursion limit. The output is plain
//! Markdown text; turning it into visual content is the host engine's job.

use percent_encoding::{percent_encode, AsciiSet, CONTROLS};
use std::sync::Arc;
use treedex_core::{
    EntryHandle, EntryKind, ProduceOptions, RenderError, Settings, SettingsStore, TextRenderer,
};

/// Characters that would break out of a `[label](target)` link target.
const LINK_TARGET: &AsciiSet = &CONTROLS.add(b' ').add(b'(').add(b')').add(b'%');

/// Formatting knobs for the generated Markdown text.
#[derive(Debug, Clone)]
pub struct IndexTextConfig {
    pub bullet: String,
    pub indent: usize,
}

impl Default for IndexTextConfig {
    fn default() -> Self {
        Self {
            bullet: String::from("-"),
            indent: 2,
        }
    }
}

/// The default [`TextRenderer`].
///
/// Reads the live [`Settings`] on every produce call, so a settings update
/// followed by the re-render it triggers picks up the new values.
pub struct MarkdownTextRenderer {
    config: IndexTextConfig,
    settings: Arc<SettingsStore>,
}

impl MarkdownTextRenderer {
    pub fn new(settings: Arc<SettingsStore>) -> Self {
        Self::with_config(IndexTextConfig::default(), settings)
    }

    pub fn with_config(config: IndexTextConfig, settings: Arc<SettingsStore>) -> Self {
        Self { config, settings }
    }

    /// Append one level of entries to `lines`.
    ///
    /// `budget` is the number of folder levels that may still be descended
    /// into; any negative value means unlimited, `0` stops the descent.
    fn build_lines(
        &self,
        entries: &[EntryHandle],
        level: usize,
        budget: i64,
        settings: &Settings,
        lines: &mut Vec<String>,
    ) {
        let mut sorted: Vec<EntryHandle> = entries.to_vec();
        sort_entries(&mut sorted, settings);

        for entry in sorted {
            match entry.kind() {
                EntryKind::File => {
                    lines.push(self.file_line(&entry, level, settings));
                }
                EntryKind::Folder => {
                    lines.push(self.folder_line(&entry, level));
                    if budget != 0 {
                        let remaining = if budget > 0 { budget - 1 } else { budget };
                        self.build_lines(&entry.children(), level + 1, remaining, settings, lines);
                    }
                }
                EntryKind::Unknown => {}
            }
        }
    }

    fn file_line(&self, entry: &EntryHandle, level: usize, settings: &Settings) -> String {
        let indent = self.indent_for(level);
        let bullet = &self.config.bullet;
        let label = display_label(&entry.name(), settings);
        let target = encode_link_target(&entry.path());
        format!("{indent}{bullet} [{label}]({target})")
    }

    fn folder_line(&self, entry: &EntryHandle, level: usize) -> String {
        let indent = self.indent_for(level);
        let bullet = &self.config.bullet;
        let name = entry.name();
        format!("{indent}{bullet} **{name}**")
    }

    fn indent_for(&self, level: usize) -> String {
        " ".repeat(self.config.indent).repeat(level)
    }
}

#[async_trait::async_trait]
impl TextRenderer for MarkdownTextRenderer {
    async fn produce(
        &self,
        entries: &[EntryHandle],
        options: ProduceOptions,
    ) -> Result<String, RenderError> {
        let settings = self.settings.current();
        let budget = options
            .recursion_limit
            .unwrap_or(settings.default_recursion_limit);

        let mut lines = Vec::new();
        self.build_lines(entries, 0, budget, &settings, &mut lines);
        tracing::debug!(
            entries = entries.len(),
            lines = lines.len(),
            recursion_limit = budget,
            "Built index text"
        );
        Ok(lines.join("\n"))
    }
}

fn sort_entries(entries: &mut [EntryHandle], settings: &Settings) {
    entries.sort_by(|a, b| {
        let by_name = || a.name().to_lowercase().cmp(&b.name().to_lowercase());
        if settings.sort_folders_first {
            let rank = |entry: &EntryHandle| match entry.kind() {
                EntryKind::Folder => 0,
                _ => 1,
            };
            rank(a).cmp(&rank(b)).then_with(by_name)
        } else {
            by_name()
        }
    });
}

fn display_label(name: &str, settings: &Settings) -> String {
    if settings.show_file_extension {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

fn encode_link_target(path: &str) -> String {
    percent_encode(path.as_bytes(), LINK_TARGET).to_string()
}
