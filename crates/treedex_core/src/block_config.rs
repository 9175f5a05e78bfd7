//! Directive block configuration.
//!
//! The content of an embedded index block is a handful of `key: value`
//! lines. Parsing is deliberately forgiving: blocks are hand-authored, so
//! a malformed line degrades to "option unset" instead of aborting the
//! whole render.

use once_cell::sync::Lazy;
use regex::Regex;

static CONFIG_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z0-9_-]+)\s*:\s*(.+)$").unwrap());

/// Options parsed out of one directive block.
///
/// Built fresh from the raw block text on every render pass and discarded
/// afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockConfig {
    /// Recursion-depth limit for the text renderer, clamped to a minimum
    /// of `-1` (`-1` = unlimited). Unset when the block does not specify
    /// one; the renderer picks its own default then.
    pub depth: Option<i64>,
    /// Explicit target path overriding the document's own location.
    pub path: Option<String>,
}

impl BlockConfig {
    /// Parse raw block text.
    ///
    /// Never fails: blank lines, `#` comments, unknown keys, lines that are
    /// not `key: value` and unparsable values are all silently skipped.
    /// Keys are case-insensitive and the last occurrence of a key wins.
    pub fn parse(source: &str) -> Self {
        let mut config = Self::default();
        for line in source.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some(caps) = CONFIG_LINE.captures(trimmed) else {
                continue;
            };
            let key = caps[1].to_ascii_lowercase();
            let value = caps[2].trim();
            match key.as_str() {
                "depth" => {
                    if let Ok(depth) = value.parse::<i64>() {
                        config.depth = Some(depth.max(-1));
                    }
                }
                "path" => {
                    config.path = Some(value.to_string());
                }
                _ => {}
            }
        }
        config
    }
}
