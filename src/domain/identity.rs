//! Tracked identifiers for (source, channel, item, mode) materializations.
//!
//! Format: `<source-kind>-<channel-id>-<item-id>-<mode>`. YouTube ids may
//! themselves contain `-`, so every component is escaped before joining
//! (`%` → `%25`, `-` → `%2D`). Ids without those characters keep the plain
//! dashed form, and the encoding stays injective over the whole tuple.

use serde::{Deserialize, Serialize};

use super::mode::ContentMode;

/// Source kind for items listed from YouTube
pub const SOURCE_YOUTUBE: &str = "youtube";

const SEPARATOR: char = '-';

/// Stable key under which one materialization is recorded by the host store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackedId(String);

/// Components recovered from a tracked identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedParts {
    pub source_kind: String,
    pub channel_id: String,
    pub item_id: String,
    pub mode: String,
}

/// Derive the tracked identifier for one materialization
pub fn identify(source_kind: &str, channel_id: &str, item_id: &str, mode: ContentMode) -> TrackedId {
    TrackedId(format!(
        "{}{sep}{}{sep}{}{sep}{}",
        escape(source_kind),
        escape(channel_id),
        escape(item_id),
        escape(mode.as_str()),
        sep = SEPARATOR
    ))
}

impl TrackedId {
    /// Wrap an identifier read back from storage
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split the identifier into its components, if it is well formed
    pub fn parts(&self) -> Option<TrackedParts> {
        let fields: Vec<&str> = self.0.split(SEPARATOR).collect();
        if fields.len() != 4 {
            return None;
        }

        Some(TrackedParts {
            source_kind: unescape(fields[0])?,
            channel_id: unescape(fields[1])?,
            item_id: unescape(fields[2])?,
            mode: unescape(fields[3])?,
        })
    }

    /// Whether this identifier belongs to the given (source, channel, mode) scope
    pub fn in_scope(&self, source_kind: &str, channel_id: &str, mode: ContentMode) -> bool {
        match self.parts() {
            Some(parts) => {
                parts.source_kind == source_kind
                    && parts.channel_id == channel_id
                    && parts.mode == mode.as_str()
            }
            None => false,
        }
    }
}

impl std::fmt::Display for TrackedId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

fn escape(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for c in component.chars() {
        match c {
            '%' => out.push_str("%25"),
            SEPARATOR => out.push_str("%2D"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(component: &str) -> Option<String> {
    let mut out = String::with_capacity(component.len());
    let mut chars = component.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let code: String = chars.by_ref().take(2).collect();
        match code.as_str() {
            "25" => out.push('%'),
            "2D" => out.push(SEPARATOR),
            _ => return None,
        }
    }

    Some(out)
}
