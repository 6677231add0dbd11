//! Change sets produced by one reconciliation pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::identity::TrackedId;

/// Action to perform on one tracked identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Change {
    /// Materialize new content
    Add { content: String },

    /// Remove previously materialized content
    Delete,
}

impl Change {
    pub fn is_add(&self) -> bool {
        matches!(self, Change::Add { .. })
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, Change::Delete)
    }

    /// Payload for additions
    pub fn content(&self) -> Option<&str> {
        match self {
            Change::Add { content } => Some(content),
            Change::Delete => None,
        }
    }
}

/// Mapping from tracked identifier to action
///
/// Identifiers that need no change are absent. Ordered so that the JSON
/// rendering of two equal change sets is byte-identical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeSet {
    changes: BTreeMap<TrackedId, Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: TrackedId, content: impl Into<String>) {
        self.changes.insert(
            id,
            Change::Add {
                content: content.into(),
            },
        );
    }

    pub fn delete(&mut self, id: TrackedId) {
        self.changes.insert(id, Change::Delete);
    }

    pub fn get(&self, id: &TrackedId) -> Option<&Change> {
        self.changes.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TrackedId, &Change)> {
        self.changes.iter()
    }

    /// Identifiers being added, in order
    pub fn additions(&self) -> impl Iterator<Item = (&TrackedId, &str)> {
        self.changes
            .iter()
            .filter_map(|(id, change)| change.content().map(|c| (id, c)))
    }

    /// Identifiers being deleted, in order
    pub fn deletions(&self) -> impl Iterator<Item = &TrackedId> {
        self.changes
            .iter()
            .filter(|(_, change)| change.is_delete())
            .map(|(id, _)| id)
    }

    pub fn added_count(&self) -> usize {
        self.changes.values().filter(|c| c.is_add()).count()
    }

    pub fn deleted_count(&self) -> usize {
        self.changes.values().filter(|c| c.is_delete()).count()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}
