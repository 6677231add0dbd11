//! Prior state: what the host store currently holds.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::change::{Change, ChangeSet};
use super::identity::TrackedId;
use super::mode::ContentMode;

/// Last-seen marker recorded for a materialized identifier
///
/// The reconciler only looks at which identifiers are present; the marker
/// is for the host's own bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    /// When the content was recorded
    pub recorded_at: DateTime<Utc>,

    /// Digest of the materialized content (`sha256:<hex>`)
    #[serde(default)]
    pub digest: Option<String>,
}

impl Marker {
    pub fn new(recorded_at: DateTime<Utc>) -> Self {
        Self {
            recorded_at,
            digest: None,
        }
    }
}

/// Snapshot of materialized identifiers supplied at the start of a pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriorState {
    entries: BTreeMap<TrackedId, Marker>,
}

impl PriorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state where every identifier was recorded at `recorded_at`
    pub fn from_ids(ids: impl IntoIterator<Item = TrackedId>, recorded_at: DateTime<Utc>) -> Self {
        Self {
            entries: ids
                .into_iter()
                .map(|id| (id, Marker::new(recorded_at)))
                .collect(),
        }
    }

    pub fn contains(&self, id: &TrackedId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn get(&self, id: &TrackedId) -> Option<&Marker> {
        self.entries.get(id)
    }

    pub fn insert(&mut self, id: TrackedId, marker: Marker) {
        self.entries.insert(id, marker);
    }

    pub fn ids(&self) -> impl Iterator<Item = &TrackedId> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TrackedId, &Marker)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries recorded for one (source, channel, mode) sync.
    ///
    /// Hosts that keep several syncs in one store reconcile each against its
    /// own slice; applying the resulting change set to the full state then
    /// leaves the other slices untouched.
    pub fn scoped(&self, source_kind: &str, channel_id: &str, mode: ContentMode) -> PriorState {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(id, _)| id.in_scope(source_kind, channel_id, mode))
                .map(|(id, marker)| (id.clone(), marker.clone()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fold a change set into this state
    pub fn apply(&mut self, changes: &ChangeSet, recorded_at: DateTime<Utc>) {
        for (id, change) in changes.iter() {
            match change {
                Change::Add { content } => {
                    self.entries.insert(
                        id.clone(),
                        Marker {
                            recorded_at,
                            digest: Some(content_digest(content)),
                        },
                    );
                }
                Change::Delete => {
                    self.entries.remove(id);
                }
            }
        }
    }
}

/// Digest of materialized content (`sha256:<hex>`)
pub fn content_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}
