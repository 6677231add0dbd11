//! Reconciliation of the filtered catalog against prior state.
//!
//! The set difference is computed synchronously by [`plan`]; [`reconcile`]
//! then fetches content for each addition. Nothing is persisted here: the
//! resulting [`ChangeSet`] is handed to the host, which applies it.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::adapters::ContentFetcher;
use crate::domain::{identify, CatalogItem, ChangeSet, ContentMode, PriorState, TrackedId};

/// Parameters that identify what a pass reconciles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Source kind prefix for tracked identifiers
    pub source_kind: String,

    /// Channel the items were listed from
    pub channel_id: String,

    /// Content mode being materialized
    pub mode: ContentMode,

    /// Keep previously added items even when they stop passing the filter
    pub no_delete: bool,
}

impl ReconcileOptions {
    pub fn new(source_kind: impl Into<String>, channel_id: impl Into<String>, mode: ContentMode) -> Self {
        Self {
            source_kind: source_kind.into(),
            channel_id: channel_id.into(),
            mode,
            no_delete: false,
        }
    }

    pub fn with_no_delete(mut self, no_delete: bool) -> Self {
        self.no_delete = no_delete;
        self
    }

    /// Tracked identifier for one item under these options
    pub fn identify(&self, item: &CatalogItem) -> TrackedId {
        identify(&self.source_kind, &self.channel_id, &item.id, self.mode)
    }
}

/// Set difference between the current catalog and prior state
#[derive(Debug, Clone)]
pub struct ReconcilePlan<'a> {
    /// New identifiers and the items that produce their content
    pub additions: Vec<(TrackedId, &'a CatalogItem)>,

    /// Identifiers to remove
    pub deletions: Vec<TrackedId>,
}

impl ReconcilePlan<'_> {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.deletions.is_empty()
    }
}

/// Compute which identifiers to add and delete.
///
/// Items already present in `prior` are left alone. Every prior identifier
/// absent from the current set is deleted unless `no_delete` is set; hosts
/// that share one store between channels or modes pass only the matching
/// slice (see [`PriorState::scoped`]).
pub fn plan<'a>(
    items: &'a [CatalogItem],
    prior: &PriorState,
    options: &ReconcileOptions,
) -> ReconcilePlan<'a> {
    let current: BTreeMap<TrackedId, &CatalogItem> = items
        .iter()
        .map(|item| (options.identify(item), item))
        .collect();

    let additions = current
        .iter()
        .filter(|(id, _)| !prior.contains(id))
        .map(|(id, item)| (id.clone(), *item))
        .collect();

    let deletions = if options.no_delete {
        Vec::new()
    } else {
        prior
            .ids()
            .filter(|id| !current.contains_key(*id))
            .cloned()
            .collect()
    };

    ReconcilePlan {
        additions,
        deletions,
    }
}

/// Produce the change set for one pass.
///
/// Any fetch failure fails the whole pass; no partial change set is returned.
pub async fn reconcile(
    items: &[CatalogItem],
    prior: &PriorState,
    options: &ReconcileOptions,
    fetcher: &dyn ContentFetcher,
) -> Result<ChangeSet> {
    let plan = plan(items, prior, options);
    let mut changes = ChangeSet::new();

    for (id, item) in plan.additions {
        let content = fetcher
            .fetch(item)
            .await
            .with_context(|| format!("Failed to fetch {} content for item {}", options.mode, item.id))?;
        debug!(%id, bytes = content.len(), "Add");
        changes.add(id, content);
    }

    for id in plan.deletions {
        debug!(%id, "Delete");
        changes.delete(id);
    }

    info!(
        current = items.len(),
        prior = prior.len(),
        added = changes.added_count(),
        deleted = changes.deleted_count(),
        "Reconciled"
    );

    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SOURCE_YOUTUBE;
    use chrono::Utc;

    fn options() -> ReconcileOptions {
        ReconcileOptions::new(SOURCE_YOUTUBE, "UCchan", ContentMode::Video)
    }

    fn items(ids: &[&str]) -> Vec<CatalogItem> {
        ids.iter().map(|id| CatalogItem::new(*id, Utc::now())).collect()
    }

    #[test]
    fn test_plan_empty_prior_adds_everything() {
        let items = items(&["v1", "v2"]);
        let plan = plan(&items, &PriorState::new(), &options());

        assert_eq!(plan.additions.len(), 2);
        assert!(plan.deletions.is_empty());
    }

    #[test]
    fn test_plan_skips_already_materialized() {
        let items = items(&["v1", "v2"]);
        let prior = PriorState::from_ids([options().identify(&items[0])], Utc::now());
        let plan = plan(&items, &prior, &options());

        assert_eq!(plan.additions.len(), 1);
        assert_eq!(plan.additions[0].1.id, "v2");
        assert!(plan.deletions.is_empty());
    }

    #[test]
    fn test_plan_deletes_every_absent_prior_entry() {
        let items = items(&["v1"]);
        let other_mode = identify(SOURCE_YOUTUBE, "UCchan", "v1", ContentMode::Metadata);
        let other_channel = identify(SOURCE_YOUTUBE, "UCother", "v9", ContentMode::Video);
        let foreign = TrackedId::from_raw("unrelated entry");
        let prior = PriorState::from_ids(
            [other_mode.clone(), other_channel.clone(), foreign.clone()],
            Utc::now(),
        );

        let plan = plan(&items, &prior, &options());
        assert_eq!(plan.deletions.len(), 3);
        assert!(plan.deletions.contains(&other_mode));
        assert!(plan.deletions.contains(&other_channel));
        assert!(plan.deletions.contains(&foreign));
        assert_eq!(plan.additions.len(), 1);
    }

    #[test]
    fn test_plan_dedupes_repeated_items() {
        let items = items(&["v1", "v1"]);
        let plan = plan(&items, &PriorState::new(), &options());
        assert_eq!(plan.additions.len(), 1);
    }

    #[test]
    fn test_plan_no_delete() {
        let stale = identify(SOURCE_YOUTUBE, "UCchan", "old", ContentMode::Video);
        let prior = PriorState::from_ids([stale], Utc::now());

        let plan = plan(&[], &prior, &options().with_no_delete(true));
        assert!(plan.is_empty());
    }
}
