//! Reconciliation Integration Tests
//!
//! Tests for the add/delete set difference, the no-delete flag and the
//! fixed-point behavior of repeated passes.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use chansync::adapters::{ContentFetcher, VideoUrlFetcher};
use chansync::core::{reconcile, ReconcileOptions};
use chansync::domain::{
    identify, CatalogItem, Change, ContentMode, PriorState, TrackedId, SOURCE_YOUTUBE,
};
use chrono::Utc;

const CHANNEL: &str = "UC_x5XG1OV2P6uZZ5FSM9Ttw";

fn options() -> ReconcileOptions {
    ReconcileOptions::new(SOURCE_YOUTUBE, CHANNEL, ContentMode::Video)
}

fn id(item_id: &str) -> TrackedId {
    identify(SOURCE_YOUTUBE, CHANNEL, item_id, ContentMode::Video)
}

fn items(ids: &[&str]) -> Vec<CatalogItem> {
    ids.iter()
        .map(|id| CatalogItem::new(*id, Utc::now()))
        .collect()
}

/// Fetcher that counts calls and fails for one configured item
struct CountingFetcher {
    calls: AtomicUsize,
    fail_on: Option<&'static str>,
}

impl CountingFetcher {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on: None,
        }
    }

    fn failing_on(item_id: &'static str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on: Some(item_id),
        }
    }
}

#[async_trait]
impl ContentFetcher for CountingFetcher {
    fn mode(&self) -> ContentMode {
        ContentMode::Video
    }

    async fn fetch(&self, item: &CatalogItem) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on == Some(item.id.as_str()) {
            anyhow::bail!("network unreachable");
        }
        Ok(format!("content:{}", item.id))
    }
}

#[tokio::test]
async fn test_scenario_empty_prior_adds_all() {
    let changes = reconcile(&items(&["v1", "v2"]), &PriorState::new(), &options(), &VideoUrlFetcher)
        .await
        .unwrap();

    assert_eq!(changes.len(), 2);
    assert_eq!(
        changes.get(&id("v1")),
        Some(&Change::Add {
            content: "https://www.youtube.com/watch?v=v1".to_string()
        })
    );
    assert_eq!(
        changes.get(&id("v2")),
        Some(&Change::Add {
            content: "https://www.youtube.com/watch?v=v2".to_string()
        })
    );
}

#[tokio::test]
async fn test_scenario_item_leaving_filter_is_deleted() {
    let prior = PriorState::from_ids([id("v1")], Utc::now());
    let changes = reconcile(&items(&["v2"]), &prior, &options(), &VideoUrlFetcher)
        .await
        .unwrap();

    assert_eq!(changes.len(), 2);
    assert_eq!(changes.get(&id("v1")), Some(&Change::Delete));
    assert!(changes.get(&id("v2")).unwrap().is_add());
}

#[tokio::test]
async fn test_scenario_no_delete_keeps_prior_items() {
    let prior = PriorState::from_ids([id("v1")], Utc::now());
    let changes = reconcile(
        &items(&["v2"]),
        &prior,
        &options().with_no_delete(true),
        &VideoUrlFetcher,
    )
    .await
    .unwrap();

    assert_eq!(changes.len(), 1);
    assert!(changes.get(&id("v1")).is_none());
    assert!(changes.get(&id("v2")).unwrap().is_add());
}

#[tokio::test]
async fn test_existing_items_are_never_refetched() {
    let fetcher = CountingFetcher::new();
    let prior = PriorState::from_ids([id("v1"), id("v2")], Utc::now());

    let changes = reconcile(&items(&["v1", "v2", "v3"]), &prior, &options(), &fetcher)
        .await
        .unwrap();

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    assert_eq!(changes.len(), 1);
    assert_eq!(changes.added_count(), 1);
}

#[tokio::test]
async fn test_same_inputs_same_change_set() {
    let prior = PriorState::from_ids([id("v1"), id("old")], Utc::now());
    let current = items(&["v1", "v2", "v3"]);

    let first = reconcile(&current, &prior, &options(), &CountingFetcher::new())
        .await
        .unwrap();
    let second = reconcile(&current, &prior, &options(), &CountingFetcher::new())
        .await
        .unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_applying_changes_reaches_fixed_point() {
    let mut prior = PriorState::from_ids([id("v1"), id("old")], Utc::now());
    let current = items(&["v1", "v2", "v3"]);

    let changes = reconcile(&current, &prior, &options(), &VideoUrlFetcher)
        .await
        .unwrap();
    assert_eq!(changes.added_count(), 2);
    assert_eq!(changes.deleted_count(), 1);

    prior.apply(&changes, Utc::now());
    assert_eq!(prior.len(), 3);

    let again = reconcile(&current, &prior, &options(), &VideoUrlFetcher)
        .await
        .unwrap();
    assert!(again.is_empty());
}

#[tokio::test]
async fn test_fetch_failure_fails_whole_pass() {
    let fetcher = CountingFetcher::failing_on("v2");
    let result = reconcile(&items(&["v1", "v2", "v3"]), &PriorState::new(), &options(), &fetcher).await;

    let err = result.unwrap_err();
    assert!(format!("{:#}", err).contains("network unreachable"));
}

#[tokio::test]
async fn test_absent_prior_entries_are_deleted_across_modes_and_channels() {
    let metadata = identify(SOURCE_YOUTUBE, CHANNEL, "v1", ContentMode::Metadata);
    let other_channel = identify(SOURCE_YOUTUBE, "UCother", "v1", ContentMode::Video);
    let prior = PriorState::from_ids([metadata.clone(), other_channel.clone()], Utc::now());

    let changes = reconcile(&items(&["v1"]), &prior, &options(), &VideoUrlFetcher)
        .await
        .unwrap();

    assert_eq!(changes.added_count(), 1);
    assert_eq!(changes.deleted_count(), 2);
    assert_eq!(changes.get(&metadata), Some(&Change::Delete));
    assert_eq!(changes.get(&other_channel), Some(&Change::Delete));
}
