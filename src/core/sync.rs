//! One synchronization pass for a channel.
//!
//! A pass lists the channel, filters the catalog and reconciles it against
//! the prior state supplied by the host. Either the whole pass succeeds or
//! the host receives an empty change set.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::adapters::{
    fetcher_for, CatalogLister, ContentFetcher, CredentialProvider, YouTubeClient, API_KEY_VAR,
};
use crate::config::{ConfigError, SyncSettings};
use crate::domain::{CatalogItem, ChangeSet, PriorState, SOURCE_YOUTUBE};

use super::filter::Rejection;
use super::reconcile::{reconcile, ReconcileOptions};

/// Capability interface a host drives an integration through
#[async_trait]
pub trait Integration: Send + Sync {
    /// Human-readable integration name
    fn name(&self) -> &str;

    /// Credentials that must be present before initialization
    fn required_credentials() -> &'static [&'static str]
    where
        Self: Sized;

    /// Validate settings and credentials and build the integration
    fn initialize(
        settings: SyncSettings,
        credentials: &dyn CredentialProvider,
    ) -> Result<Self, ConfigError>
    where
        Self: Sized;

    /// Compute the change set against the host's prior state.
    ///
    /// Failures are logged and yield an empty change set.
    async fn compute_updates(&self, prior: &PriorState) -> ChangeSet;
}

/// Synchronizes one YouTube channel in one content mode
pub struct ChannelSync {
    settings: SyncSettings,
    lister: Box<dyn CatalogLister>,
    fetcher: Box<dyn ContentFetcher>,
}

impl ChannelSync {
    /// Build from explicit collaborators
    pub fn new(
        settings: SyncSettings,
        lister: Box<dyn CatalogLister>,
        fetcher: Box<dyn ContentFetcher>,
    ) -> Self {
        Self {
            settings,
            lister,
            fetcher,
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Reconciliation parameters for this channel
    pub fn options(&self) -> ReconcileOptions {
        ReconcileOptions::new(SOURCE_YOUTUBE, &self.settings.channel_id, self.settings.mode)
            .with_no_delete(self.settings.no_delete)
    }

    /// Slice of a shared host state that belongs to this sync
    pub fn scoped_prior(&self, state: &PriorState) -> PriorState {
        state.scoped(SOURCE_YOUTUBE, &self.settings.channel_id, self.settings.mode)
    }

    /// List the channel and return each item with its filter verdict
    pub async fn evaluate_catalog(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(CatalogItem, Result<(), Rejection>)>> {
        let items = self
            .lister
            .list_items(&self.settings.channel_id)
            .await
            .with_context(|| format!("Failed to list channel {}", self.settings.channel_id))?;

        Ok(items
            .into_iter()
            .map(|item| {
                let verdict = self.settings.filter.check(&item, now);
                (item, verdict)
            })
            .collect())
    }

    /// Run a pass, surfacing any failure to the caller
    #[instrument(
        skip(self, prior),
        fields(run_id = %Uuid::new_v4(), channel = %self.settings.channel_id, mode = %self.settings.mode)
    )]
    pub async fn try_compute_updates(&self, prior: &PriorState, now: DateTime<Utc>) -> Result<ChangeSet> {
        let items = self
            .lister
            .list_items(&self.settings.channel_id)
            .await
            .with_context(|| format!("Failed to list channel {}", self.settings.channel_id))?;
        let listed = items.len();

        let filtered = self.settings.filter.apply(items, now);
        info!(listed, passed = filtered.len(), "Filtered catalog");

        reconcile(&filtered, prior, &self.options(), self.fetcher.as_ref()).await
    }
}

#[async_trait]
impl Integration for ChannelSync {
    fn name(&self) -> &str {
        "youtube"
    }

    fn required_credentials() -> &'static [&'static str] {
        &[API_KEY_VAR]
    }

    fn initialize(
        settings: SyncSettings,
        credentials: &dyn CredentialProvider,
    ) -> Result<Self, ConfigError> {
        if settings.channel_id.trim().is_empty() {
            return Err(ConfigError::MissingField("channel_id"));
        }

        let api_key = credentials
            .credential(API_KEY_VAR)
            .ok_or_else(|| ConfigError::MissingCredential(API_KEY_VAR.to_string()))?;

        let fetcher = fetcher_for(&settings)?;
        let lister = YouTubeClient::new(api_key).with_base_url(settings.api_base_url.clone());

        Ok(Self::new(settings, Box::new(lister), fetcher))
    }

    async fn compute_updates(&self, prior: &PriorState) -> ChangeSet {
        match self.try_compute_updates(prior, Utc::now()).await {
            Ok(changes) => changes,
            Err(e) => {
                error!(channel = %self.settings.channel_id, error = ?e, "Sync pass failed, no changes produced");
                ChangeSet::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{StaticCredentials, VideoUrlFetcher};
    use crate::domain::ContentMode;

    struct FailingLister;

    #[async_trait]
    impl CatalogLister for FailingLister {
        async fn list_items(&self, _channel_id: &str) -> Result<Vec<CatalogItem>> {
            anyhow::bail!("quota exceeded")
        }
    }

    struct FixedLister(Vec<CatalogItem>);

    #[async_trait]
    impl CatalogLister for FixedLister {
        async fn list_items(&self, _channel_id: &str) -> Result<Vec<CatalogItem>> {
            Ok(self.0.clone())
        }
    }

    fn settings(mode: ContentMode) -> SyncSettings {
        let mut settings = SyncSettings::new("UCchan");
        settings.mode = mode;
        settings
    }

    #[test]
    fn test_initialize_requires_api_key() {
        let result = ChannelSync::initialize(settings(ContentMode::Video), &StaticCredentials::new());
        assert!(matches!(result, Err(ConfigError::MissingCredential(name)) if name == API_KEY_VAR));
    }

    #[test]
    fn test_initialize_rejects_audio() {
        let creds = StaticCredentials::new().with(API_KEY_VAR, "key");
        let result = ChannelSync::initialize(settings(ContentMode::Audio), &creds);
        assert!(matches!(result, Err(ConfigError::UnsupportedMode(ContentMode::Audio))));
    }

    #[test]
    fn test_initialize_rejects_blank_channel() {
        let creds = StaticCredentials::new().with(API_KEY_VAR, "key");
        let result = ChannelSync::initialize(SyncSettings::new("  "), &creds);
        assert!(matches!(result, Err(ConfigError::MissingField("channel_id"))));
    }

    #[test]
    fn test_initialize_ok() {
        let creds = StaticCredentials::new().with(API_KEY_VAR, "key");
        let sync = ChannelSync::initialize(settings(ContentMode::Video), &creds).unwrap();
        assert_eq!(sync.name(), "youtube");
        assert_eq!(sync.options().mode, ContentMode::Video);
    }

    #[test]
    fn test_required_credentials() {
        assert_eq!(ChannelSync::required_credentials(), &[API_KEY_VAR]);
    }

    #[tokio::test]
    async fn test_listing_failure_yields_empty_change_set() {
        let sync = ChannelSync::new(
            settings(ContentMode::Video),
            Box::new(FailingLister),
            Box::new(VideoUrlFetcher),
        );

        let changes = sync.compute_updates(&PriorState::new()).await;
        assert!(changes.is_empty());
        assert!(sync
            .try_compute_updates(&PriorState::new(), Utc::now())
            .await
            .is_err());
    }

    #[test]
    fn test_scoped_prior_uses_channel_and_mode() {
        use crate::domain::identify;

        let sync = ChannelSync::new(
            settings(ContentMode::Video),
            Box::new(FailingLister),
            Box::new(VideoUrlFetcher),
        );
        let own = identify(SOURCE_YOUTUBE, "UCchan", "v1", ContentMode::Video);
        let other = identify(SOURCE_YOUTUBE, "UCchan", "v1", ContentMode::Metadata);
        let state = PriorState::from_ids([own.clone(), other], Utc::now());

        let prior = sync.scoped_prior(&state);
        assert_eq!(prior.len(), 1);
        assert!(prior.contains(&own));
    }

    #[tokio::test]
    async fn test_evaluate_catalog_reports_verdicts() {
        let mut settings = settings(ContentMode::Video);
        settings.filter = settings.filter.with_max_duration(600);
        let items = vec![
            CatalogItem::new("short", Utc::now()).with_duration("PT5M"),
            CatalogItem::new("long", Utc::now()).with_duration("PT10M50S"),
        ];
        let sync = ChannelSync::new(settings, Box::new(FixedLister(items)), Box::new(VideoUrlFetcher));

        let verdicts = sync.evaluate_catalog(Utc::now()).await.unwrap();
        assert!(verdicts[0].1.is_ok());
        assert_eq!(
            verdicts[1].1,
            Err(Rejection::TooLong { seconds: 650, max: 600 })
        );
    }
}
