//! Adapter interfaces for external systems.
//!
//! The reconciliation core only sees these traits. Concrete adapters talk to
//! the YouTube Data API, yt-dlp and the process environment.

pub mod credentials;
pub mod fetchers;
pub mod transcript;
pub mod youtube;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::{CatalogItem, ContentMode};

pub use credentials::{EnvCredentials, StaticCredentials, API_KEY_VAR};
pub use fetchers::{
    fetcher_for, MetadataFetcher, ThumbnailFetcher, TranscriptFetcher, VideoUrlFetcher,
    TRANSCRIPT_FALLBACK,
};
pub use transcript::{TranscriptSource, YtDlpTranscripts};
pub use youtube::YouTubeClient;

/// Lists every item of a remote channel
#[async_trait]
pub trait CatalogLister: Send + Sync {
    /// Return the complete, exhaustive item list for a channel
    async fn list_items(&self, channel_id: &str) -> Result<Vec<CatalogItem>>;
}

/// Produces the payload for one item in one content mode
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Mode this fetcher serves
    fn mode(&self) -> ContentMode;

    /// Fetch the content for an item
    async fn fetch(&self, item: &CatalogItem) -> Result<String>;
}

/// Supplies named secrets (API keys)
pub trait CredentialProvider: Send + Sync {
    /// Look up a credential by name
    fn credential(&self, name: &str) -> Option<String>;
}
