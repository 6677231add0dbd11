//! Per-mode content fetchers.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::{ConfigError, SyncSettings};
use crate::domain::{CatalogItem, ContentMode};

use super::transcript::{TranscriptSource, YtDlpTranscripts};
use super::ContentFetcher;

/// Content returned when an item has no transcript
pub const TRANSCRIPT_FALLBACK: &str = "No transcript available for this video.";

/// Serializes the item's metadata payload as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataFetcher;

#[async_trait]
impl ContentFetcher for MetadataFetcher {
    fn mode(&self) -> ContentMode {
        ContentMode::Metadata
    }

    async fn fetch(&self, item: &CatalogItem) -> Result<String> {
        serde_json::to_string_pretty(&item.metadata)
            .with_context(|| format!("Failed to serialize metadata for {}", item.id))
    }
}

/// Returns the best thumbnail URL for the item
#[derive(Debug, Clone, Copy, Default)]
pub struct ThumbnailFetcher;

#[async_trait]
impl ContentFetcher for ThumbnailFetcher {
    fn mode(&self) -> ContentMode {
        ContentMode::Thumbnail
    }

    async fn fetch(&self, item: &CatalogItem) -> Result<String> {
        Ok(item
            .thumbnail
            .clone()
            .unwrap_or_else(|| format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", item.id)))
    }
}

/// Returns the canonical watch URL
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoUrlFetcher;

#[async_trait]
impl ContentFetcher for VideoUrlFetcher {
    fn mode(&self) -> ContentMode {
        ContentMode::Video
    }

    async fn fetch(&self, item: &CatalogItem) -> Result<String> {
        Ok(item.watch_url())
    }
}

/// Fetches transcripts, optionally prefixed with a descriptive header
///
/// Never fails: a missing or unreachable transcript degrades to
/// [`TRANSCRIPT_FALLBACK`].
pub struct TranscriptFetcher {
    source: Box<dyn TranscriptSource>,
    include_header: bool,
}

impl TranscriptFetcher {
    pub fn new(source: Box<dyn TranscriptSource>, include_header: bool) -> Self {
        Self {
            source,
            include_header,
        }
    }

    fn header(item: &CatalogItem) -> String {
        format!(
            "Title: {}\nURL: {}\nUploader: {}\nPublished: {}\n\n",
            item.title.as_deref().unwrap_or("Untitled"),
            item.watch_url(),
            item.channel_title.as_deref().unwrap_or("Unknown"),
            item.published_at.to_rfc3339()
        )
    }
}

#[async_trait]
impl ContentFetcher for TranscriptFetcher {
    fn mode(&self) -> ContentMode {
        ContentMode::Transcript
    }

    async fn fetch(&self, item: &CatalogItem) -> Result<String> {
        let transcript = match self.source.transcript(&item.id).await {
            Ok(Some(text)) => {
                debug!(item = %item.id, bytes = text.len(), "Transcript fetched");
                text
            }
            Ok(None) => {
                warn!(item = %item.id, "No transcript available, using fallback");
                return Ok(TRANSCRIPT_FALLBACK.to_string());
            }
            Err(e) => {
                let error = format!("{:#}", e);
                warn!(item = %item.id, %error, "Transcript fetch failed, using fallback");
                return Ok(TRANSCRIPT_FALLBACK.to_string());
            }
        };

        if self.include_header {
            Ok(format!("{}{}", Self::header(item), transcript))
        } else {
            Ok(transcript)
        }
    }
}

/// Build the fetcher for the configured mode
pub fn fetcher_for(settings: &SyncSettings) -> Result<Box<dyn ContentFetcher>, ConfigError> {
    match settings.mode {
        ContentMode::Metadata => Ok(Box::new(MetadataFetcher)),
        ContentMode::Thumbnail => Ok(Box::new(ThumbnailFetcher)),
        ContentMode::Video => Ok(Box::new(VideoUrlFetcher)),
        ContentMode::Transcript => Ok(Box::new(TranscriptFetcher::new(
            Box::new(YtDlpTranscripts::new(
                settings.ytdlp_binary.clone(),
                settings.transcript_language.clone(),
            )),
            settings.include_header,
        ))),
        ContentMode::Audio => Err(ConfigError::UnsupportedMode(ContentMode::Audio)),
    }
}
