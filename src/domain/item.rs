//! Remote catalog items as returned by the catalog lister.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::duration;

/// Base URL for canonical watch links
pub const WATCH_URL_BASE: &str = "https://www.youtube.com/watch?v=";

/// One published item (video) in a remote channel
///
/// Items are immutable once fetched; the filter and reconciler only read them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Remote identifier, unique within the channel
    pub id: String,

    /// Item title (the API may omit it for private or deleted items)
    #[serde(default)]
    pub title: Option<String>,

    /// When the item was published
    pub published_at: DateTime<Utc>,

    /// Encoded duration (`PT1H2M3S`)
    #[serde(default)]
    pub duration: Option<String>,

    /// Best available thumbnail URL
    #[serde(default)]
    pub thumbnail: Option<String>,

    /// Uploader / channel display name
    #[serde(default)]
    pub channel_title: Option<String>,

    /// Free-form metadata payload from the remote API
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl CatalogItem {
    /// Create an item with only the required fields
    pub fn new(id: impl Into<String>, published_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: None,
            published_at,
            duration: None,
            thumbnail: None,
            channel_title: None,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = Some(duration.into());
        self
    }

    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail = Some(url.into());
        self
    }

    pub fn with_channel_title(mut self, channel_title: impl Into<String>) -> Self {
        self.channel_title = Some(channel_title.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Duration in seconds; missing or malformed encodings count as zero
    pub fn duration_seconds(&self) -> u64 {
        self.duration.as_deref().map(duration::parse).unwrap_or(0)
    }

    /// Canonical watch URL for this item
    pub fn watch_url(&self) -> String {
        format!("{}{}", WATCH_URL_BASE, self.id)
    }
}
