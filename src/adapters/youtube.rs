//! YouTube Data API v3 catalog lister.
//!
//! Listing is three steps: resolve the channel's uploads playlist, page
//! through every playlist entry, then fetch video details in batches of 50.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::DEFAULT_API_BASE_URL;
use crate::domain::CatalogItem;

use super::CatalogLister;

/// Maximum page / batch size accepted by the API
const MAX_RESULTS: usize = 50;

/// Thumbnail keys from best to worst
const THUMBNAIL_PREFERENCE: [&str; 5] = ["maxres", "standard", "high", "medium", "default"];

/// Authenticated YouTube Data API client
pub struct YouTubeClient {
    /// HTTP client
    client: Client,
    /// API key
    api_key: String,
    /// API endpoint
    base_url: String,
}

/// Paginated list envelope
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    next_page_token: Option<String>,
}

/// Error envelope returned with non-2xx responses
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Channel {
    snippet: Option<ChannelSnippet>,
    content_details: ChannelContentDetails,
}

#[derive(Debug, Deserialize)]
struct ChannelSnippet {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    content_details: PlaylistItemDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemDetails {
    video_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Video {
    id: String,
    snippet: VideoSnippet,
    content_details: Option<VideoContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    title: Option<String>,
    published_at: DateTime<Utc>,
    channel_title: Option<String>,
    #[serde(default)]
    thumbnails: HashMap<String, Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct VideoContentDetails {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl YouTubeClient {
    /// Create a client against the public API
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Point the client at another endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build API URL
    fn api_url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource)
    }

    /// GET a resource and decode the JSON body
    async fn get<T: DeserializeOwned>(&self, resource: &str, query: &[(&str, &str)]) -> Result<T> {
        let response = self
            .client
            .get(self.api_url(resource))
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .with_context(|| format!("Failed to call YouTube API '{}'", resource))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            anyhow::bail!("YouTube API error on '{}' ({}): {}", resource, status, message);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse YouTube API response for '{}'", resource))
    }

    /// Resolve the uploads playlist and display name of a channel
    async fn uploads_playlist(&self, channel_id: &str) -> Result<(String, Option<String>)> {
        let response: ListResponse<Channel> = self
            .get(
                "channels",
                &[("part", "snippet,contentDetails"), ("id", channel_id)],
            )
            .await?;

        let channel = response
            .items
            .into_iter()
            .next()
            .with_context(|| format!("Channel not found: {}", channel_id))?;

        Ok((
            channel.content_details.related_playlists.uploads,
            channel.snippet.and_then(|s| s.title),
        ))
    }

    /// Page through a playlist collecting every video id
    async fn playlist_video_ids(&self, playlist_id: &str) -> Result<Vec<String>> {
        let max_results = MAX_RESULTS.to_string();
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("part", "contentDetails"),
                ("playlistId", playlist_id),
                ("maxResults", max_results.as_str()),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let page: ListResponse<PlaylistItem> = self.get("playlistItems", &query).await?;
            debug!(playlist = playlist_id, count = page.items.len(), "Fetched playlist page");
            ids.extend(page.items.into_iter().map(|i| i.content_details.video_id));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(ids)
    }

    /// Fetch video details for a batch of at most 50 ids
    async fn video_details(&self, ids: &[String]) -> Result<Vec<CatalogItem>> {
        let joined = ids.join(",");
        let response: ListResponse<serde_json::Value> = self
            .get("videos", &[("part", "snippet,contentDetails"), ("id", joined.as_str())])
            .await?;

        response.items.into_iter().map(video_to_item).collect()
    }
}

/// Convert a raw `videos` resource into a catalog item, keeping the raw JSON as metadata
fn video_to_item(raw: serde_json::Value) -> Result<CatalogItem> {
    let video: Video =
        serde_json::from_value(raw.clone()).context("Failed to decode video resource")?;

    let mut item = CatalogItem::new(video.id, video.snippet.published_at).with_metadata(raw);
    item.title = video.snippet.title;
    item.channel_title = video.snippet.channel_title;
    item.duration = video.content_details.and_then(|d| d.duration);
    item.thumbnail = best_thumbnail(&video.snippet.thumbnails);

    Ok(item)
}

fn best_thumbnail(thumbnails: &HashMap<String, Thumbnail>) -> Option<String> {
    THUMBNAIL_PREFERENCE
        .iter()
        .find_map(|key| thumbnails.get(*key))
        .map(|t| t.url.clone())
}

#[async_trait]
impl CatalogLister for YouTubeClient {
    async fn list_items(&self, channel_id: &str) -> Result<Vec<CatalogItem>> {
        let (playlist_id, channel_title) = self.uploads_playlist(channel_id).await?;
        let ids = self.playlist_video_ids(&playlist_id).await?;

        let mut items = Vec::with_capacity(ids.len());
        for batch in ids.chunks(MAX_RESULTS) {
            items.extend(self.video_details(batch).await?);
        }

        info!(
            channel = channel_id,
            title = channel_title.as_deref().unwrap_or(""),
            listed = ids.len(),
            resolved = items.len(),
            "Listed channel catalog"
        );

        Ok(items)
    }
}
