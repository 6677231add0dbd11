//! Transcript retrieval.
//!
//! The default source shells out to `yt-dlp` to download subtitles (manual
//! or automatic) as WebVTT into a scratch directory, then flattens them to
//! plain text.

use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use tokio::fs;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::domain::item::WATCH_URL_BASE;

/// Source of raw transcript text
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Transcript for an item, or `None` if the item has none
    async fn transcript(&self, item_id: &str) -> Result<Option<String>>;
}

/// Transcript source backed by the `yt-dlp` binary
pub struct YtDlpTranscripts {
    /// Path to the yt-dlp binary
    binary_path: String,

    /// Subtitle language code
    language: String,

    /// Per-item time limit
    timeout: Duration,
}

impl Default for YtDlpTranscripts {
    fn default() -> Self {
        Self::new("yt-dlp", "en")
    }
}

impl YtDlpTranscripts {
    pub fn new(binary_path: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
            language: language.into(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl TranscriptSource for YtDlpTranscripts {
    async fn transcript(&self, item_id: &str) -> Result<Option<String>> {
        let scratch = tempfile::tempdir().context("Failed to create transcript scratch directory")?;
        let template = scratch.path().join("%(id)s.%(ext)s");
        let url = format!("{}{}", WATCH_URL_BASE, item_id);

        let child = Command::new(&self.binary_path)
            .args([
                "--skip-download",
                "--write-subs",
                "--write-auto-subs",
                "--sub-format",
                "vtt",
                "--sub-langs",
                self.language.as_str(),
                "--no-warnings",
                "-o",
            ])
            .arg(&template)
            .arg(&url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn {} for {}", self.binary_path, item_id))?;

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .with_context(|| format!("{} timed out after {:?} for {}", self.binary_path, self.timeout, item_id))?
            .with_context(|| format!("Failed to wait for {} for {}", self.binary_path, item_id))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "{} failed with exit code {} for {}: {}",
                self.binary_path,
                output.status.code().unwrap_or(-1),
                item_id,
                stderr.trim()
            );
        }

        let mut entries = fs::read_dir(scratch.path()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("vtt") {
                debug!(item = item_id, file = %path.display(), "Subtitle file downloaded");
                let vtt = fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read subtitles: {}", path.display()))?;
                let text = vtt_to_text(&vtt);
                return Ok(if text.is_empty() { None } else { Some(text) });
            }
        }

        Ok(None)
    }
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag regex is a valid constant"))
}

/// Flatten WebVTT subtitles into plain text.
///
/// Drops the header, cue identifiers, timing lines and inline tags, and
/// collapses the repeated lines produced by rolling auto-captions.
pub fn vtt_to_text(vtt: &str) -> String {
    let mut lines: Vec<String> = Vec::new();

    for raw in vtt.lines() {
        let line = raw.trim();
        if line.is_empty()
            || line.contains("-->")
            || line.starts_with("WEBVTT")
            || line.starts_with("Kind:")
            || line.starts_with("Language:")
            || line.starts_with("NOTE")
            || line.starts_with("STYLE")
            || line.chars().all(|c| c.is_ascii_digit())
        {
            continue;
        }

        let text = tag_regex()
            .replace_all(line, "")
            .replace("&amp;", "&")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&nbsp;", " ");
        let text = text.trim();

        if text.is_empty() || lines.last().map(String::as_str) == Some(text) {
            continue;
        }
        lines.push(text.to_string());
    }

    lines.join("\n")
}
