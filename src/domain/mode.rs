//! Content modes: which payload gets materialized for a surviving item.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Kind of derived payload stored for each item that passes the filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentMode {
    /// Raw item metadata as JSON
    Metadata,

    /// Thumbnail image URL
    Thumbnail,

    /// Transcript text
    Transcript,

    /// Canonical watch URL
    Video,

    /// Audio extraction (reserved, no fetcher exists)
    Audio,
}

impl Default for ContentMode {
    fn default() -> Self {
        Self::Metadata
    }
}

impl ContentMode {
    /// Name used inside tracked identifiers and config files
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentMode::Metadata => "metadata",
            ContentMode::Thumbnail => "thumbnail",
            ContentMode::Transcript => "transcript",
            ContentMode::Video => "video",
            ContentMode::Audio => "audio",
        }
    }

    /// File extension used when the content is written to the library
    pub fn file_extension(&self) -> &'static str {
        match self {
            ContentMode::Metadata => "json",
            ContentMode::Transcript => "txt",
            ContentMode::Thumbnail | ContentMode::Video => "url",
            ContentMode::Audio => "audio",
        }
    }

    /// Whether a fetcher exists for this mode
    pub fn is_supported(&self) -> bool {
        !matches!(self, ContentMode::Audio)
    }
}

impl std::fmt::Display for ContentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ContentMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "metadata" | "meta" => Ok(ContentMode::Metadata),
            "thumbnail" | "thumb" => Ok(ContentMode::Thumbnail),
            "transcript" => Ok(ContentMode::Transcript),
            "video" | "video-url" | "video_url" | "url" => Ok(ContentMode::Video),
            "audio" => Ok(ContentMode::Audio),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str() {
        assert_eq!("metadata".parse::<ContentMode>().unwrap(), ContentMode::Metadata);
        assert_eq!("Transcript".parse::<ContentMode>().unwrap(), ContentMode::Transcript);
        assert_eq!("video-url".parse::<ContentMode>().unwrap(), ContentMode::Video);
        assert_eq!("video".parse::<ContentMode>().unwrap(), ContentMode::Video);
        assert!(matches!(
            "podcast".parse::<ContentMode>(),
            Err(ConfigError::UnknownMode(_))
        ));
    }

    #[test]
    fn test_default_mode_is_metadata() {
        assert_eq!(ContentMode::default(), ContentMode::Metadata);
    }

    #[test]
    fn test_audio_is_reserved() {
        assert!(!ContentMode::Audio.is_supported());
        assert!(ContentMode::Video.is_supported());
    }
}
