//! Configuration for chansync.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags (channel, mode, no-delete)
//! 2. Environment variables (CHANSYNC_HOME, CHANSYNC_LIBRARY)
//! 3. Config file (.chansync/config.yaml, or --config <path>)
//! 4. Defaults (~/.chansync)
//!
//! Config file discovery:
//! - Searches current directory and parents for .chansync/config.yaml
//! - Relative paths in the config file are resolved against the file's directory

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::age::{ExpiryParseError, ExpiryWindow};
use crate::core::filter::FilterConfig;
use crate::domain::ContentMode;

/// Environment variable overriding the state directory
pub const ENV_HOME: &str = "CHANSYNC_HOME";

/// Environment variable overriding the library directory
pub const ENV_LIBRARY: &str = "CHANSYNC_LIBRARY";

/// Default YouTube Data API endpoint
pub const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Fatal configuration problems; each names the offending field
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required config field '{0}'")]
    MissingField(&'static str),

    #[error("missing credential '{0}'")]
    MissingCredential(String),

    #[error("field 'mode': unknown content mode '{0}'")]
    UnknownMode(String),

    #[error("field 'mode': content mode '{0}' is reserved and not implemented")]
    UnsupportedMode(ContentMode),

    #[error("field 'expire_after': {0}")]
    InvalidExpiry(#[from] ExpiryParseError),

    #[error("field 'title_pattern': invalid regex '{pattern}': {source}")]
    InvalidTitlePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("field 'start_date': cannot parse '{0}' (expected YYYY-MM-DD or RFC 3339)")]
    InvalidStartDate(String),
}

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default = "default_version")]
    pub version: String,

    /// Channel to synchronize
    #[serde(default, alias = "channelId")]
    pub channel_id: Option<String>,

    /// Content mode (default: metadata)
    #[serde(default)]
    pub mode: Option<String>,

    /// Never delete previously added items
    #[serde(default, alias = "noDelete")]
    pub no_delete: bool,

    /// Prepend a descriptive header to transcripts
    #[serde(default = "default_true", alias = "includeHeader")]
    pub include_header: bool,

    #[serde(default)]
    pub filter: FilterSettings,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub transcript: TranscriptConfig,

    #[serde(default)]
    pub api: ApiConfig,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            channel_id: None,
            mode: None,
            no_delete: false,
            include_header: true,
            filter: FilterSettings::default(),
            paths: PathsConfig::default(),
            transcript: TranscriptConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

/// Filter section, uncompiled
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSettings {
    /// Regular expression the title must match
    #[serde(default, alias = "titlePattern")]
    pub title_pattern: Option<String>,

    /// Minimum duration in seconds
    #[serde(default, alias = "durationGreaterThan")]
    pub duration_greater_than: Option<u64>,

    /// Maximum duration in seconds
    #[serde(default, alias = "durationLessThan")]
    pub duration_less_than: Option<u64>,

    /// Publish-date floor (YYYY-MM-DD or RFC 3339)
    #[serde(default, alias = "startDate")]
    pub start_date: Option<String>,

    /// Expiry window (`30d`, `2w`, `6m`, `1y`)
    #[serde(default, alias = "expireAfter")]
    pub expire_after: Option<String>,
}

impl FilterSettings {
    /// Validate and compile into a filter policy
    pub fn compile(&self) -> Result<FilterConfig, ConfigError> {
        let mut filter = FilterConfig::new();

        if let Some(pattern) = &self.title_pattern {
            let regex = Regex::new(pattern).map_err(|source| ConfigError::InvalidTitlePattern {
                pattern: pattern.clone(),
                source,
            })?;
            filter = filter.with_title_pattern(regex);
        }

        if let Some(min) = self.duration_greater_than {
            filter = filter.with_min_duration(min);
        }

        if let Some(max) = self.duration_less_than {
            filter = filter.with_max_duration(max);
        }

        if let Some(date) = &self.start_date {
            filter = filter.with_published_after(parse_start_date(date)?);
        }

        if let Some(expr) = &self.expire_after {
            filter = filter.with_expiry(expr.parse::<ExpiryWindow>()?);
        }

        Ok(filter)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to config file)
    pub home: Option<String>,
    /// Library directory (relative to config file)
    pub library: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// Subtitle language (default: en)
    pub language: Option<String>,
    /// yt-dlp binary (default: yt-dlp)
    pub binary: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Override for the YouTube Data API endpoint
    pub base_url: Option<String>,
}

/// Overrides supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub channel_id: Option<String>,
    pub mode: Option<String>,
    pub no_delete: bool,
}

/// Validated settings for one channel sync
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub channel_id: String,
    pub mode: ContentMode,
    pub filter: FilterConfig,
    pub no_delete: bool,
    pub include_header: bool,
    pub transcript_language: String,
    pub ytdlp_binary: String,
    pub api_base_url: String,
}

impl SyncSettings {
    /// Settings with defaults for everything but the channel
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            mode: ContentMode::default(),
            filter: FilterConfig::new(),
            no_delete: false,
            include_header: true,
            transcript_language: "en".to_string(),
            ytdlp_binary: "yt-dlp".to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Validate a config file plus command-line overrides
    pub fn from_config(file: &ConfigFile, overrides: &SettingsOverrides) -> Result<Self, ConfigError> {
        let channel_id = overrides
            .channel_id
            .clone()
            .or_else(|| file.channel_id.clone())
            .filter(|id| !id.trim().is_empty())
            .ok_or(ConfigError::MissingField("channel_id"))?;

        let mode = match overrides.mode.as_deref().or(file.mode.as_deref()) {
            Some(mode) => mode.parse::<ContentMode>()?,
            None => ContentMode::default(),
        };

        Ok(Self {
            channel_id: channel_id.trim().to_string(),
            mode,
            filter: file.filter.compile()?,
            no_delete: overrides.no_delete || file.no_delete,
            include_header: file.include_header,
            transcript_language: file
                .transcript
                .language
                .clone()
                .unwrap_or_else(|| "en".to_string()),
            ytdlp_binary: file
                .transcript
                .binary
                .clone()
                .unwrap_or_else(|| "yt-dlp".to_string()),
            api_base_url: file
                .api
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        })
    }
}

/// Parse a publish-date floor: a bare date means midnight UTC
pub fn parse_start_date(value: &str) -> Result<DateTime<Utc>, ConfigError> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| ConfigError::InvalidStartDate(value.to_string()))
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// State directory
    pub home: PathBuf,
    /// Materialized content directory
    pub library: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Raw file contents (defaults when no file was found)
    pub file: ConfigFile,
}

/// Path overrides read from the environment
#[derive(Debug, Clone, Default)]
pub struct EnvPaths {
    pub home: Option<String>,
    pub library: Option<String>,
}

impl EnvPaths {
    pub fn from_env() -> Self {
        Self {
            home: std::env::var(ENV_HOME).ok(),
            library: std::env::var(ENV_LIBRARY).ok(),
        }
    }
}

impl ResolvedConfig {
    /// Path of the prior-state file
    pub fn state_path(&self) -> PathBuf {
        self.home.join("state.json")
    }

    /// Validate the file into sync settings
    pub fn sync_settings(&self, overrides: &SettingsOverrides) -> Result<SyncSettings, ConfigError> {
        SyncSettings::from_config(&self.file, overrides)
    }

    /// Combine a parsed file, environment overrides and defaults
    pub fn resolve(
        file: ConfigFile,
        config_file: Option<PathBuf>,
        env: &EnvPaths,
        default_home: PathBuf,
    ) -> Self {
        let base_dir = config_file
            .as_deref()
            .and_then(Path::parent)
            .unwrap_or(Path::new("."))
            .to_path_buf();

        let home = if let Some(env_home) = &env.home {
            PathBuf::from(env_home)
        } else if let Some(home_path) = &file.paths.home {
            resolve_path(&base_dir, home_path)
        } else {
            default_home
        };

        let library = if let Some(env_lib) = &env.library {
            PathBuf::from(env_lib)
        } else if let Some(lib_path) = &file.paths.library {
            resolve_path(&base_dir, lib_path)
        } else {
            home.join("library")
        };

        Self {
            home,
            library,
            config_file,
            file,
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".chansync").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Load configuration from all sources
pub fn load_config(explicit: Option<&Path>) -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".chansync");

    let config_file = match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Some(path.to_path_buf())
        }
        None => find_config_file(),
    };

    let file = match &config_file {
        Some(path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    Ok(ResolvedConfig::resolve(
        file,
        config_file,
        &EnvPaths::from_env(),
        default_home,
    ))
}
