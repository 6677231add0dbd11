//! chansync - YouTube channel sync engine
//!
//! Mirrors the items of a YouTube channel into a local store, in one of
//! several content modes (metadata, thumbnail, transcript, video URL).
//!
//! # Architecture
//!
//! Each pass is a pure reconciliation:
//! - The channel is listed in full and filtered
//! - Every surviving item gets a stable tracked identifier
//! - The identifiers are diffed against the host's prior state
//! - Content is fetched only for additions
//!
//! The resulting change set is returned to the host, which persists it.
//! A failed pass produces an empty change set.
//!
//! # Modules
//!
//! - `adapters`: External systems (YouTube Data API, yt-dlp, credentials)
//! - `core`: Duration parsing, age evaluation, filtering, reconciliation
//! - `domain`: Data structures (CatalogItem, TrackedId, ChangeSet, PriorState)
//! - `library`: Host-side state file and content directory
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Preview a pass
//! YOUTUBE_API_KEY=... chansync sync --channel UC_x5XG1OV2P6uZZ5FSM9Ttw
//!
//! # Materialize transcripts
//! chansync sync --mode transcript --apply
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod library;

// Re-export main types at crate root for convenience
pub use config::{ConfigError, SyncSettings};
pub use core::{ChannelSync, FilterConfig, Integration};
pub use domain::{CatalogItem, Change, ChangeSet, ContentMode, PriorState, TrackedId};
pub use library::{Library, StateStore};
