//! Host-side storage for materialized content.
//!
//! The sync core never persists anything; the CLI uses this module to keep
//! prior state between passes and to write the content itself.
//!
//! # Storage Layout
//!
//! ```text
//! ~/.chansync/
//! ├── config.yaml               # Optional settings
//! ├── state.json                # Tracked ids with last-seen markers
//! ├── state.lock                # Held while state.json is replaced
//! └── library/
//!     └── <tracked-id>.<ext>    # json | txt | url
//! ```

pub mod files;
pub mod store;

pub use files::{ApplySummary, Library};
pub use store::{StateLock, StateStore, StoreError, STATE_VERSION};
