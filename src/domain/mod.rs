//! Domain types for channel synchronization.
//!
//! This module contains the core data structures:
//! - CatalogItem: One remote item as listed from the channel
//! - ContentMode: Which payload is materialized per item
//! - TrackedId: Stable key for a (source, channel, item, mode) materialization
//! - ChangeSet: Output of a reconciliation pass
//! - PriorState: What the host store currently holds

pub mod change;
pub mod identity;
pub mod item;
pub mod mode;
pub mod state;

// Re-export commonly used types
pub use change::{Change, ChangeSet};
pub use identity::{identify, TrackedId, TrackedParts, SOURCE_YOUTUBE};
pub use item::CatalogItem;
pub use mode::ContentMode;
pub use state::{content_digest, Marker, PriorState};
