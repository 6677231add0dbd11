//! Core synchronization logic.
//!
//! This module contains:
//! - duration: ISO 8601 duration parsing
//! - age: Expiry windows and age evaluation
//! - filter: Item eligibility predicates
//! - reconcile: Catalog vs. prior state set difference
//! - sync: One full pass for a channel

pub mod age;
pub mod duration;
pub mod filter;
pub mod reconcile;
pub mod sync;

// Re-export commonly used types
pub use age::{AgeUnit, ExpiryParseError, ExpiryWindow};
pub use filter::{evaluate, FilterConfig, Rejection};
pub use reconcile::{plan, reconcile, ReconcileOptions, ReconcilePlan};
pub use sync::{ChannelSync, Integration};
