//! Item eligibility filtering.
//!
//! An item is kept only if it passes every configured predicate. Each axis
//! (title, start date, min/max duration, expiry) is independently optional
//! and an unconfigured axis never excludes anything.

use chrono::{DateTime, Utc};
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::domain::CatalogItem;

use super::age::ExpiryWindow;

/// Compiled filter policy
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    /// Title must match this pattern
    pub title_pattern: Option<Regex>,

    /// Minimum duration in seconds (inclusive)
    pub min_duration_secs: Option<u64>,

    /// Maximum duration in seconds (inclusive)
    pub max_duration_secs: Option<u64>,

    /// Items published before this instant are excluded
    pub published_after: Option<DateTime<Utc>>,

    /// Items older than this window are excluded
    pub expiry: Option<ExpiryWindow>,
}

/// Why an item was excluded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("no title to match against pattern")]
    MissingTitle,

    #[error("title does not match pattern")]
    TitleMismatch,

    #[error("published {published_at} before start date {floor}")]
    BeforeStartDate {
        published_at: DateTime<Utc>,
        floor: DateTime<Utc>,
    },

    #[error("duration {seconds}s below minimum {min}s")]
    TooShort { seconds: u64, min: u64 },

    #[error("duration {seconds}s above maximum {max}s")]
    TooLong { seconds: u64, max: u64 },

    #[error("older than expiry window {window}")]
    Expired { window: String },
}

impl FilterConfig {
    /// A filter with no constraints
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title_pattern(mut self, pattern: Regex) -> Self {
        self.title_pattern = Some(pattern);
        self
    }

    pub fn with_min_duration(mut self, seconds: u64) -> Self {
        self.min_duration_secs = Some(seconds);
        self
    }

    pub fn with_max_duration(mut self, seconds: u64) -> Self {
        self.max_duration_secs = Some(seconds);
        self
    }

    pub fn with_published_after(mut self, floor: DateTime<Utc>) -> Self {
        self.published_after = Some(floor);
        self
    }

    pub fn with_expiry(mut self, window: ExpiryWindow) -> Self {
        self.expiry = Some(window);
        self
    }

    /// Whether no axis is constrained
    pub fn is_unconstrained(&self) -> bool {
        self.title_pattern.is_none()
            && self.min_duration_secs.is_none()
            && self.max_duration_secs.is_none()
            && self.published_after.is_none()
            && self.expiry.is_none()
    }

    /// Check every predicate, reporting the first one that fails
    pub fn check(&self, item: &CatalogItem, now: DateTime<Utc>) -> Result<(), Rejection> {
        if let Some(pattern) = &self.title_pattern {
            match item.title.as_deref() {
                None => return Err(Rejection::MissingTitle),
                Some(title) if !pattern.is_match(title) => return Err(Rejection::TitleMismatch),
                Some(_) => {}
            }
        }

        if let Some(floor) = self.published_after {
            if item.published_at < floor {
                return Err(Rejection::BeforeStartDate {
                    published_at: item.published_at,
                    floor,
                });
            }
        }

        if self.min_duration_secs.is_some() || self.max_duration_secs.is_some() {
            let seconds = item.duration_seconds();

            if let Some(min) = self.min_duration_secs {
                if seconds < min {
                    return Err(Rejection::TooShort { seconds, min });
                }
            }

            if let Some(max) = self.max_duration_secs {
                if seconds > max {
                    return Err(Rejection::TooLong { seconds, max });
                }
            }
        }

        if let Some(window) = &self.expiry {
            if window.is_expired(now, item.published_at) {
                return Err(Rejection::Expired {
                    window: window.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Whether the item passes all configured predicates
    pub fn evaluate(&self, item: &CatalogItem, now: DateTime<Utc>) -> bool {
        self.check(item, now).is_ok()
    }

    /// Keep only the items that pass, logging each exclusion at debug level
    pub fn apply(&self, items: Vec<CatalogItem>, now: DateTime<Utc>) -> Vec<CatalogItem> {
        items
            .into_iter()
            .filter(|item| match self.check(item, now) {
                Ok(()) => true,
                Err(reason) => {
                    debug!(item = %item.id, %reason, "Excluded by filter");
                    false
                }
            })
            .collect()
    }
}

/// Evaluate one item against a filter policy
pub fn evaluate(item: &CatalogItem, config: &FilterConfig, now: DateTime<Utc>) -> bool {
    config.evaluate(item, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::age::AgeUnit;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn item(title: Option<&str>, duration: &str, age_days: i64) -> CatalogItem {
        let mut item = CatalogItem::new("vid", now() - Duration::days(age_days)).with_duration(duration);
        item.title = title.map(String::from);
        item
    }

    #[test]
    fn test_unconstrained_passes_everything() {
        let filter = FilterConfig::new();
        assert!(filter.is_unconstrained());
        assert!(filter.evaluate(&item(None, "garbage", 10_000), now()));
        assert!(filter.evaluate(&item(Some("x"), "PT0S", 0), now()));
    }

    #[test]
    fn test_title_pattern() {
        let filter = FilterConfig::new().with_title_pattern(Regex::new("^Episode \\d+").unwrap());

        assert!(filter.evaluate(&item(Some("Episode 12: Lifetimes"), "PT1M", 1), now()));
        assert_eq!(
            filter.check(&item(Some("Bonus clip"), "PT1M", 1), now()),
            Err(Rejection::TitleMismatch)
        );
        assert_eq!(
            filter.check(&item(None, "PT1M", 1), now()),
            Err(Rejection::MissingTitle)
        );
    }

    #[test]
    fn test_start_date_is_inclusive() {
        let floor = now() - Duration::days(10);
        let filter = FilterConfig::new().with_published_after(floor);

        assert!(filter.evaluate(&item(None, "PT1M", 10), now()));
        assert!(filter.evaluate(&item(None, "PT1M", 9), now()));
        assert!(matches!(
            filter.check(&item(None, "PT1M", 11), now()),
            Err(Rejection::BeforeStartDate { .. })
        ));
    }

    #[test]
    fn test_duration_bounds_are_inclusive() {
        let filter = FilterConfig::new().with_min_duration(60).with_max_duration(600);

        assert!(filter.evaluate(&item(None, "PT1M", 1), now()));
        assert!(filter.evaluate(&item(None, "PT10M", 1), now()));
        assert_eq!(
            filter.check(&item(None, "PT59S", 1), now()),
            Err(Rejection::TooShort { seconds: 59, min: 60 })
        );
        assert_eq!(
            filter.check(&item(None, "PT10M50S", 1), now()),
            Err(Rejection::TooLong { seconds: 650, max: 600 })
        );
    }

    #[test]
    fn test_inverted_bounds_exclude_everything() {
        let filter = FilterConfig::new().with_min_duration(600).with_max_duration(60);
        for duration in ["PT0S", "PT1M", "PT5M", "PT10M", "PT1H"] {
            assert!(!filter.evaluate(&item(None, duration, 1), now()));
        }
    }

    #[test]
    fn test_malformed_duration_counts_as_zero() {
        let filter = FilterConfig::new().with_min_duration(1);
        assert_eq!(
            filter.check(&item(None, "garbage", 1), now()),
            Err(Rejection::TooShort { seconds: 0, min: 1 })
        );
    }

    #[test]
    fn test_expiry() {
        let filter = FilterConfig::new().with_expiry(ExpiryWindow::new(30, AgeUnit::Day));

        assert!(filter.evaluate(&item(None, "PT1M", 29), now()));
        assert!(matches!(
            filter.check(&item(None, "PT1M", 31), now()),
            Err(Rejection::Expired { .. })
        ));
    }

    #[test]
    fn test_apply_keeps_passing_items_in_order() {
        let filter = FilterConfig::new().with_max_duration(600);
        let mut short_a = item(Some("a"), "PT1M", 1);
        short_a.id = "a".into();
        let mut long = item(Some("b"), "PT1H", 1);
        long.id = "b".into();
        let mut short_c = item(Some("c"), "PT2M", 1);
        short_c.id = "c".into();

        let kept = filter.apply(vec![short_a, long, short_c], now());
        let ids: Vec<_> = kept.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }
}
