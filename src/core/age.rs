//! Age-based expiry windows (`30d`, `2w`, `6m`, `1y`).
//!
//! Months are fixed at 30 days and years at 365 days. There is no calendar
//! awareness: a window of `1y` is always exactly 365 × 24 hours.

use chrono::{DateTime, Utc};
use thiserror::Error;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Unit of an expiry window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeUnit {
    Day,
    Week,
    /// 30 days
    Month,
    /// 365 days
    Year,
}

impl AgeUnit {
    /// Fixed length of one unit in milliseconds
    pub fn millis(&self) -> i64 {
        match self {
            AgeUnit::Day => MS_PER_DAY,
            AgeUnit::Week => 7 * MS_PER_DAY,
            AgeUnit::Month => 30 * MS_PER_DAY,
            AgeUnit::Year => 365 * MS_PER_DAY,
        }
    }

    fn suffix(&self) -> char {
        match self {
            AgeUnit::Day => 'd',
            AgeUnit::Week => 'w',
            AgeUnit::Month => 'm',
            AgeUnit::Year => 'y',
        }
    }
}

/// Errors parsing an expiry expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpiryParseError {
    #[error("expiry '{0}' has no numeric magnitude")]
    MissingMagnitude(String),

    #[error("expiry '{0}' has a magnitude that is too large")]
    MagnitudeTooLarge(String),

    #[error("expiry '{expr}' has unknown unit '{unit}' (expected d, w, m or y)")]
    UnknownUnit { expr: String, unit: String },
}

/// Relative age threshold beyond which an item is excluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryWindow {
    pub magnitude: u64,
    pub unit: AgeUnit,
}

impl ExpiryWindow {
    pub fn new(magnitude: u64, unit: AgeUnit) -> Self {
        Self { magnitude, unit }
    }

    /// Window length in milliseconds (saturating)
    pub fn threshold_millis(&self) -> i64 {
        i64::try_from(self.magnitude)
            .ok()
            .and_then(|m| m.checked_mul(self.unit.millis()))
            .unwrap_or(i64::MAX)
    }

    /// Whether an item published at `published_at` has outlived the window.
    ///
    /// Items published in the future are never expired.
    pub fn is_expired(&self, now: DateTime<Utc>, published_at: DateTime<Utc>) -> bool {
        let elapsed = now.signed_duration_since(published_at).num_milliseconds();
        elapsed > self.threshold_millis()
    }
}

impl std::fmt::Display for ExpiryWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit.suffix())
    }
}

impl std::str::FromStr for ExpiryWindow {
    type Err = ExpiryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let expr = s.trim();
        let digits_end = expr
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(expr.len());
        let (digits, rest) = expr.split_at(digits_end);

        if digits.is_empty() {
            return Err(ExpiryParseError::MissingMagnitude(s.to_string()));
        }
        let magnitude = digits
            .parse::<u64>()
            .map_err(|_| ExpiryParseError::MagnitudeTooLarge(s.to_string()))?;

        let unit_str = rest.trim().to_lowercase();
        let unit = match unit_str.as_str() {
            "d" | "day" | "days" => AgeUnit::Day,
            "w" | "week" | "weeks" => AgeUnit::Week,
            "m" | "month" | "months" => AgeUnit::Month,
            "y" | "year" | "years" => AgeUnit::Year,
            _ => {
                return Err(ExpiryParseError::UnknownUnit {
                    expr: s.to_string(),
                    unit: rest.trim().to_string(),
                })
            }
        };

        Ok(Self { magnitude, unit })
    }
}
