//! Monthly reflection limits per subscription tier.
//!
//! The table is built once at startup from [`Config`](crate::Config) and
//! shared read-only (behind an `Arc`) with everything that enforces it:
//! the `check_usage_limit` guard and the reflection write path. There is
//! no global copy, so tests can run the guards against any table.
//!
//! # Limit Syntax
//!
//! Limits are written as a positive integer or the word `unlimited`:
//!
//! ```bash
//! TIER_LIMIT_FREE=3 TIER_LIMIT_ESSENTIAL=10 TIER_LIMIT_PREMIUM=unlimited cargo run
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::Tier;

/// Ceiling on reflections a user may create in one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LimitRepr", into = "LimitRepr")]
pub enum MonthlyLimit {
    Limited(u32),
    Unlimited,
}

impl MonthlyLimit {
    /// Whether a user who has already created `used` reflections may create another.
    pub fn admits(&self, used: u32) -> bool {
        match self {
            MonthlyLimit::Limited(max) => used < *max,
            MonthlyLimit::Unlimited => true,
        }
    }

    /// Reflections left this month, or `None` when unbounded.
    pub fn remaining(&self, used: u32) -> Option<u32> {
        match self {
            MonthlyLimit::Limited(max) => Some(max.saturating_sub(used)),
            MonthlyLimit::Unlimited => None,
        }
    }
}

impl fmt::Display for MonthlyLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthlyLimit::Limited(max) => write!(f, "{max}"),
            MonthlyLimit::Unlimited => f.write_str("unlimited"),
        }
    }
}

impl FromStr for MonthlyLimit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("unlimited") {
            return Ok(MonthlyLimit::Unlimited);
        }
        match s.parse::<u32>() {
            Ok(0) => Err("limit must be greater than 0 (use 'unlimited' for no limit)".to_string()),
            Ok(n) => Ok(MonthlyLimit::Limited(n)),
            Err(e) => Err(format!("expected a positive integer or 'unlimited': {e}")),
        }
    }
}

impl PartialOrd for MonthlyLimit {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MonthlyLimit {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (MonthlyLimit::Limited(a), MonthlyLimit::Limited(b)) => a.cmp(b),
            (MonthlyLimit::Limited(_), MonthlyLimit::Unlimited) => Ordering::Less,
            (MonthlyLimit::Unlimited, MonthlyLimit::Limited(_)) => Ordering::Greater,
            (MonthlyLimit::Unlimited, MonthlyLimit::Unlimited) => Ordering::Equal,
        }
    }
}

/// Wire form: a JSON number or the string `"unlimited"`.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum LimitRepr {
    Count(u32),
    Word(String),
}

impl From<MonthlyLimit> for LimitRepr {
    fn from(limit: MonthlyLimit) -> Self {
        match limit {
            MonthlyLimit::Limited(n) => LimitRepr::Count(n),
            MonthlyLimit::Unlimited => LimitRepr::Word("unlimited".to_string()),
        }
    }
}

impl TryFrom<LimitRepr> for MonthlyLimit {
    type Error = String;

    fn try_from(repr: LimitRepr) -> Result<Self, Self::Error> {
        match repr {
            LimitRepr::Count(n) => n.to_string().parse(),
            LimitRepr::Word(w) => w.parse(),
        }
    }
}

/// Immutable mapping from tier to monthly reflection limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierLimits {
    free: MonthlyLimit,
    essential: MonthlyLimit,
    premium: MonthlyLimit,
}

impl TierLimits {
    /// Build a table, rejecting one where a higher tier gets less than a lower one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the limits are not non-decreasing
    /// from free to premium.
    pub fn new(
        free: MonthlyLimit,
        essential: MonthlyLimit,
        premium: MonthlyLimit,
    ) -> AppResult<Self> {
        if free > essential || essential > premium {
            return Err(AppError::ConfigError(format!(
                "tier limits must not decrease with tier (free={free}, essential={essential}, premium={premium})"
            )));
        }
        Ok(Self {
            free,
            essential,
            premium,
        })
    }

    pub fn limit_for(&self, tier: Tier) -> MonthlyLimit {
        match tier {
            Tier::Free => self.free,
            Tier::Essential => self.essential,
            Tier::Premium => self.premium,
        }
    }
}

impl Default for TierLimits {
    fn default() -> Self {
        Self {
            free: MonthlyLimit::Limited(3),
            essential: MonthlyLimit::Limited(10),
            premium: MonthlyLimit::Unlimited,
        }
    }
}
