// @awa-component: LOY-LoyaltyModel
//
//! Loyalty tiers and library progress.
//!
//! The day thresholds live here and nowhere else; both the client view and
//! any server-side recomputation go through [`tier_for_days`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entitlement::parse_timestamp;

/// Days in the club required for silver.
pub const SILVER_DAYS: u32 = 90;
/// Days in the club required for gold.
pub const GOLD_DAYS: u32 = 180;
/// Days in the club required for platinum.
pub const PLATINUM_DAYS: u32 = 365;

/// Ascending `(threshold, tier)` pairs.
pub const TIER_THRESHOLDS: [(u32, LoyaltyTier); 3] = [
    (SILVER_DAYS, LoyaltyTier::Silver),
    (GOLD_DAYS, LoyaltyTier::Gold),
    (PLATINUM_DAYS, LoyaltyTier::Platinum),
];

/// Loyalty errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoyaltyError {
    #[error("Unknown loyalty tier '{0}' (expected none, silver, gold or platinum)")]
    UnknownTier(String),
}

/// Membership level, ordered `None < Silver < Gold < Platinum`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LoyaltyTier {
    #[default]
    None,
    Silver,
    Gold,
    Platinum,
}

impl LoyaltyTier {
    pub const ALL: [LoyaltyTier; 4] = [Self::None, Self::Silver, Self::Gold, Self::Platinum];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Platinum => "platinum",
        }
    }

    /// Human label used in notifications.
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "No status",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
        }
    }
}

impl fmt::Display for LoyaltyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoyaltyTier {
    type Err = LoyaltyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str() == s)
            .ok_or_else(|| LoyaltyError::UnknownTier(s.to_string()))
    }
}

/// Derived loyalty state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoyaltyStatus {
    pub tier: LoyaltyTier,
    pub days_in_club: u32,
    /// True when `tier` comes from an administrative override.
    pub is_override: bool,
}

/// Tier earned by membership duration alone.
pub fn tier_for_days(days_in_club: u32) -> LoyaltyTier {
    TIER_THRESHOLDS
        .iter()
        .rev()
        .find(|(threshold, _)| days_in_club >= *threshold)
        .map_or(LoyaltyTier::None, |(_, tier)| *tier)
}

/// Resolve the member's tier. An override is returned as is.
pub fn derive_loyalty(days_in_club: u32, override_tier: Option<LoyaltyTier>) -> LoyaltyStatus {
    match override_tier {
        Some(tier) => LoyaltyStatus {
            tier,
            days_in_club,
            is_override: true,
        },
        None => LoyaltyStatus {
            tier: tier_for_days(days_in_club),
            days_in_club,
            is_override: false,
        },
    }
}

/// Whole days since the first payment. Zero if unknown, unparseable or in the
/// future.
pub fn days_in_club(first_payment_date: Option<&str>, now: DateTime<Utc>) -> u32 {
    first_payment_date
        .and_then(parse_timestamp)
        .map(|first| (now - first).num_days())
        .filter(|days| *days > 0)
        .map_or(0, |days| u32::try_from(days).unwrap_or(u32::MAX))
}

/// Share of the library the member has opened, clamped to `[0, 100]`.
pub fn progress_percent(unique_viewed: u64, total_materials: u64) -> f64 {
    if total_materials == 0 {
        return 0.0;
    }
    (unique_viewed as f64 * 100.0 / total_materials as f64).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn tiers_are_ordered() {
        assert!(LoyaltyTier::None < LoyaltyTier::Silver);
        assert!(LoyaltyTier::Silver < LoyaltyTier::Gold);
        assert!(LoyaltyTier::Gold < LoyaltyTier::Platinum);
    }

    #[test]
    fn thresholds_map_days_to_tiers() {
        assert_eq!(tier_for_days(0), LoyaltyTier::None);
        assert_eq!(tier_for_days(SILVER_DAYS - 1), LoyaltyTier::None);
        assert_eq!(tier_for_days(SILVER_DAYS), LoyaltyTier::Silver);
        assert_eq!(tier_for_days(GOLD_DAYS - 1), LoyaltyTier::Silver);
        assert_eq!(tier_for_days(GOLD_DAYS), LoyaltyTier::Gold);
        assert_eq!(tier_for_days(PLATINUM_DAYS), LoyaltyTier::Platinum);
        assert_eq!(tier_for_days(u32::MAX), LoyaltyTier::Platinum);
    }

    #[test]
    fn thresholds_are_ascending() {
        assert!(TIER_THRESHOLDS.windows(2).all(|w| w[0].0 < w[1].0 && w[0].1 < w[1].1));
    }

    #[test]
    fn override_wins_over_days() {
        let status = derive_loyalty(SILVER_DAYS, Some(LoyaltyTier::Platinum));
        assert_eq!(status.tier, LoyaltyTier::Platinum);
        assert!(status.is_override);

        // Downgrades stick too.
        let status = derive_loyalty(PLATINUM_DAYS * 2, Some(LoyaltyTier::None));
        assert_eq!(status.tier, LoyaltyTier::None);
        assert_eq!(status.days_in_club, PLATINUM_DAYS * 2);
    }

    #[test]
    fn parse_accepts_only_known_tiers() {
        assert_eq!("gold".parse::<LoyaltyTier>(), Ok(LoyaltyTier::Gold));
        assert_eq!("none".parse::<LoyaltyTier>(), Ok(LoyaltyTier::None));
        assert_eq!(
            "diamond".parse::<LoyaltyTier>(),
            Err(LoyaltyError::UnknownTier("diamond".into()))
        );
        assert!("Gold".parse::<LoyaltyTier>().is_err());
        assert!("".parse::<LoyaltyTier>().is_err());
    }

    #[test]
    fn days_in_club_counts_whole_days() {
        let now = Utc.with_ymd_and_hms(2025, 12, 1, 12, 0, 0).unwrap();
        let first = (now - Duration::days(100) - Duration::hours(3)).to_rfc3339();
        assert_eq!(days_in_club(Some(&first), now), 100);
        assert_eq!(days_in_club(None, now), 0);
        assert_eq!(days_in_club(Some("garbage"), now), 0);

        let future = (now + Duration::days(3)).to_rfc3339();
        assert_eq!(days_in_club(Some(&future), now), 0);
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(progress_percent(0, 0), 0.0);
        assert_eq!(progress_percent(5, 0), 0.0);
        assert_eq!(progress_percent(0, 10), 0.0);
        assert_eq!(progress_percent(5, 10), 50.0);
        assert_eq!(progress_percent(10, 10), 100.0);
        assert_eq!(progress_percent(15, 10), 100.0);
        assert_eq!(progress_percent(u64::MAX, 1), 100.0);
    }
}
