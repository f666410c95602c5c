// @awa-component: ENT-EntitlementModel
//
//! Entitlement derivation from a subscription record.
//!
//! Remaining days are recomputed from the end timestamp on every read. Missing
//! or malformed timestamps resolve to "no access".

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::models::account::{AutoRenew, SubscriptionRecord};

/// Any `days_left` strictly above this is shown as unlimited.
pub const UNLIMITED_DAYS_THRESHOLD: u32 = 36_000;

/// Naive layouts written by the storage side (interpreted as UTC).
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Normalized subscription state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscription {
    pub end_date: Option<DateTime<Utc>>,
    pub days_left: u32,
    /// Always `days_left > 0`.
    pub is_active: bool,
    pub is_unlimited: bool,
    pub auto_renew_enabled: bool,
    pub auto_renew_streak: u32,
}

impl Subscription {
    /// State for a member who never subscribed.
    pub fn none() -> Self {
        Self {
            end_date: None,
            days_left: 0,
            is_active: false,
            is_unlimited: false,
            auto_renew_enabled: false,
            auto_renew_streak: 0,
        }
    }

    /// Remaining days as shown to the member.
    pub fn days_left_label(&self) -> String {
        if self.is_unlimited {
            "∞".to_string()
        } else {
            self.days_left.to_string()
        }
    }
}

/// Derive entitlement at `now` from an optional raw record.
pub fn derive_entitlement(
    raw: Option<&SubscriptionRecord>,
    auto_renew: AutoRenew,
    now: DateTime<Utc>,
) -> Subscription {
    let Some(raw) = raw else {
        return Subscription {
            auto_renew_enabled: auto_renew.enabled,
            auto_renew_streak: auto_renew.streak,
            ..Subscription::none()
        };
    };

    let end_date = parse_timestamp(&raw.end_date);
    let days_left = end_date.map_or(0, |end| days_until(end, now));

    Subscription {
        end_date,
        days_left,
        is_active: days_left > 0,
        is_unlimited: is_unlimited(days_left),
        auto_renew_enabled: auto_renew.enabled,
        auto_renew_streak: auto_renew.streak,
    }
}

/// Whole days left until `end`, rounded up. Zero once `end` has passed.
pub fn days_until(end: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let left = end - now;
    if left <= TimeDelta::zero() {
        return 0;
    }
    let whole = left.num_days();
    let days = if TimeDelta::try_days(whole).is_some_and(|full| left > full) {
        whole + 1
    } else {
        whole
    };
    u32::try_from(days).unwrap_or(u32::MAX)
}

pub fn is_unlimited(days_left: u32) -> bool {
    days_left > UNLIMITED_DAYS_THRESHOLD
}

/// Parse a stored timestamp. RFC 3339 first, then the naive layouts as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
