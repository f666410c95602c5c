//! Account aggregate models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entitlement::{Subscription, derive_entitlement};
use crate::loyalty::{LoyaltyStatus, LoyaltyTier, days_in_club, derive_loyalty, progress_percent};

/// Bot-issued user identity. Replaced wholesale on re-authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Subscription as stored by the billing side.
///
/// `end_date` is kept as text: it is parsed at read time and anything
/// unparseable counts as expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub end_date: String,
}

/// Recurring payment preference. Lives on the account, so it can be set
/// before any subscription exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoRenew {
    #[serde(default)]
    pub enabled: bool,
    /// Consecutive successful renewals.
    #[serde(default)]
    pub streak: u32,
}

/// Loyalty inputs as stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_payment_date: Option<String>,
    /// Tier set explicitly by an administrator. Wins over the day-derived tier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_tier: Option<LoyaltyTier>,
}

/// Referral programme counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralStats {
    /// Spendable balance; never negative and never above `total_earned`.
    pub balance: i64,
    pub referrals_count: u32,
    pub total_earned: i64,
}

/// Library usage counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryStats {
    pub materials_viewed: u64,
    pub unique_viewed: u64,
    pub favorites: u64,
}

/// Everything known about one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub identity: Identity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<SubscriptionRecord>,
    #[serde(default)]
    pub auto_renew: AutoRenew,
    #[serde(default)]
    pub loyalty: LoyaltyRecord,
    #[serde(default)]
    pub referral: ReferralStats,
    #[serde(default)]
    pub library: LibraryStats,
}

impl AccountRecord {
    /// New account with no subscription and no history.
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            subscription: None,
            auto_renew: AutoRenew::default(),
            loyalty: LoyaltyRecord::default(),
            referral: ReferralStats::default(),
            library: LibraryStats::default(),
        }
    }

    /// Entitlement at `now`.
    pub fn entitlement(&self, now: DateTime<Utc>) -> Subscription {
        derive_entitlement(self.subscription.as_ref(), self.auto_renew, now)
    }

    /// Derive the read-only view presentation renders from.
    pub fn view(&self, now: DateTime<Utc>, total_materials: u64) -> AccountView {
        let days = days_in_club(self.loyalty.first_payment_date.as_deref(), now);
        AccountView {
            identity: self.identity.clone(),
            subscription: self.entitlement(now),
            loyalty: derive_loyalty(days, self.loyalty.override_tier),
            referral: self.referral,
            library: self.library,
            progress_percent: progress_percent(self.library.unique_viewed, total_materials),
        }
    }
}

/// Normalized account state. Recomputed on every input change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountView {
    pub identity: Identity,
    pub subscription: Subscription,
    pub loyalty: LoyaltyStatus,
    pub referral: ReferralStats,
    pub library: LibraryStats,
    pub progress_percent: f64,
}

impl AccountView {
    pub fn has_active_subscription(&self) -> bool {
        self.subscription.is_active
    }
}
