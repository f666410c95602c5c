// @awa-component: NTF-MemberNotifications
//
//! Member notifications sent after administrative commands.
//!
//! Delivery is fire-and-forget: a failed notification is logged and never
//! rolls back or fails the command that triggered it.

use std::fmt;

use log::info;
use thiserror::Error;

use crate::admin::StateDelta;
use crate::loyalty::LoyaltyTier;

/// Notification delivery errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification channel unavailable: {0}")]
    Unavailable(String),
}

/// Message templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    SubscriptionExtended { days: i64 },
    LevelChanged { tier: LoyaltyTier },
    BalanceAdjusted { amount: i64 },
}

impl Notification {
    /// Notification owed to the member for a committed change, if any.
    ///
    /// Tier changes are only announced when the new tier is not `none` and
    /// differs from the previous one. Auto-renew toggles are silent.
    pub fn for_delta(delta: &StateDelta) -> Option<Self> {
        match delta {
            StateDelta::SubscriptionExtended { days_added, .. } => {
                Some(Self::SubscriptionExtended { days: *days_added })
            }
            StateDelta::AutoRenewToggled { .. } => None,
            StateDelta::LoyaltyTierSet { old_tier, new_tier } => {
                (*new_tier != LoyaltyTier::None && new_tier != old_tier)
                    .then_some(Self::LevelChanged { tier: *new_tier })
            }
            StateDelta::ReferralBalanceAdjusted { amount, .. } => {
                Some(Self::BalanceAdjusted { amount: *amount })
            }
        }
    }

    /// Short machine-readable type, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SubscriptionExtended { .. } => "subscription_extended",
            Self::LevelChanged { .. } => "loyalty_level_changed",
            Self::BalanceAdjusted { .. } => "balance_adjusted",
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubscriptionExtended { days } => {
                write!(f, "Your subscription has been extended by {days} days!")
            }
            Self::LevelChanged { tier } => {
                write!(f, "Your loyalty status is now {}!", tier.label())
            }
            Self::BalanceAdjusted { amount } if *amount >= 0 => {
                write!(f, "Your balance has been topped up by +{amount}")
            }
            Self::BalanceAdjusted { amount } => {
                write!(f, "{} has been deducted from your balance", amount.unsigned_abs())
            }
        }
    }
}

/// Delivery channel to members.
pub trait Notifier: Send + Sync {
    fn notify(&self, identity_id: i64, notification: &Notification) -> Result<(), NotifyError>;
}

/// Notifier that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, identity_id: i64, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            "notification {} for {identity_id}: {notification}",
            notification.kind()
        );
        Ok(())
    }
}
