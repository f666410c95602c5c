//! Command validation and state derivation.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use super::AdminError;
use crate::entitlement::parse_timestamp;
use crate::loyalty::{LoyaltyTier, days_in_club, derive_loyalty};
use crate::models::account::{AccountRecord, SubscriptionRecord};
use crate::models::audit::{ActionKind, Actor, AdminAction, EntityKind};
use crate::store::{AdminStore, StoreError};

/// Commands staff can issue against a member account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    ExtendSubscription { days: i64, reason: Option<String> },
    ToggleAutoRenew,
    /// Tier as typed by the operator; validated on execution.
    SetLoyaltyTier { tier: String },
    AdjustReferralBalance { amount: i64, comment: Option<String> },
}

/// What a successful command changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateDelta {
    SubscriptionExtended {
        old_end: Option<DateTime<Utc>>,
        new_end: DateTime<Utc>,
        days_added: i64,
    },
    AutoRenewToggled {
        enabled: bool,
    },
    LoyaltyTierSet {
        old_tier: LoyaltyTier,
        new_tier: LoyaltyTier,
    },
    ReferralBalanceAdjusted {
        old_balance: i64,
        new_balance: i64,
        amount: i64,
    },
}

/// Validated, not yet applied result of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    account: AccountRecord,
    delta: StateDelta,
    audit: AdminAction,
}

/// Applied result of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReceipt {
    pub account: AccountRecord,
    pub delta: StateDelta,
    pub audit: AdminAction,
}

impl CommandOutcome {
    pub fn account(&self) -> &AccountRecord {
        &self.account
    }

    pub fn delta(&self) -> &StateDelta {
        &self.delta
    }

    pub fn audit(&self) -> &AdminAction {
        &self.audit
    }

    /// Persist the updated account together with its audit entry.
    pub fn commit<S: AdminStore + ?Sized>(self, store: &S) -> Result<CommandReceipt, StoreError> {
        store.commit(&self.account, &self.audit)?;
        Ok(CommandReceipt {
            account: self.account,
            delta: self.delta,
            audit: self.audit,
        })
    }
}

/// Validate `command` against `account` and derive the resulting state.
///
/// Pure: nothing is written and validation failures leave no trace.
pub fn execute(
    actor: &Actor,
    account: &AccountRecord,
    command: &AdminCommand,
    now: DateTime<Utc>,
) -> Result<CommandOutcome, AdminError> {
    let mut next = account.clone();

    let (delta, entity, details) = match command {
        AdminCommand::ExtendSubscription { days, reason } => {
            let (old_end, new_end) = extended_end(account, *days, now)?;
            next.subscription = Some(SubscriptionRecord {
                end_date: new_end.to_rfc3339(),
            });
            let details = with_note(
                format!("subscription extended by {days} days"),
                reason.as_deref(),
            );
            (
                StateDelta::SubscriptionExtended {
                    old_end,
                    new_end,
                    days_added: *days,
                },
                EntityKind::Subscription,
                details,
            )
        }
        AdminCommand::ToggleAutoRenew => {
            next.auto_renew.enabled = !account.auto_renew.enabled;
            let enabled = next.auto_renew.enabled;
            let details = format!(
                "auto-renew {}",
                if enabled { "enabled" } else { "disabled" }
            );
            (StateDelta::AutoRenewToggled { enabled }, EntityKind::Subscription, details)
        }
        AdminCommand::SetLoyaltyTier { tier } => {
            let new_tier: LoyaltyTier = tier.parse()?;
            let days = days_in_club(account.loyalty.first_payment_date.as_deref(), now);
            let old_tier = derive_loyalty(days, account.loyalty.override_tier).tier;
            next.loyalty.override_tier = Some(new_tier);
            let details = format!("loyalty tier {old_tier} -> {new_tier}");
            (
                StateDelta::LoyaltyTierSet { old_tier, new_tier },
                EntityKind::Loyalty,
                details,
            )
        }
        AdminCommand::AdjustReferralBalance { amount, comment } => {
            let adjusted = account.referral.adjusted(*amount)?;
            next.referral = adjusted;
            let details = with_note(
                format!("referral balance adjusted by {amount:+}"),
                comment.as_deref(),
            );
            (
                StateDelta::ReferralBalanceAdjusted {
                    old_balance: account.referral.balance,
                    new_balance: adjusted.balance,
                    amount: *amount,
                },
                EntityKind::Referral,
                details,
            )
        }
    };

    let audit = AdminAction::new(actor.clone(), ActionKind::Edit, entity, now)
        .with_entity(Some(account.identity.id), Some(account.identity.name.clone()))
        .with_details(details);

    Ok(CommandOutcome {
        account: next,
        delta,
        audit,
    })
}

/// New end date for an extension: from the later of the current end and now.
fn extended_end(
    account: &AccountRecord,
    days: i64,
    now: DateTime<Utc>,
) -> Result<(Option<DateTime<Utc>>, DateTime<Utc>), AdminError> {
    if days <= 0 {
        return Err(AdminError::Validation(format!(
            "days must be positive, got {days}"
        )));
    }
    let old_end = account
        .subscription
        .as_ref()
        .and_then(|s| parse_timestamp(&s.end_date));
    let base = old_end.filter(|end| *end > now).unwrap_or(now);
    let new_end = TimeDelta::try_days(days)
        .and_then(|delta| base.checked_add_signed(delta))
        .ok_or_else(|| {
            AdminError::Validation(format!("extension of {days} days is out of range"))
        })?;
    Ok((old_end, new_end))
}

fn with_note(details: String, note: Option<&str>) -> String {
    match note.map(str::trim) {
        Some(note) if !note.is_empty() => format!("{details}: {note}"),
        _ => details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::{AutoRenew, Identity, ReferralStats};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 1, 12, 0, 0).unwrap()
    }

    fn admin() -> Actor {
        Actor {
            id: 1,
            name: "Maria".into(),
        }
    }

    fn account_with_days_left(days: i64) -> AccountRecord {
        let mut account = AccountRecord::new(Identity {
            id: 42,
            name: "Anna".into(),
            username: None,
            avatar: None,
        });
        account.subscription = Some(SubscriptionRecord {
            end_date: (now() + Duration::days(days) - Duration::hours(6)).to_rfc3339(),
        });
        account.auto_renew = AutoRenew {
            enabled: true,
            streak: 3,
        };
        account
    }

    #[test]
    fn extend_adds_days_to_remaining_entitlement() {
        let account = account_with_days_left(3);
        assert_eq!(account.entitlement(now()).days_left, 3);

        let outcome = execute(
            &admin(),
            &account,
            &AdminCommand::ExtendSubscription {
                days: 7,
                reason: Some("compensation".into()),
            },
            now(),
        )
        .unwrap();

        let sub = outcome.account().entitlement(now());
        assert_eq!(sub.days_left, 10);
        assert!(sub.auto_renew_enabled);
        assert_eq!(sub.auto_renew_streak, 3);

        let audit = outcome.audit();
        assert_eq!(audit.action, ActionKind::Edit);
        assert_eq!(audit.entity, EntityKind::Subscription);
        assert_eq!(audit.entity_id, Some(42));
        assert_eq!(audit.details, "subscription extended by 7 days: compensation");
    }

    #[test]
    fn extend_expired_subscription_starts_from_now() {
        let account = account_with_days_left(-30);
        let outcome = execute(
            &admin(),
            &account,
            &AdminCommand::ExtendSubscription { days: 5, reason: None },
            now(),
        )
        .unwrap();
        let StateDelta::SubscriptionExtended { new_end, .. } = outcome.delta() else {
            panic!("unexpected delta {:?}", outcome.delta());
        };
        assert_eq!(*new_end, now() + Duration::days(5));
    }

    #[test]
    fn extend_without_subscription_grants_one() {
        let mut account = account_with_days_left(1);
        account.subscription = None;
        account.auto_renew = AutoRenew::default();
        let outcome = execute(
            &admin(),
            &account,
            &AdminCommand::ExtendSubscription { days: 30, reason: None },
            now(),
        )
        .unwrap();
        let sub = outcome.account().entitlement(now());
        assert_eq!(sub.days_left, 30);
        assert!(!sub.auto_renew_enabled);
    }

    #[test]
    fn extend_rejects_non_positive_days() {
        for days in [0, -1, -365] {
            let err = execute(
                &admin(),
                &account_with_days_left(3),
                &AdminCommand::ExtendSubscription { days, reason: None },
                now(),
            )
            .unwrap_err();
            assert!(err.is_validation(), "{days}: {err}");
        }
    }

    #[test]
    fn extend_rejects_absurd_ranges() {
        let err = execute(
            &admin(),
            &account_with_days_left(3),
            &AdminCommand::ExtendSubscription {
                days: i64::MAX,
                reason: None,
            },
            now(),
        )
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn toggle_flips_auto_renew() {
        let account = account_with_days_left(3);
        let outcome = execute(&admin(), &account, &AdminCommand::ToggleAutoRenew, now()).unwrap();
        assert_eq!(outcome.delta(), &StateDelta::AutoRenewToggled { enabled: false });
        assert_eq!(outcome.audit().entity, EntityKind::Subscription);

        let again =
            execute(&admin(), outcome.account(), &AdminCommand::ToggleAutoRenew, now()).unwrap();
        assert_eq!(again.delta(), &StateDelta::AutoRenewToggled { enabled: true });
        assert_eq!(again.account().auto_renew.streak, 3);
    }

    #[test]
    fn toggle_without_subscription_flips_account_flag() {
        let mut account = account_with_days_left(3);
        account.subscription = None;
        account.auto_renew = AutoRenew::default();

        let outcome = execute(&admin(), &account, &AdminCommand::ToggleAutoRenew, now()).unwrap();
        assert_eq!(outcome.delta(), &StateDelta::AutoRenewToggled { enabled: true });
        assert!(outcome.account().auto_renew.enabled);
        assert_eq!(outcome.account().subscription, None);
        assert_eq!(outcome.audit().details, "auto-renew enabled");
        assert!(outcome.account().entitlement(now()).auto_renew_enabled);
    }

    #[test]
    fn set_tier_overrides_day_derived_tier() {
        let mut account = account_with_days_left(3);
        account.loyalty.first_payment_date = Some((now() - Duration::days(100)).to_rfc3339());

        let outcome = execute(
            &admin(),
            &account,
            &AdminCommand::SetLoyaltyTier {
                tier: "platinum".into(),
            },
            now(),
        )
        .unwrap();
        assert_eq!(
            outcome.delta(),
            &StateDelta::LoyaltyTierSet {
                old_tier: LoyaltyTier::Silver,
                new_tier: LoyaltyTier::Platinum,
            }
        );
        assert_eq!(outcome.audit().entity, EntityKind::Loyalty);

        let days = days_in_club(outcome.account().loyalty.first_payment_date.as_deref(), now());
        let status = derive_loyalty(days, outcome.account().loyalty.override_tier);
        assert_eq!(status.tier, LoyaltyTier::Platinum);
        assert_eq!(status.days_in_club, 100);
    }

    #[test]
    fn set_tier_rejects_unknown_names() {
        let account = account_with_days_left(3);
        let err = execute(
            &admin(),
            &account,
            &AdminCommand::SetLoyaltyTier {
                tier: "diamond".into(),
            },
            now(),
        )
        .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("diamond"));
    }

    #[test]
    fn adjust_balance_updates_referral_stats() {
        let mut account = account_with_days_left(3);
        account.referral = ReferralStats {
            balance: 200,
            referrals_count: 4,
            total_earned: 900,
        };
        let outcome = execute(
            &admin(),
            &account,
            &AdminCommand::AdjustReferralBalance {
                amount: -150,
                comment: Some("payout".into()),
            },
            now(),
        )
        .unwrap();
        assert_eq!(outcome.account().referral.balance, 50);
        assert_eq!(outcome.audit().entity, EntityKind::Referral);
        assert_eq!(outcome.audit().details, "referral balance adjusted by -150: payout");

        let err = execute(
            &admin(),
            outcome.account(),
            &AdminCommand::AdjustReferralBalance {
                amount: -51,
                comment: None,
            },
            now(),
        )
        .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn execute_does_not_touch_input() {
        let account = account_with_days_left(3);
        let before = account.clone();
        let _ = execute(
            &admin(),
            &account,
            &AdminCommand::ExtendSubscription { days: 7, reason: None },
            now(),
        );
        assert_eq!(account, before);
    }
}
