//! Admin service: authorizes, executes, commits and notifies.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{info, warn};

use super::AdminError;
use super::commands::{AdminCommand, CommandReceipt, execute};
use crate::entitlement::Subscription;
use crate::loyalty::{LoyaltyStatus, days_in_club, derive_loyalty};
use crate::models::account::{AccountRecord, ReferralStats};
use crate::models::audit::{ActionKind, Actor, AdminAction, EntityKind};
use crate::notify::{Notification, Notifier};
use crate::store::AdminStore;

/// Entry point for staff operations on member accounts.
pub struct AdminService<S> {
    store: S,
    admins: HashSet<i64>,
    notifier: Arc<dyn Notifier>,
}

impl<S: AdminStore> AdminService<S> {
    pub fn new(
        store: S,
        admin_ids: impl IntoIterator<Item = i64>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            admins: admin_ids.into_iter().collect(),
            notifier,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_admin(&self, actor_id: i64) -> bool {
        self.admins.contains(&actor_id)
    }

    fn authorize(&self, actor: &Actor) -> Result<(), AdminError> {
        if self.is_admin(actor.id) {
            Ok(())
        } else {
            Err(AdminError::Forbidden(format!(
                "user {} is not an administrator",
                actor.id
            )))
        }
    }

    fn load(&self, identity_id: i64) -> Result<AccountRecord, AdminError> {
        self.store
            .account(identity_id)?
            .ok_or_else(|| AdminError::NotFound(format!("account {identity_id}")))
    }

    /// Run a command end to end.
    ///
    /// On any error nothing is written and no audit entry is recorded. After
    /// a successful commit the member is notified; notification failures are
    /// only logged.
    pub fn run(
        &self,
        actor: &Actor,
        identity_id: i64,
        command: &AdminCommand,
        now: DateTime<Utc>,
    ) -> Result<CommandReceipt, AdminError> {
        self.authorize(actor)?;
        let account = self.load(identity_id)?;
        let receipt = execute(actor, &account, command, now)?.commit(&self.store)?;

        info!(
            "admin {} {} {} on account {identity_id}: {}",
            actor.id, receipt.audit.action, receipt.audit.entity, receipt.audit.details
        );

        if let Some(notification) = Notification::for_delta(&receipt.delta)
            && let Err(e) = self.notifier.notify(identity_id, &notification)
        {
            warn!(
                "failed to send {} notification to {identity_id}: {e}",
                notification.kind()
            );
        }

        Ok(receipt)
    }

    /// Extend the subscription by `days` and return the new entitlement.
    pub fn extend_subscription(
        &self,
        actor: &Actor,
        identity_id: i64,
        days: i64,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Subscription, AdminError> {
        let receipt = self.run(
            actor,
            identity_id,
            &AdminCommand::ExtendSubscription { days, reason },
            now,
        )?;
        Ok(receipt.account.entitlement(now))
    }

    /// Flip auto-renew and return the new flag.
    pub fn toggle_auto_renew(
        &self,
        actor: &Actor,
        identity_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, AdminError> {
        let receipt = self.run(actor, identity_id, &AdminCommand::ToggleAutoRenew, now)?;
        Ok(receipt.account.auto_renew.enabled)
    }

    /// Set an explicit loyalty tier and return the resulting status.
    pub fn set_loyalty_tier(
        &self,
        actor: &Actor,
        identity_id: i64,
        tier: &str,
        now: DateTime<Utc>,
    ) -> Result<LoyaltyStatus, AdminError> {
        let receipt = self.run(
            actor,
            identity_id,
            &AdminCommand::SetLoyaltyTier {
                tier: tier.to_string(),
            },
            now,
        )?;
        let loyalty = &receipt.account.loyalty;
        let days = days_in_club(loyalty.first_payment_date.as_deref(), now);
        Ok(derive_loyalty(days, loyalty.override_tier))
    }

    /// Credit or debit the referral balance.
    pub fn adjust_referral_balance(
        &self,
        actor: &Actor,
        identity_id: i64,
        amount: i64,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<ReferralStats, AdminError> {
        let receipt = self.run(
            actor,
            identity_id,
            &AdminCommand::AdjustReferralBalance { amount, comment },
            now,
        )?;
        Ok(receipt.account.referral)
    }

    /// Record a material, category or tag change made through the content
    /// surface.
    #[allow(clippy::too_many_arguments)]
    pub fn record_content_action(
        &self,
        actor: &Actor,
        action: ActionKind,
        entity: EntityKind,
        entity_id: Option<i64>,
        entity_title: Option<String>,
        details: &str,
        now: DateTime<Utc>,
    ) -> Result<AdminAction, AdminError> {
        self.authorize(actor)?;
        if !entity.is_content() {
            return Err(AdminError::Validation(format!(
                "{entity} changes must go through account commands"
            )));
        }
        let record = AdminAction::new(actor.clone(), action, entity, now)
            .with_entity(entity_id, entity_title)
            .with_details(details);
        self.store.append(&record)?;
        Ok(record)
    }

    /// Audit log, newest first.
    pub fn history(&self, limit: usize) -> Result<Vec<AdminAction>, AdminError> {
        Ok(self.store.history(limit)?)
    }
}
