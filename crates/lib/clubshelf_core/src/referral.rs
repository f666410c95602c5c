// @awa-component: REF-ReferralModel
//
//! Referral balance adjustments.

use thiserror::Error;

use crate::models::account::ReferralStats;

/// Referral errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferralError {
    #[error("Adjustment amount must be non-zero")]
    ZeroAdjustment,

    #[error("Balance cannot go negative (balance {balance}, adjustment {amount})")]
    NegativeBalance { balance: i64, amount: i64 },

    #[error("Adjustment of {amount} overflows the referral counters")]
    Overflow { amount: i64 },
}

impl ReferralStats {
    /// Credit (positive) or debit (negative) the spendable balance.
    ///
    /// Credits also count towards `total_earned`, keeping
    /// `balance <= total_earned`.
    pub fn adjusted(&self, amount: i64) -> Result<ReferralStats, ReferralError> {
        if amount == 0 {
            return Err(ReferralError::ZeroAdjustment);
        }
        let overflow = || ReferralError::Overflow { amount };
        let balance = self.balance.checked_add(amount).ok_or_else(overflow)?;
        if balance < 0 {
            return Err(ReferralError::NegativeBalance {
                balance: self.balance,
                amount,
            });
        }
        let total_earned = if amount > 0 {
            self.total_earned.checked_add(amount).ok_or_else(overflow)?
        } else {
            self.total_earned
        };
        Ok(ReferralStats {
            balance,
            referrals_count: self.referrals_count,
            total_earned,
        })
    }
}
