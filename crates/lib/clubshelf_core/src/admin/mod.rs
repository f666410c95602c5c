// @awa-component: ADM-MutationSurface
//
//! Administrative mutation surface.
//!
//! Commands are executed in two steps. [`commands::execute`] is pure: it
//! validates the command against the current account and returns a
//! [`commands::CommandOutcome`] holding both the updated account and the audit
//! entry. Only [`commands::CommandOutcome::commit`] writes, and it hands both
//! to the store in one call, so a state change can never be applied without
//! its audit record or the other way round.

pub mod commands;
pub mod service;

use thiserror::Error;

use crate::loyalty::LoyaltyError;
use crate::referral::ReferralError;
use crate::store::StoreError;

pub use commands::{AdminCommand, CommandOutcome, CommandReceipt, StateDelta, execute};
pub use service::AdminService;

/// Administrative command errors.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl AdminError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<LoyaltyError> for AdminError {
    fn from(e: LoyaltyError) -> Self {
        AdminError::Validation(e.to_string())
    }
}

impl From<ReferralError> for AdminError {
    fn from(e: ReferralError) -> Self {
        AdminError::Validation(e.to_string())
    }
}
