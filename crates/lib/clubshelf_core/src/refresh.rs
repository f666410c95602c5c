// @awa-component: SES-SessionRefresh
//
//! Session refresh. Re-fetches the member's account while the session is
//! mounted.
//!
//! Decisions keep using the last applied record while a fetch is in flight.
//! A fetched record replaces the previous one in a single write, so readers
//! see either the old or the new state, never a mix. Results of refreshes
//! that were overtaken by a newer one are dropped, and once the session is
//! ended every pending or late result is discarded.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::access::observer::SessionEvent;
use crate::models::account::{AccountRecord, AccountView};

/// Errors reported by an [`AccountSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Account source unavailable: {0}")]
    Unavailable(String),
}

/// Refresh errors. The session keeps its last known state on every error.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("Refresh failed: {0}")]
    Source(#[from] SourceError),

    #[error("Source returned account {got} for session of {expected}")]
    IdentityMismatch { expected: i64, got: i64 },

    #[error("Session has ended")]
    Ended,
}

/// What happened to a completed refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// A newer refresh was applied first.
    Superseded,
    /// The session ended before the result could be applied.
    Discarded,
}

/// Where fresh account records come from.
#[async_trait]
pub trait AccountSource: Send + Sync {
    async fn fetch(&self, identity_id: i64) -> Result<AccountRecord, SourceError>;
}

#[derive(Debug, Default)]
struct Applied {
    record: Option<AccountRecord>,
    seq: u64,
}

/// Account state for one mounted session.
#[derive(Debug)]
pub struct LiveSession {
    identity_id: i64,
    total_materials: u64,
    current: RwLock<Applied>,
    issued: AtomicU64,
    cancel: CancellationToken,
}

impl LiveSession {
    pub fn new(identity_id: i64, initial: Option<AccountRecord>, total_materials: u64) -> Self {
        Self {
            identity_id,
            total_materials,
            current: RwLock::new(Applied {
                record: initial,
                seq: 0,
            }),
            issued: AtomicU64::new(0),
            cancel: CancellationToken::new(),
        }
    }

    pub fn identity_id(&self) -> i64 {
        self.identity_id
    }

    /// Last applied account, if any.
    pub async fn record(&self) -> Option<AccountRecord> {
        self.current.read().await.record.clone()
    }

    /// Derived view of the last applied account.
    pub async fn view(&self, now: DateTime<Utc>) -> Option<AccountView> {
        self.current
            .read()
            .await
            .record
            .as_ref()
            .map(|record| record.view(now, self.total_materials))
    }

    /// Entitlement from the last known good state; `false` when unknown.
    pub async fn has_active_subscription(&self, now: DateTime<Utc>) -> bool {
        self.view(now)
            .await
            .is_some_and(|view| view.has_active_subscription())
    }

    /// Observer event describing the current entitlement.
    pub async fn entitlement_event(&self, now: DateTime<Utc>) -> SessionEvent {
        SessionEvent::EntitlementChanged {
            entitled: self.has_active_subscription(now).await,
        }
    }

    /// Fetch and apply a fresh record.
    pub async fn refresh(
        &self,
        source: &dyn AccountSource,
    ) -> Result<RefreshOutcome, RefreshError> {
        if self.cancel.is_cancelled() {
            return Err(RefreshError::Ended);
        }
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;

        let fetched = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!("refresh #{seq} for {} cancelled in flight", self.identity_id);
                return Ok(RefreshOutcome::Discarded);
            }
            result = source.fetch(self.identity_id) => result,
        };

        let record = match fetched {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    "refresh #{seq} for {} failed, keeping last known state: {e}",
                    self.identity_id
                );
                return Err(e.into());
            }
        };
        if record.identity.id != self.identity_id {
            return Err(RefreshError::IdentityMismatch {
                expected: self.identity_id,
                got: record.identity.id,
            });
        }

        let mut current = self.current.write().await;
        if self.cancel.is_cancelled() {
            warn!("discarding refresh #{seq} for ended session {}", self.identity_id);
            return Ok(RefreshOutcome::Discarded);
        }
        if seq < current.seq {
            debug!("refresh #{seq} superseded by #{}", current.seq);
            return Ok(RefreshOutcome::Superseded);
        }
        current.record = Some(record);
        current.seq = seq;
        Ok(RefreshOutcome::Applied)
    }

    /// Tear the session down. Pending refreshes are cancelled and the account
    /// state is dropped.
    pub async fn end(&self) {
        self.cancel.cancel();
        let mut current = self.current.write().await;
        current.record = None;
    }

    pub fn is_ended(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
