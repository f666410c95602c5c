//! In-memory store.

use std::sync::Mutex;

use dashmap::DashMap;

use super::{AdminStore, StoreError};
use crate::models::account::AccountRecord;
use crate::models::audit::{AdminAction, newest_first};

/// Process-local store, used by tests and embedders without persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: DashMap<i64, AccountRecord>,
    audit: Mutex<Vec<AdminAction>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(accounts: impl IntoIterator<Item = AccountRecord>) -> Self {
        let store = Self::new();
        for account in accounts {
            store.insert(account);
        }
        store
    }

    /// Insert or replace an account without auditing (identity collaborator
    /// path, not an admin command).
    pub fn insert(&self, account: AccountRecord) {
        self.accounts.insert(account.identity.id, account);
    }

    /// Number of audit entries recorded so far.
    pub fn audit_len(&self) -> usize {
        self.audit.lock().map_or(0, |audit| audit.len())
    }
}

impl AdminStore for MemoryStore {
    fn account(&self, identity_id: i64) -> Result<Option<AccountRecord>, StoreError> {
        Ok(self.accounts.get(&identity_id).map(|entry| entry.value().clone()))
    }

    fn commit(&self, account: &AccountRecord, action: &AdminAction) -> Result<(), StoreError> {
        let mut audit = self.audit.lock().map_err(|_| StoreError::Poisoned)?;
        self.accounts.insert(account.identity.id, account.clone());
        audit.push(action.clone());
        Ok(())
    }

    fn append(&self, action: &AdminAction) -> Result<(), StoreError> {
        let mut audit = self.audit.lock().map_err(|_| StoreError::Poisoned)?;
        audit.push(action.clone());
        Ok(())
    }

    fn history(&self, limit: usize) -> Result<Vec<AdminAction>, StoreError> {
        let mut entries = self.audit.lock().map_err(|_| StoreError::Poisoned)?.clone();
        newest_first(&mut entries);
        entries.truncate(limit);
        Ok(entries)
    }
}
