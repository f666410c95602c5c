// @awa-component: STO-AdminStore
//
//! Storage seam for account records and the audit log.
//!
//! Persistence itself belongs to the storage collaborator; the core only needs
//! these operations. `commit` must write the account and the audit entry as a
//! unit. Concurrent commits against the same account are last-write-wins.

pub mod file;
pub mod memory;

use thiserror::Error;

use crate::models::account::AccountRecord;
use crate::models::audit::AdminAction;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Account and audit persistence.
pub trait AdminStore: Send + Sync {
    /// Load one account by identity id.
    fn account(&self, identity_id: i64) -> Result<Option<AccountRecord>, StoreError>;

    /// Replace the account and append its audit entry in one step.
    fn commit(&self, account: &AccountRecord, action: &AdminAction) -> Result<(), StoreError>;

    /// Append an audit entry that has no account change (content actions).
    fn append(&self, action: &AdminAction) -> Result<(), StoreError>;

    /// Most recent audit entries, newest first.
    fn history(&self, limit: usize) -> Result<Vec<AdminAction>, StoreError>;
}
