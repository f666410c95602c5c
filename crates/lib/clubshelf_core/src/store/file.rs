//! JSON file store.
//!
//! The whole state lives in one pretty-printed JSON document. Every write goes
//! to a temporary file in the same directory which is then renamed over the
//! previous one, so readers never observe a half-written state.

use std::fs;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::debug;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::{AdminStore, StoreError};
use crate::models::account::AccountRecord;
use crate::models::audit::{AdminAction, newest_first};

/// On-disk document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFile {
    /// Number of published materials, used for progress.
    #[serde(default)]
    pub total_materials: u64,
    #[serde(default)]
    pub accounts: Vec<AccountRecord>,
    #[serde(default)]
    pub audit: Vec<AdminAction>,
}

impl StateFile {
    fn account(&self, identity_id: i64) -> Option<&AccountRecord> {
        self.accounts.iter().find(|a| a.identity.id == identity_id)
    }

    fn upsert(&mut self, account: &AccountRecord) {
        match self
            .accounts
            .iter_mut()
            .find(|a| a.identity.id == account.identity.id)
        {
            Some(existing) => *existing = account.clone(),
            None => self.accounts.push(account.clone()),
        }
    }
}

/// Store backed by a single JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current document. A missing file is an empty state.
    pub fn load(&self) -> Result<StateFile, StoreError> {
        if !self.path.exists() {
            return Ok(StateFile::default());
        }
        let file = fs::File::open(&self.path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Atomically replace the document.
    pub fn save(&self, state: &StateFile) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, state)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        debug!("state written to {}", self.path.display());
        Ok(())
    }

    /// Read, modify and write back under the store's write lock.
    fn update(&self, f: impl FnOnce(&mut StateFile)) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut state = self.load()?;
        f(&mut state);
        self.save(&state)
    }
}

impl AdminStore for JsonFileStore {
    fn account(&self, identity_id: i64) -> Result<Option<AccountRecord>, StoreError> {
        Ok(self.load()?.account(identity_id).cloned())
    }

    fn commit(&self, account: &AccountRecord, action: &AdminAction) -> Result<(), StoreError> {
        self.update(|state| {
            state.upsert(account);
            state.audit.push(action.clone());
        })
    }

    fn append(&self, action: &AdminAction) -> Result<(), StoreError> {
        self.update(|state| state.audit.push(action.clone()))
    }

    fn history(&self, limit: usize) -> Result<Vec<AdminAction>, StoreError> {
        let mut entries = self.load()?.audit;
        newest_first(&mut entries);
        entries.truncate(limit);
        Ok(entries)
    }
}
