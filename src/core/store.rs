//! Store abstraction for lifeledger's state.
//!
//! The core only ever talks to a [`LedgerStore`]: an atomic `get`/`put` over a
//! flat key space. Commit ordering and conflict detection belong to whoever
//! owns the ledger; here that is SQLite, driven one transaction per invocation
//! by [`crate::core::broker::DbBroker`].

use crate::core::envelope::now_epoch_z;
use crate::core::error::LedgerError;
use crate::core::schemas;
use rusqlite::{OptionalExtension, Transaction, params};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Key-value ledger seen by one invocation.
///
/// Writes become visible to later reads in the same invocation. Whether they
/// survive is decided by the owner of the ledger once the invocation returns.
pub trait LedgerStore {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;
    fn put_state(&mut self, key: &str, value: &[u8]) -> Result<(), LedgerError>;
}

/// Store handle representing a lifeledger workspace on disk.
#[derive(Debug, Clone)]
pub struct Store {
    /// Absolute path to the `.lifeledger` directory
    pub root: PathBuf,
}

impl Store {
    /// Locates the nearest `.lifeledger` directory at or above `start_dir`.
    pub fn discover(start_dir: &Path) -> Result<Self, LedgerError> {
        let mut current_dir = PathBuf::from(start_dir);
        loop {
            let candidate = current_dir.join(schemas::STORE_DIR_NAME);
            if candidate.is_dir() {
                return Ok(Self { root: candidate });
            }
            if !current_dir.pop() {
                return Err(LedgerError::NotFound(format!(
                    "'{}' directory not found in current or parent directories. \
                     Run `lifeledger init` first.",
                    schemas::STORE_DIR_NAME
                )));
            }
        }
    }

    /// Path of a file inside the store, e.g. the configured database name.
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

/// In-process ledger with no durability. Used by unit tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryLedger {
    state: BTreeMap<String, Vec<u8>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }
}

impl LedgerStore for MemoryLedger {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(self.state.get(key).cloned())
    }

    fn put_state(&mut self, key: &str, value: &[u8]) -> Result<(), LedgerError> {
        self.state.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Ledger view over an open SQLite transaction.
pub struct SqliteLedger<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> SqliteLedger<'conn> {
    pub fn new(tx: Transaction<'conn>) -> Self {
        Self { tx }
    }

    pub fn commit(self) -> Result<(), LedgerError> {
        self.tx.commit().map_err(LedgerError::RusqliteError)
    }

    pub fn rollback(self) -> Result<(), LedgerError> {
        self.tx.rollback().map_err(LedgerError::RusqliteError)
    }
}

impl LedgerStore for SqliteLedger<'_> {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        self.tx
            .query_row(
                "SELECT value FROM ledger_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(LedgerError::RusqliteError)
    }

    fn put_state(&mut self, key: &str, value: &[u8]) -> Result<(), LedgerError> {
        self.tx.execute(
            "INSERT INTO ledger_state(key, value, updated_at) VALUES(?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
               value = excluded.value,
               updated_at = excluded.updated_at",
            params![key, value, now_epoch_z()],
        )?;
        Ok(())
    }
}
