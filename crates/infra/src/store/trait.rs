use std::sync::Arc;

use thiserror::Error;

use folio_accounting::{Account, Entry, Period, Transaction};
use folio_core::{AccountId, PeriodId, TransactionId};

/// Persistence-medium failure.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt storage: {0}")]
    Corrupt(String),
}

/// A single projection write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    PutAccount(Account),
    PutTransaction(Transaction),
    /// Make an entry visible in its account's index (upsert by entry id).
    IndexEntry(Entry),
    PutPeriod(Period),
}

/// Writes that must become visible together or not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, write: Write) -> &mut Self {
        self.writes.push(write);
        self
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }
}

/// Id-keyed projection store.
///
/// Reads must observe the latest committed batch. `commit` must be atomic:
/// a posting's status flip and all of its index writes land together.
pub trait LedgerStore: Send + Sync {
    fn account(&self, id: &AccountId) -> Result<Option<Account>, StorageError>;

    /// The full account directory.
    fn accounts(&self) -> Result<Vec<Account>, StorageError>;

    fn transaction(&self, id: &TransactionId) -> Result<Option<Transaction>, StorageError>;

    /// Every transaction, in no particular order.
    fn transactions(&self) -> Result<Vec<Transaction>, StorageError>;

    fn period(&self, id: &PeriodId) -> Result<Option<Period>, StorageError>;

    fn periods(&self) -> Result<Vec<Period>, StorageError>;

    /// Every entry ever indexed for the account.
    fn account_entries(&self, id: &AccountId) -> Result<Vec<Entry>, StorageError>;

    /// Every indexed entry across all accounts.
    fn indexed_entries(&self) -> Result<Vec<Entry>, StorageError>;

    fn commit(&self, batch: WriteBatch) -> Result<(), StorageError>;

    /// Drop all projected state (rebuild support).
    fn clear(&self) -> Result<(), StorageError>;
}

impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    fn account(&self, id: &AccountId) -> Result<Option<Account>, StorageError> {
        (**self).account(id)
    }

    fn accounts(&self) -> Result<Vec<Account>, StorageError> {
        (**self).accounts()
    }

    fn transaction(&self, id: &TransactionId) -> Result<Option<Transaction>, StorageError> {
        (**self).transaction(id)
    }

    fn transactions(&self) -> Result<Vec<Transaction>, StorageError> {
        (**self).transactions()
    }

    fn period(&self, id: &PeriodId) -> Result<Option<Period>, StorageError> {
        (**self).period(id)
    }

    fn periods(&self) -> Result<Vec<Period>, StorageError> {
        (**self).periods()
    }

    fn account_entries(&self, id: &AccountId) -> Result<Vec<Entry>, StorageError> {
        (**self).account_entries(id)
    }

    fn indexed_entries(&self) -> Result<Vec<Entry>, StorageError> {
        (**self).indexed_entries()
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StorageError> {
        (**self).commit(batch)
    }

    fn clear(&self) -> Result<(), StorageError> {
        (**self).clear()
    }
}
