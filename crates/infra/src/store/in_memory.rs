use std::collections::HashMap;
use std::sync::RwLock;

use folio_accounting::{Account, Entry, Period, Transaction};
use folio_core::{AccountId, EntryId, PeriodId, TransactionId};

use super::r#trait::{LedgerStore, StorageError, Write, WriteBatch};

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<AccountId, Account>,
    transactions: HashMap<TransactionId, Transaction>,
    periods: HashMap<PeriodId, Period>,
    /// Account id → entries in indexing order.
    index: HashMap<AccountId, Vec<Entry>>,
}

impl State {
    fn apply(&mut self, write: Write) {
        match write {
            Write::PutAccount(account) => {
                self.accounts.insert(account.id.clone(), account);
            }
            Write::PutTransaction(txn) => {
                self.transactions.insert(txn.id, txn);
            }
            Write::PutPeriod(period) => {
                self.periods.insert(period.id, period);
            }
            Write::IndexEntry(entry) => {
                let slot = self.index.entry(entry.account_id.clone()).or_default();
                match slot.iter_mut().find(|e| same_entry(e, &entry)) {
                    Some(existing) => *existing = entry,
                    None => slot.push(entry),
                }
            }
        }
    }
}

fn same_entry(a: &Entry, b: &Entry) -> bool {
    let key = |e: &Entry| -> Option<(TransactionId, EntryId)> { e.id.map(|id| (e.transaction_id, id)) };
    key(a).is_some() && key(a) == key(b)
}

/// In-memory projection store.
///
/// Intended for tests and for hosts that rebuild from the journal at start-up.
/// One lock guards all tables, so a committed batch is never half visible.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<State>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&State) -> T) -> Result<T, StorageError> {
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?;
        Ok(f(&state))
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn account(&self, id: &AccountId) -> Result<Option<Account>, StorageError> {
        self.read(|s| s.accounts.get(id).cloned())
    }

    fn accounts(&self) -> Result<Vec<Account>, StorageError> {
        self.read(|s| s.accounts.values().cloned().collect())
    }

    fn transaction(&self, id: &TransactionId) -> Result<Option<Transaction>, StorageError> {
        self.read(|s| s.transactions.get(id).cloned())
    }

    fn transactions(&self) -> Result<Vec<Transaction>, StorageError> {
        self.read(|s| s.transactions.values().cloned().collect())
    }

    fn period(&self, id: &PeriodId) -> Result<Option<Period>, StorageError> {
        self.read(|s| s.periods.get(id).cloned())
    }

    fn periods(&self) -> Result<Vec<Period>, StorageError> {
        self.read(|s| s.periods.values().cloned().collect())
    }

    fn account_entries(&self, id: &AccountId) -> Result<Vec<Entry>, StorageError> {
        self.read(|s| s.index.get(id).cloned().unwrap_or_default())
    }

    fn indexed_entries(&self) -> Result<Vec<Entry>, StorageError> {
        self.read(|s| s.index.values().flatten().cloned().collect())
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?;
        for write in batch.into_writes() {
            state.apply(write);
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?;
        *state = State::default();
        Ok(())
    }
}
