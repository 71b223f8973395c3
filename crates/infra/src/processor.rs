//! Event processor: the single projection that turns journal events into the
//! account directory, transaction table, entry index and period table.
//!
//! The live path and recovery replay both go through here. Timestamps that
//! describe "when the ledger learned something" are taken from the envelope,
//! so replaying a journal reproduces the projection byte for byte.

use std::collections::BTreeSet;

use thiserror::Error;

use folio_accounting::{
    AccountClosed, AccountCreated, LedgerEvent, PeriodClosed, PeriodCreated, TransactionCreated,
    TransactionPosted, TransactionReversed, TransactionStatus,
};
use folio_core::DomainError;
use folio_events::{EventEnvelope, Projection};

use crate::store::{LedgerStore, StorageError, Write, WriteBatch};

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The event refers to a record the projection has never seen.
    #[error("{entity} {id} referenced by event is missing")]
    Missing { entity: &'static str, id: String },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

fn missing(entity: &'static str, id: impl core::fmt::Display) -> ProcessError {
    ProcessError::Missing {
        entity,
        id: id.to_string(),
    }
}

/// Projection of `LedgerEvent`s into a `LedgerStore`.
#[derive(Debug)]
pub struct EventProcessor<S> {
    store: S,
}

impl<S> EventProcessor<S>
where
    S: LedgerStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn account_created(
        &self,
        env: &EventEnvelope<LedgerEvent>,
        ev: &AccountCreated,
    ) -> Result<WriteBatch, ProcessError> {
        let mut account = ev.account.clone();
        account.created_at = env.transaction_time();

        let mut batch = WriteBatch::new();
        batch.push(Write::PutAccount(account));
        Ok(batch)
    }

    fn account_closed(&self, ev: &AccountClosed) -> Result<WriteBatch, ProcessError> {
        let mut account = self
            .store
            .account(&ev.account_id)?
            .ok_or_else(|| missing("account", &ev.account_id))?;
        account.closed_at = Some(ev.closed_at);

        let mut batch = WriteBatch::new();
        batch.push(Write::PutAccount(account));
        Ok(batch)
    }

    fn transaction_created(
        &self,
        env: &EventEnvelope<LedgerEvent>,
        ev: &TransactionCreated,
    ) -> Result<WriteBatch, ProcessError> {
        let mut txn = ev.transaction.clone();
        txn.status = TransactionStatus::Pending;
        txn.transaction_time = env.transaction_time();
        txn.created_at = env.transaction_time();
        txn.updated_at = env.transaction_time();
        txn.user_id = Some(env.user_id().clone());

        let mut batch = WriteBatch::new();
        batch.push(Write::PutTransaction(txn));
        Ok(batch)
    }

    /// The only path that flips a transaction to `Posted` and exposes its
    /// entries to balance queries. Status and index land in one batch.
    fn transaction_posted(
        &self,
        env: &EventEnvelope<LedgerEvent>,
        ev: &TransactionPosted,
    ) -> Result<WriteBatch, ProcessError> {
        let mut txn = self
            .store
            .transaction(&ev.transaction_id)?
            .ok_or_else(|| missing("transaction", ev.transaction_id))?;

        let mut ids = BTreeSet::new();
        for entry in &ev.entries {
            let Some(id) = entry.id else {
                return Err(DomainError::invariant(format!(
                    "posting of {} carries entries without ids",
                    ev.transaction_id
                ))
                .into());
            };
            if !ids.insert(id) {
                return Err(DomainError::invariant(format!(
                    "posting of {} repeats entry id {id}",
                    ev.transaction_id
                ))
                .into());
            }
        }

        txn.mark_posted(ev.entries.clone(), env.transaction_time())?;

        let mut batch = WriteBatch::new();
        for entry in &txn.entries {
            batch.push(Write::IndexEntry(entry.clone()));
        }
        batch.push(Write::PutTransaction(txn));
        Ok(batch)
    }

    fn transaction_reversed(
        &self,
        env: &EventEnvelope<LedgerEvent>,
        ev: &TransactionReversed,
    ) -> Result<WriteBatch, ProcessError> {
        let mut txn = self
            .store
            .transaction(&ev.transaction_id)?
            .ok_or_else(|| missing("transaction", ev.transaction_id))?;
        txn.mark_reversed(ev.reversal_id, env.transaction_time())?;

        let mut batch = WriteBatch::new();
        batch.push(Write::PutTransaction(txn));
        Ok(batch)
    }

    fn period_created(&self, ev: &PeriodCreated) -> Result<WriteBatch, ProcessError> {
        let mut batch = WriteBatch::new();
        batch.push(Write::PutPeriod(ev.period.clone()));
        Ok(batch)
    }

    fn period_closed(
        &self,
        env: &EventEnvelope<LedgerEvent>,
        ev: &PeriodClosed,
    ) -> Result<WriteBatch, ProcessError> {
        let mut period = self
            .store
            .period(&ev.period_id)?
            .ok_or_else(|| missing("period", ev.period_id))?;
        period.close(ev.soft, env.transaction_time())?;

        let mut batch = WriteBatch::new();
        batch.push(Write::PutPeriod(period));
        Ok(batch)
    }
}

impl<S> Projection for EventProcessor<S>
where
    S: LedgerStore,
{
    type Ev = LedgerEvent;
    type Error = ProcessError;

    fn apply(&mut self, env: &EventEnvelope<LedgerEvent>) -> Result<(), ProcessError> {
        let batch = match env.payload() {
            LedgerEvent::AccountCreated(ev) => self.account_created(env, ev)?,
            LedgerEvent::AccountClosed(ev) => self.account_closed(ev)?,
            LedgerEvent::TransactionCreated(ev) => self.transaction_created(env, ev)?,
            LedgerEvent::TransactionPosted(ev) => self.transaction_posted(env, ev)?,
            LedgerEvent::TransactionReversed(ev) => self.transaction_reversed(env, ev)?,
            LedgerEvent::PeriodCreated(ev) => self.period_created(ev)?,
            LedgerEvent::PeriodClosed(ev) => self.period_closed(env, ev)?,
        };
        self.store.commit(batch)?;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), ProcessError> {
        self.store.clear()?;
        Ok(())
    }
}
