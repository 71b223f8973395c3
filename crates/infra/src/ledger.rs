//! The consumer-facing ledger.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use folio_accounting::{
    Account, AccountClosed, AccountCreated, AccountType, LedgerEvent, Period, Transaction,
    TransactionCreated, TransactionStatus, ValidationResult,
};
use folio_core::{AccountId, Amount, DomainError, PeriodId, TransactionId, UserId};
use folio_events::JournalEvent;

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult, StorageContext};
use crate::event_log::{EventLog, InMemoryEventLog, JsonlEventLog};
use crate::journal::Journal;
use crate::periods::PeriodGate;
use crate::posting::{PostingEngine, load_account, load_transaction};
use crate::query::{AccountBalance, BalanceQuery, RollupFilter, RollupGroup, TrialBalance};
use crate::store::{InMemoryLedgerStore, LedgerStore};

/// Embedded bi-temporal double-entry ledger.
///
/// Every mutation is appended to the journal first and then applied to the
/// projection store. Mutating calls take `&mut self`; hosts sharing a ledger
/// across threads wrap it in their own lock.
#[derive(Debug)]
pub struct Ledger<L = InMemoryEventLog, S = InMemoryLedgerStore>
where
    S: LedgerStore,
{
    journal: Journal<L, S>,
    engine: PostingEngine,
    periods: PeriodGate,
    config: LedgerConfig,
}

impl Ledger {
    /// Ledger with an in-memory journal and projection.
    pub fn in_memory(config: LedgerConfig) -> Self {
        Self::new(InMemoryEventLog::new(), InMemoryLedgerStore::new(), config)
    }
}

impl Ledger<Arc<dyn EventLog>, InMemoryLedgerStore> {
    /// Build the journal named by the configuration (JSON lines when
    /// `event_log_path` is set, memory otherwise) and recover from it.
    pub fn from_config(config: LedgerConfig) -> LedgerResult<Self> {
        let log: Arc<dyn EventLog> = match &config.event_log_path {
            Some(path) => Arc::new(JsonlEventLog::open(path).context("open", "journal")?),
            None => Arc::new(InMemoryEventLog::new()),
        };
        Self::open(log, InMemoryLedgerStore::new(), config)
    }
}

impl<L, S> Ledger<L, S>
where
    L: EventLog,
    S: LedgerStore,
{
    /// Wrap a journal and a store without replaying. Use `open` when the
    /// journal may already hold events.
    pub fn new(log: L, store: S, config: LedgerConfig) -> Self {
        Self {
            journal: Journal::new(log, store),
            engine: PostingEngine::new(&config),
            periods: PeriodGate,
            config,
        }
    }

    /// Wrap a journal and rebuild the projection from it.
    pub fn open(log: L, store: S, config: LedgerConfig) -> LedgerResult<Self> {
        let mut ledger = Self::new(log, store, config);
        let applied = ledger.journal.replay()?;
        info!(events = applied, "ledger recovered from journal");
        Ok(ledger)
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        self.journal.store()
    }

    pub fn journal(&self) -> &L {
        self.journal.log()
    }

    // ---- accounts ----

    pub fn create_account(&mut self, account: Account, user_id: &UserId) -> LedgerResult<Account> {
        let store = self.journal.store();
        if store.account(&account.id).context("load", "account")?.is_some() {
            let msg = format!("account {} already exists", account.id);
            return Err(DomainError::conflict(msg).into());
        }
        if let Some(parent) = &account.parent_id {
            load_account(store, parent)?;
        }

        let id = account.id.clone();
        self.journal.record(
            LedgerEvent::AccountCreated(AccountCreated { account }),
            Utc::now(),
            user_id,
        )?;
        info!(account_id = %id, user_id = %user_id, "account created");

        load_account(self.journal.store(), &id)
    }

    /// Close an account: postings effective at or after `closed_at` are
    /// rejected with `ACCOUNT_CLOSED`. History stays untouched.
    pub fn close_account(
        &mut self,
        account_id: &AccountId,
        closed_at: DateTime<Utc>,
        user_id: &UserId,
    ) -> LedgerResult<Account> {
        let account = load_account(self.journal.store(), account_id)?;
        if let Some(closed) = account.closed_at {
            return Err(LedgerError::precondition(format!(
                "account {account_id} was already closed at {closed}"
            )));
        }

        self.journal.record(
            LedgerEvent::AccountClosed(AccountClosed {
                account_id: account_id.clone(),
                closed_at,
            }),
            closed_at,
            user_id,
        )?;
        info!(account_id = %account_id, user_id = %user_id, "account closed");

        load_account(self.journal.store(), account_id)
    }

    pub fn get_account(&self, account_id: &AccountId) -> LedgerResult<Account> {
        load_account(self.journal.store(), account_id)
    }

    // ---- transactions ----

    /// Record a pending transaction. Its entries stay invisible to balances
    /// until it is posted.
    pub fn create_transaction(
        &mut self,
        mut txn: Transaction,
        user_id: &UserId,
    ) -> LedgerResult<Transaction> {
        if txn.status != TransactionStatus::Pending {
            return Err(LedgerError::precondition(format!(
                "new transactions must be pending, got {:?}",
                txn.status
            )));
        }
        if self
            .journal
            .store()
            .transaction(&txn.id)
            .context("load", "transaction")?
            .is_some()
        {
            let msg = format!("transaction {} already exists", txn.id);
            return Err(DomainError::conflict(msg).into());
        }

        let id = txn.id;
        for entry in &mut txn.entries {
            entry.transaction_id = id;
        }

        let valid_time = txn.valid_time;
        self.journal.record(
            LedgerEvent::TransactionCreated(TransactionCreated { transaction: txn }),
            valid_time,
            user_id,
        )?;

        load_transaction(self.journal.store(), id)
    }

    pub fn get_transaction(&self, txn_id: TransactionId) -> LedgerResult<Transaction> {
        load_transaction(self.journal.store(), txn_id)
    }

    pub fn validate_transaction(&self, txn: &Transaction) -> LedgerResult<ValidationResult> {
        self.engine.validate_transaction(self.journal.store(), txn)
    }

    pub fn post_transaction(
        &mut self,
        txn_id: TransactionId,
        user_id: &UserId,
    ) -> LedgerResult<Transaction> {
        self.engine.post_transaction(&mut self.journal, txn_id, user_id)
    }

    /// Reverse a posted transaction; returns the posted mirror.
    pub fn reverse_transaction(
        &mut self,
        original_id: TransactionId,
        description: impl Into<String>,
        user_id: &UserId,
    ) -> LedgerResult<Transaction> {
        self.engine
            .reverse_transaction(&mut self.journal, original_id, description, user_id)
    }

    /// Reverse with an explicit valid time for the mirror.
    pub fn reverse_transaction_at(
        &mut self,
        original_id: TransactionId,
        description: impl Into<String>,
        valid_time: DateTime<Utc>,
        user_id: &UserId,
    ) -> LedgerResult<Transaction> {
        self.engine.reverse_transaction_at(
            &mut self.journal,
            original_id,
            description,
            Some(valid_time),
            user_id,
        )
    }

    // ---- balances ----

    pub fn calculate_account_balance(
        &self,
        account_id: &AccountId,
        as_of: DateTime<Utc>,
    ) -> LedgerResult<Amount> {
        self.engine
            .calculate_account_balance(self.journal.store(), account_id, as_of)
    }

    /// Balance as of `as_of`, as the ledger knew it at `known_at`.
    pub fn calculate_account_balance_known_at(
        &self,
        account_id: &AccountId,
        as_of: DateTime<Utc>,
        known_at: DateTime<Utc>,
    ) -> LedgerResult<Amount> {
        self.engine.calculate_account_balance_known_at(
            self.journal.store(),
            account_id,
            as_of,
            known_at,
        )
    }

    pub fn get_account_balance(
        &self,
        account_id: &AccountId,
        as_of: DateTime<Utc>,
    ) -> LedgerResult<AccountBalance> {
        BalanceQuery::new(&self.engine).get_account_balance(self.journal.store(), account_id, as_of)
    }

    pub fn get_trial_balance(
        &self,
        as_of: DateTime<Utc>,
        type_filter: Option<AccountType>,
    ) -> LedgerResult<TrialBalance> {
        BalanceQuery::new(&self.engine).get_trial_balance(self.journal.store(), as_of, type_filter)
    }

    pub fn dimension_rollup(
        &self,
        filter: &RollupFilter,
        keys: &[String],
    ) -> LedgerResult<Vec<RollupGroup>> {
        BalanceQuery::new(&self.engine).dimension_rollup(self.journal.store(), filter, keys)
    }

    // ---- periods ----

    pub fn create_period(
        &mut self,
        name: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        user_id: &UserId,
    ) -> LedgerResult<Period> {
        self.periods
            .create_period(&mut self.journal, name, start, end, user_id)
    }

    pub fn close_period(
        &mut self,
        period_id: PeriodId,
        soft: bool,
        user_id: &UserId,
    ) -> LedgerResult<Period> {
        self.periods
            .close_period(&mut self.journal, period_id, soft, user_id)
    }

    // ---- journal ----

    /// Journal events recorded in `[from, to]`, ordered by
    /// (transaction time, id).
    pub fn get_events(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> LedgerResult<Vec<JournalEvent>> {
        self.journal.events(from, to)
    }

    /// Rebuild every projection from the journal. Safe to repeat.
    pub fn replay(&mut self) -> LedgerResult<usize> {
        let applied = self.journal.replay()?;
        info!(events = applied, "projection rebuilt from journal");
        Ok(applied)
    }
}
