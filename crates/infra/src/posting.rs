//! Posting engine: validation, the `Pending → Posted → Reversed` state
//! machine and point-in-time account balances.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use folio_accounting::{
    Account, BalanceAccumulator, Entry, LedgerEvent, Transaction, TransactionCreated,
    TransactionPosted, TransactionReversed, TransactionStatus, ValidationPolicy, ValidationResult,
    validate,
};
use folio_core::{AccountId, Amount, Currency, TransactionId, UserId};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult, StorageContext};
use crate::event_log::EventLog;
use crate::journal::Journal;
use crate::periods::covering_period;
use crate::store::LedgerStore;

/// Which transactions an entry scan may see.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Visibility {
    /// Exclude transactions effective before this instant.
    pub valid_from: Option<DateTime<Utc>>,
    /// Exclude transactions effective after this instant.
    pub valid_to: Option<DateTime<Utc>>,
    /// Exclude postings the ledger learned about after this instant.
    pub known_at: Option<DateTime<Utc>>,
}

impl Visibility {
    pub fn as_of(as_of: DateTime<Utc>) -> Self {
        Self {
            valid_to: Some(as_of),
            ..Self::default()
        }
    }

    fn admits(&self, txn: &Transaction) -> bool {
        if !txn.status.counts_in_balances() {
            return false;
        }
        if self.valid_from.is_some_and(|from| txn.valid_time < from) {
            return false;
        }
        if self.valid_to.is_some_and(|to| txn.valid_time > to) {
            return false;
        }
        match self.known_at {
            Some(known_at) => txn.posted_at.is_some_and(|posted| posted <= known_at),
            None => true,
        }
    }
}

/// Keep the entries whose transaction is visible.
pub(crate) fn visible_entries<S>(
    store: &S,
    entries: Vec<Entry>,
    visibility: Visibility,
) -> LedgerResult<Vec<Entry>>
where
    S: LedgerStore,
{
    let mut seen: HashMap<TransactionId, bool> = HashMap::new();
    let mut kept = Vec::with_capacity(entries.len());

    for entry in entries {
        let admitted = match seen.get(&entry.transaction_id) {
            Some(admitted) => *admitted,
            None => {
                let admitted = store
                    .transaction(&entry.transaction_id)
                    .context("load", "transaction")?
                    .is_some_and(|txn| visibility.admits(&txn));
                seen.insert(entry.transaction_id, admitted);
                admitted
            }
        };
        if admitted {
            kept.push(entry);
        }
    }

    Ok(kept)
}

pub(crate) fn load_account<S: LedgerStore>(store: &S, id: &AccountId) -> LedgerResult<Account> {
    store
        .account(id)
        .context("load", "account")?
        .ok_or_else(|| LedgerError::not_found("account", id))
}

pub(crate) fn load_transaction<S: LedgerStore>(
    store: &S,
    id: TransactionId,
) -> LedgerResult<Transaction> {
    store
        .transaction(&id)
        .context("load", "transaction")?
        .ok_or_else(|| LedgerError::not_found("transaction", id))
}

#[derive(Debug, Clone)]
pub struct PostingEngine {
    policy: ValidationPolicy,
    allow_reversal_of_reversal: bool,
    base_currency: Currency,
}

impl PostingEngine {
    pub fn new(config: &LedgerConfig) -> Self {
        Self {
            policy: config.validation_policy(),
            allow_reversal_of_reversal: config.allow_reversal_of_reversal,
            base_currency: config.base_currency.clone(),
        }
    }

    /// Run every posting check against the current projection.
    pub fn validate_transaction<S>(&self, store: &S, txn: &Transaction) -> LedgerResult<ValidationResult>
    where
        S: LedgerStore,
    {
        let mut accounts = BTreeMap::new();
        for entry in &txn.entries {
            if accounts.contains_key(&entry.account_id) {
                continue;
            }
            if let Some(account) = store.account(&entry.account_id).context("load", "account")? {
                accounts.insert(entry.account_id.clone(), account);
            }
        }

        let period = covering_period(store, txn.valid_time).context("list", "period")?;
        Ok(validate(txn, &accounts, period.as_ref(), self.policy))
    }

    /// Post a pending transaction.
    ///
    /// On rejection nothing is written and the transaction stays `Pending`.
    pub fn post_transaction<L, S>(
        &self,
        journal: &mut Journal<L, S>,
        txn_id: TransactionId,
        user_id: &UserId,
    ) -> LedgerResult<Transaction>
    where
        L: EventLog,
        S: LedgerStore,
    {
        let txn = load_transaction(journal.store(), txn_id)?;
        if txn.status != TransactionStatus::Pending {
            return Err(LedgerError::precondition(format!(
                "transaction {txn_id} is {:?}; only pending transactions can be posted",
                txn.status
            )));
        }

        self.ensure_valid(journal.store(), &txn)?;

        let entries = txn.entries_with_ids();
        journal.record(
            LedgerEvent::TransactionPosted(TransactionPosted {
                transaction_id: txn_id,
                entries,
            }),
            txn.valid_time,
            user_id,
        )?;

        info!(transaction_id = %txn_id, user_id = %user_id, "transaction posted");
        load_transaction(journal.store(), txn_id)
    }

    /// Reverse with the default valid time: the later of now and the
    /// original's valid time.
    pub fn reverse_transaction<L, S>(
        &self,
        journal: &mut Journal<L, S>,
        original_id: TransactionId,
        description: impl Into<String>,
        user_id: &UserId,
    ) -> LedgerResult<Transaction>
    where
        L: EventLog,
        S: LedgerStore,
    {
        self.reverse_transaction_at(journal, original_id, description, None, user_id)
    }

    /// Cancel a posted transaction by posting its mirror image.
    ///
    /// The original keeps all of its entries; balances at or after the
    /// mirror's valid time net to zero. Returns the posted mirror.
    ///
    /// If an earlier call stopped after creating or posting the mirror, that
    /// mirror (and its valid time) is reused.
    pub fn reverse_transaction_at<L, S>(
        &self,
        journal: &mut Journal<L, S>,
        original_id: TransactionId,
        description: impl Into<String>,
        valid_time: Option<DateTime<Utc>>,
        user_id: &UserId,
    ) -> LedgerResult<Transaction>
    where
        L: EventLog,
        S: LedgerStore,
    {
        let original = load_transaction(journal.store(), original_id)?;
        if original.status != TransactionStatus::Posted {
            return Err(LedgerError::precondition("can only reverse posted transactions"));
        }
        if original.is_reversal() && !self.allow_reversal_of_reversal {
            return Err(LedgerError::precondition(format!(
                "transaction {original_id} is itself a reversal and cannot be reversed"
            )));
        }

        // A mirror left behind by an interrupted reversal is finished rather
        // than duplicated.
        let interrupted = journal
            .store()
            .transactions()
            .context("list", "transaction")?
            .into_iter()
            .find(|t| t.reverses == Some(original_id) && t.status != TransactionStatus::Reversed);

        let mirror = match interrupted {
            Some(mirror) => {
                info!(
                    transaction_id = %original_id,
                    reversal_id = %mirror.id,
                    "resuming interrupted reversal"
                );
                mirror
            }
            None => {
                let valid_time =
                    valid_time.unwrap_or_else(|| Utc::now().max(original.valid_time));
                let mirror = original.mirror(description, valid_time);

                // Validate before the mirror is created so a rejection leaves
                // no pending mirror behind.
                self.ensure_valid(journal.store(), &mirror)?;

                journal.record(
                    LedgerEvent::TransactionCreated(TransactionCreated {
                        transaction: mirror.clone(),
                    }),
                    valid_time,
                    user_id,
                )?;
                mirror
            }
        };
        let mirror_id = mirror.id;
        let valid_time = mirror.valid_time;

        if mirror.status == TransactionStatus::Pending {
            self.post_transaction(journal, mirror_id, user_id)?;
        }
        journal.record(
            LedgerEvent::TransactionReversed(TransactionReversed {
                transaction_id: original_id,
                reversal_id: mirror_id,
            }),
            valid_time,
            user_id,
        )?;

        info!(
            transaction_id = %original_id,
            reversal_id = %mirror_id,
            user_id = %user_id,
            "transaction reversed"
        );
        load_transaction(journal.store(), mirror_id)
    }

    /// Signed balance of `account_id` over every transaction effective at or
    /// before `as_of`.
    pub fn calculate_account_balance<S>(
        &self,
        store: &S,
        account_id: &AccountId,
        as_of: DateTime<Utc>,
    ) -> LedgerResult<Amount>
    where
        S: LedgerStore,
    {
        self.balance(store, account_id, Visibility::as_of(as_of))
    }

    /// As `calculate_account_balance`, restricted to postings the ledger had
    /// recorded by `known_at`.
    pub fn calculate_account_balance_known_at<S>(
        &self,
        store: &S,
        account_id: &AccountId,
        as_of: DateTime<Utc>,
        known_at: DateTime<Utc>,
    ) -> LedgerResult<Amount>
    where
        S: LedgerStore,
    {
        let visibility = Visibility {
            known_at: Some(known_at),
            ..Visibility::as_of(as_of)
        };
        self.balance(store, account_id, visibility)
    }

    /// Reporting currency of an account.
    pub fn currency_of(&self, account: &Account) -> Currency {
        account
            .currency
            .clone()
            .unwrap_or_else(|| self.base_currency.clone())
    }

    pub(crate) fn accumulate<S>(
        &self,
        store: &S,
        account: &Account,
        visibility: Visibility,
    ) -> LedgerResult<BalanceAccumulator>
    where
        S: LedgerStore,
    {
        let entries = store
            .account_entries(&account.id)
            .context("scan", "entry")?;

        let mut acc = BalanceAccumulator::new(account.account_type());
        for entry in visible_entries(store, entries, visibility)? {
            acc.add(&entry);
        }
        Ok(acc)
    }

    fn balance<S>(&self, store: &S, account_id: &AccountId, visibility: Visibility) -> LedgerResult<Amount>
    where
        S: LedgerStore,
    {
        let account = load_account(store, account_id)?;
        let acc = self.accumulate(store, &account, visibility)?;
        Ok(acc.finish(self.currency_of(&account))?)
    }

    fn ensure_valid<S: LedgerStore>(&self, store: &S, txn: &Transaction) -> LedgerResult<()> {
        let result = self.validate_transaction(store, txn)?;
        if result.valid {
            return Ok(());
        }

        let codes: Vec<&str> = result.errors.iter().map(|e| e.code.as_str()).collect();
        warn!(
            transaction_id = %txn.id,
            codes = ?codes,
            "transaction rejected"
        );
        Err(LedgerError::Rejected(result.errors))
    }
}
