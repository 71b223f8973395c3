//! Read side: decorated balances, the trial balance and tag rollups.
//!
//! Nothing here is cached. Every call recomputes from the entry index.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use folio_accounting::{AccountType, Entry, EntryType};
use folio_core::{AccountId, Amount};

use crate::error::{LedgerResult, StorageContext};
use crate::posting::{PostingEngine, Visibility, load_account, visible_entries};
use crate::store::LedgerStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
    pub account_id: AccountId,
    pub name: String,
    pub account_type: AccountType,
    pub balance: Amount,
}

/// One row per account. `debit`/`credit` hold the raw debit-minus-credit total
/// in the column matching its sign; the other column is zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialBalanceLine {
    pub account_id: AccountId,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub balance: Amount,
    pub debit: i128,
    pub credit: i128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialBalance {
    pub as_of: DateTime<Utc>,
    pub lines: Vec<TrialBalanceLine>,
    pub total_debit: i128,
    pub total_credit: i128,
}

impl TrialBalance {
    pub fn is_balanced(&self) -> bool {
        self.total_debit == self.total_credit
    }
}

/// Selects entries for a rollup. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollupFilter {
    pub account_ids: Vec<AccountId>,
    /// Tag values an entry must carry.
    pub tags: BTreeMap<String, String>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_to: Option<DateTime<Utc>>,
}

impl RollupFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(mut self, account_id: AccountId) -> Self {
        self.account_ids.push(account_id);
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.valid_from = Some(from);
        self.valid_to = Some(to);
        self
    }

    fn matches(&self, entry: &Entry) -> bool {
        (self.account_ids.is_empty() || self.account_ids.contains(&entry.account_id))
            && self
                .tags
                .iter()
                .all(|(k, v)| entry.tags.get(k).is_some_and(|have| have == v))
    }
}

/// Entries sharing one projection of their tags onto the rollup keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollupGroup {
    pub key: BTreeMap<String, Option<String>>,
    pub count: usize,
    pub debit_total: i128,
    pub credit_total: i128,
    /// `debit_total - credit_total`.
    pub total: i128,
}

#[derive(Debug, Clone, Copy)]
pub struct BalanceQuery<'a> {
    engine: &'a PostingEngine,
}

impl<'a> BalanceQuery<'a> {
    pub fn new(engine: &'a PostingEngine) -> Self {
        Self { engine }
    }

    pub fn get_account_balance<S>(
        &self,
        store: &S,
        account_id: &AccountId,
        as_of: DateTime<Utc>,
    ) -> LedgerResult<AccountBalance>
    where
        S: LedgerStore,
    {
        let account = load_account(store, account_id)?;
        let balance = self
            .engine
            .calculate_account_balance(store, account_id, as_of)?;

        Ok(AccountBalance {
            account_id: account.id.clone(),
            name: account.name.clone(),
            account_type: account.account_type(),
            balance,
        })
    }

    /// One line per account in the directory, zero balances included,
    /// ordered by account code.
    pub fn get_trial_balance<S>(
        &self,
        store: &S,
        as_of: DateTime<Utc>,
        type_filter: Option<AccountType>,
    ) -> LedgerResult<TrialBalance>
    where
        S: LedgerStore,
    {
        let mut accounts = store.accounts().context("list", "account")?;
        accounts.retain(|a| type_filter.is_none_or(|t| a.account_type() == t));
        accounts.sort_by(|a, b| a.code.cmp(&b.code).then_with(|| a.id.cmp(&b.id)));

        let mut lines = Vec::with_capacity(accounts.len());
        let mut total_debit = 0i128;
        let mut total_credit = 0i128;

        for account in accounts {
            let acc = self
                .engine
                .accumulate(store, &account, Visibility::as_of(as_of))?;
            let balance = acc.finish(self.engine.currency_of(&account))?;

            let raw = acc.raw();
            let (debit, credit) = if raw >= 0 { (raw, 0) } else { (0, -raw) };
            total_debit += debit;
            total_credit += credit;

            lines.push(TrialBalanceLine {
                account_type: account.account_type(),
                account_id: account.id,
                code: account.code,
                name: account.name,
                balance,
                debit,
                credit,
            });
        }

        Ok(TrialBalance {
            as_of,
            lines,
            total_debit,
            total_credit,
        })
    }

    /// Group posted entries by the projection of their tags onto `keys`.
    ///
    /// Keys are deduplicated and sorted, so their order never changes the
    /// grouping. A key an entry does not carry projects to `None`.
    pub fn dimension_rollup<S>(
        &self,
        store: &S,
        filter: &RollupFilter,
        keys: &[String],
    ) -> LedgerResult<Vec<RollupGroup>>
    where
        S: LedgerStore,
    {
        let keys: Vec<String> = keys
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let candidates: Vec<Entry> = if filter.account_ids.is_empty() {
            store.indexed_entries().context("scan", "entry")?
        } else {
            let mut all = Vec::new();
            for id in filter.account_ids.iter().collect::<BTreeSet<_>>() {
                all.extend(store.account_entries(id).context("scan", "entry")?);
            }
            all
        };

        let visibility = Visibility {
            valid_from: filter.valid_from,
            valid_to: filter.valid_to,
            known_at: None,
        };
        let matching: Vec<Entry> = candidates
            .into_iter()
            .filter(|e| filter.matches(e))
            .collect();

        let mut groups: BTreeMap<BTreeMap<String, Option<String>>, RollupGroup> = BTreeMap::new();
        for entry in visible_entries(store, matching, visibility)? {
            let key = entry.project_tags(&keys);
            let group = groups.entry(key.clone()).or_insert_with(|| RollupGroup {
                key,
                count: 0,
                debit_total: 0,
                credit_total: 0,
                total: 0,
            });

            let value = i128::from(entry.amount.value());
            match entry.entry_type {
                EntryType::Debit => group.debit_total += value,
                EntryType::Credit => group.credit_total += value,
            }
            group.count += 1;
            group.total = group.debit_total - group.credit_total;
        }

        Ok(groups.into_values().collect())
    }
}
