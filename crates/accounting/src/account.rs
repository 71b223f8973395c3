use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use folio_core::{AccountId, Currency, Entity};

use crate::entry::{EntryType, Tags};

/// High-level account type (determines the normal balance side).
///
/// The type is fixed when the account is created: changing it would flip the
/// sign of every historical balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Income,
    Expense,
}

impl AccountType {
    pub const ALL: [AccountType; 5] = [
        AccountType::Asset,
        AccountType::Liability,
        AccountType::Equity,
        AccountType::Income,
        AccountType::Expense,
    ];

    /// The entry type that increases this account's balance.
    pub fn normal_side(self) -> EntryType {
        match self {
            AccountType::Asset | AccountType::Expense => EntryType::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Income => {
                EntryType::Credit
            }
        }
    }

    /// Balance multiplier for an entry of the given type: +1 on the normal side,
    /// -1 on the other.
    pub fn sign(self, entry_type: EntryType) -> i64 {
        if entry_type == self.normal_side() { 1 } else { -1 }
    }
}

impl core::fmt::Display for AccountType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            AccountType::Asset => "asset",
            AccountType::Liability => "liability",
            AccountType::Equity => "equity",
            AccountType::Income => "income",
            AccountType::Expense => "expense",
        };
        f.write_str(s)
    }
}

/// Node of the chart of accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub parent_id: Option<AccountId>,
    pub code: String, // e.g. "1000"
    pub name: String, // e.g. "Cash"
    account_type: AccountType,
    /// When set, the account's balances are reported in this currency.
    pub currency: Option<Currency>,
    #[serde(default)]
    pub tags: Tags,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn new(
        id: AccountId,
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
    ) -> Self {
        Self {
            id,
            parent_id: None,
            code: code.into(),
            name: name.into(),
            account_type,
            currency: None,
            tags: Tags::new(),
            created_at: Utc::now(),
            closed_at: None,
        }
    }

    pub fn with_parent(mut self, parent_id: AccountId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn account_type(&self) -> AccountType {
        self.account_type
    }

    /// True once the account has been closed at or before `at`.
    pub fn is_closed_at(&self, at: DateTime<Utc>) -> bool {
        self.closed_at.is_some_and(|closed| closed <= at)
    }
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
