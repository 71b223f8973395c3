//! Posting validation.
//!
//! Every check runs; nothing short-circuits. The caller gets the complete list
//! of problems from a single call.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use folio_core::{AccountId, Currency};

use crate::account::Account;
use crate::entry::EntryType;
use crate::period::{Period, PeriodStatus};
use crate::transaction::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationCode {
    UnbalancedTransaction,
    InvalidAccount,
    PeriodClosed,
    EmptyTransaction,
    InvalidAmount,
    AccountClosed,
    DuplicateEntry,
}

impl ValidationCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationCode::UnbalancedTransaction => "UNBALANCED_TRANSACTION",
            ValidationCode::InvalidAccount => "INVALID_ACCOUNT",
            ValidationCode::PeriodClosed => "PERIOD_CLOSED",
            ValidationCode::EmptyTransaction => "EMPTY_TRANSACTION",
            ValidationCode::InvalidAmount => "INVALID_AMOUNT",
            ValidationCode::AccountClosed => "ACCOUNT_CLOSED",
            ValidationCode::DuplicateEntry => "DUPLICATE_ENTRY",
        }
    }
}

impl core::fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub code: ValidationCode,
    pub message: String,
}

impl ValidationError {
    fn new(code: ValidationCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn has(&self, code: ValidationCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    pub fn codes(&self) -> Vec<ValidationCode> {
        self.errors.iter().map(|e| e.code).collect()
    }
}

/// How debits and credits are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceMode {
    /// Debits must equal credits within each currency.
    #[default]
    PerCurrency,
    /// One raw minor-unit comparison across all currencies.
    Combined,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPolicy {
    pub balance_mode: BalanceMode,
    pub soft_close_blocks_posting: bool,
}

/// Validate a transaction against the chart of accounts and the period that
/// covers its valid time.
///
/// `accounts` must contain every referenced account that exists; ids missing
/// from the map are reported as `INVALID_ACCOUNT`.
pub fn validate(
    txn: &Transaction,
    accounts: &BTreeMap<AccountId, Account>,
    period: Option<&Period>,
    policy: ValidationPolicy,
) -> ValidationResult {
    let mut errors = Vec::new();

    if txn.entries.is_empty() {
        errors.push(ValidationError::new(
            ValidationCode::EmptyTransaction,
            "transaction has no entries",
        ));
    }

    for (idx, entry) in txn.entries.iter().enumerate() {
        if entry.amount.value() <= 0 {
            errors.push(ValidationError::new(
                ValidationCode::InvalidAmount,
                format!("entry {idx} has non-positive amount {}", entry.amount),
            ));
        }
    }

    check_entry_ids(txn, &mut errors);
    check_balance(txn, policy.balance_mode, &mut errors);
    check_accounts(txn, accounts, &mut errors);

    if let Some(period) = period {
        let blocked = match period.status() {
            PeriodStatus::HardClosed => true,
            PeriodStatus::SoftClosed => policy.soft_close_blocks_posting,
            PeriodStatus::Open => false,
        };
        if blocked {
            errors.push(ValidationError::new(
                ValidationCode::PeriodClosed,
                format!(
                    "valid time {} falls in {:?} period '{}'",
                    txn.valid_time,
                    period.status(),
                    period.name
                ),
            ));
        }
    }

    ValidationResult::from_errors(errors)
}

fn check_balance(txn: &Transaction, mode: BalanceMode, errors: &mut Vec<ValidationError>) {
    match mode {
        BalanceMode::Combined => {
            let debits = txn.side_total(EntryType::Debit);
            let credits = txn.side_total(EntryType::Credit);
            if debits != credits {
                errors.push(ValidationError::new(
                    ValidationCode::UnbalancedTransaction,
                    format!("debits {debits} do not equal credits {credits}"),
                ));
            }
        }
        BalanceMode::PerCurrency => {
            let mut sums: BTreeMap<&Currency, (i128, i128)> = BTreeMap::new();
            for entry in &txn.entries {
                let slot = sums.entry(entry.amount.currency()).or_default();
                let value = i128::from(entry.amount.value());
                match entry.entry_type {
                    EntryType::Debit => slot.0 += value,
                    EntryType::Credit => slot.1 += value,
                }
            }
            for (currency, (debits, credits)) in sums {
                if debits != credits {
                    errors.push(ValidationError::new(
                        ValidationCode::UnbalancedTransaction,
                        format!("{currency} debits {debits} do not equal credits {credits}"),
                    ));
                }
            }
        }
    }
}

/// Caller-assigned entry ids must be unique within the transaction; the
/// account index is keyed by them.
fn check_entry_ids(txn: &Transaction, errors: &mut Vec<ValidationError>) {
    let mut seen = BTreeSet::new();
    let mut reported = BTreeSet::new();
    for id in txn.entries.iter().filter_map(|e| e.id) {
        if !seen.insert(id) && reported.insert(id) {
            errors.push(ValidationError::new(
                ValidationCode::DuplicateEntry,
                format!("entry id {id} is used more than once"),
            ));
        }
    }
}

fn check_accounts(
    txn: &Transaction,
    accounts: &BTreeMap<AccountId, Account>,
    errors: &mut Vec<ValidationError>,
) {
    let referenced: BTreeSet<&AccountId> = txn.entries.iter().map(|e| &e.account_id).collect();
    for id in referenced {
        match accounts.get(id) {
            None => errors.push(ValidationError::new(
                ValidationCode::InvalidAccount,
                format!("account '{id}' does not exist"),
            )),
            Some(account) if account.is_closed_at(txn.valid_time) => {
                errors.push(ValidationError::new(
                    ValidationCode::AccountClosed,
                    format!("account '{id}' is closed"),
                ))
            }
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use folio_core::{Amount, EntryId};
    use proptest::prelude::*;

    use super::*;
    use crate::account::AccountType;

    fn id(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn money(value: i64, code: &str) -> Amount {
        Amount::new(value, Currency::new(code).unwrap())
    }

    fn chart() -> BTreeMap<AccountId, Account> {
        [
            Account::new(id("cash"), "1000", "Cash", AccountType::Asset),
            Account::new(id("revenue"), "4000", "Revenue", AccountType::Income),
        ]
        .into_iter()
        .map(|a| (a.id.clone(), a))
        .collect()
    }

    #[test]
    fn balanced_transaction_passes() {
        let txn = Transaction::new("sale", Utc::now())
            .debit(id("cash"), money(100_000, "USD"))
            .credit(id("revenue"), money(100_000, "USD"));

        let result = validate(&txn, &chart(), None, ValidationPolicy::default());
        assert!(result.valid, "{:?}", result.errors);
    }

    #[test]
    fn unbalanced_and_unknown_account_are_both_reported() {
        let txn = Transaction::new("bad", Utc::now())
            .debit(id("cash"), money(100, "USD"))
            .credit(id("does_not_exist"), money(99, "USD"));

        let result = validate(&txn, &chart(), None, ValidationPolicy::default());
        assert!(!result.valid);
        assert!(result.has(ValidationCode::UnbalancedTransaction));
        assert!(result.has(ValidationCode::InvalidAccount));
    }

    #[test]
    fn currency_mismatch_only_balances_in_combined_mode() {
        let txn = Transaction::new("fx", Utc::now())
            .debit(id("cash"), money(100, "USD"))
            .credit(id("revenue"), money(100, "EUR"));

        let per_currency = validate(&txn, &chart(), None, ValidationPolicy::default());
        assert_eq!(
            per_currency.codes(),
            vec![
                ValidationCode::UnbalancedTransaction,
                ValidationCode::UnbalancedTransaction
            ]
        );

        let combined = ValidationPolicy {
            balance_mode: BalanceMode::Combined,
            ..ValidationPolicy::default()
        };
        assert!(validate(&txn, &chart(), None, combined).valid);
    }

    #[test]
    fn closed_periods_block_according_to_policy() {
        let now = Utc::now();
        let mut period = Period::new("current", now - Duration::days(1), now + Duration::days(1)).unwrap();
        let txn = Transaction::new("sale", now)
            .debit(id("cash"), money(5, "USD"))
            .credit(id("revenue"), money(5, "USD"));

        period.close(true, now).unwrap();
        assert!(validate(&txn, &chart(), Some(&period), ValidationPolicy::default()).valid);

        let strict = ValidationPolicy {
            soft_close_blocks_posting: true,
            ..ValidationPolicy::default()
        };
        assert!(validate(&txn, &chart(), Some(&period), strict).has(ValidationCode::PeriodClosed));

        period.close(false, now).unwrap();
        let result = validate(&txn, &chart(), Some(&period), ValidationPolicy::default());
        assert_eq!(result.codes(), vec![ValidationCode::PeriodClosed]);
    }

    #[test]
    fn empty_and_non_positive_lines_are_rejected() {
        let empty = Transaction::new("nothing", Utc::now());
        assert_eq!(
            validate(&empty, &chart(), None, ValidationPolicy::default()).codes(),
            vec![ValidationCode::EmptyTransaction]
        );

        let negative = Transaction::new("negative", Utc::now())
            .debit(id("cash"), money(-5, "USD"))
            .credit(id("revenue"), money(-5, "USD"));
        let result = validate(&negative, &chart(), None, ValidationPolicy::default());
        assert_eq!(
            result.codes(),
            vec![ValidationCode::InvalidAmount, ValidationCode::InvalidAmount]
        );
    }

    #[test]
    fn repeated_entry_ids_are_rejected() {
        let mut txn = Transaction::new("doubled", Utc::now())
            .debit(id("cash"), money(50, "USD"))
            .debit(id("cash"), money(50, "USD"))
            .credit(id("revenue"), money(100, "USD"));
        let shared = EntryId::new();
        txn.entries[0].id = Some(shared);
        txn.entries[1].id = Some(shared);

        let result = validate(&txn, &chart(), None, ValidationPolicy::default());
        assert_eq!(result.codes(), vec![ValidationCode::DuplicateEntry]);

        txn.entries[1].id = None;
        assert!(validate(&txn, &chart(), None, ValidationPolicy::default()).valid);
    }

    #[test]
    fn codes_serialize_in_screaming_case() {
        let json = serde_json::to_string(&ValidationCode::UnbalancedTransaction).unwrap();
        assert_eq!(json, "\"UNBALANCED_TRANSACTION\"");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Any transaction built from matched debit/credit pairs validates.
        #[test]
        fn matched_pairs_always_validate(
            amounts in prop::collection::vec(1i64..1_000_000i64, 1..10)
        ) {
            let mut txn = Transaction::new("generated", Utc::now());
            for amount in &amounts {
                txn = txn
                    .debit(id("cash"), money(*amount, "USD"))
                    .credit(id("revenue"), money(*amount, "USD"));
            }

            let result = validate(&txn, &chart(), None, ValidationPolicy::default());
            prop_assert!(result.valid);
            prop_assert_eq!(txn.side_total(EntryType::Debit), txn.side_total(EntryType::Credit));
        }

        /// Skewing one credit always yields exactly one unbalanced error.
        #[test]
        fn skewed_pairs_are_unbalanced(
            amounts in prop::collection::vec(2i64..1_000_000i64, 1..10),
            skew in 1i64..1_000i64,
        ) {
            let mut txn = Transaction::new("generated", Utc::now());
            for (i, amount) in amounts.iter().enumerate() {
                let credit = if i == 0 { amount + skew } else { *amount };
                txn = txn
                    .debit(id("cash"), money(*amount, "USD"))
                    .credit(id("revenue"), money(credit, "USD"));
            }

            let result = validate(&txn, &chart(), None, ValidationPolicy::default());
            prop_assert_eq!(result.codes(), vec![ValidationCode::UnbalancedTransaction]);
        }
    }
}
