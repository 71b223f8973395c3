//! Signed balance accumulation.
//!
//! The normal-balance-side rule lives in `AccountType::sign`; every balance,
//! trial-balance line and rollup in the crate is built on this accumulator.

use folio_core::{Amount, Currency, DomainError, DomainResult};

use crate::account::AccountType;
use crate::entry::{Entry, EntryType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceAccumulator {
    account_type: AccountType,
    debits: i128,
    credits: i128,
    entries: usize,
}

impl BalanceAccumulator {
    pub fn new(account_type: AccountType) -> Self {
        Self {
            account_type,
            debits: 0,
            credits: 0,
            entries: 0,
        }
    }

    /// Add an entry. Values are summed as raw minor units; entries in another
    /// currency are not converted.
    pub fn add(&mut self, entry: &Entry) {
        let value = i128::from(entry.amount.value());
        match entry.entry_type {
            EntryType::Debit => self.debits += value,
            EntryType::Credit => self.credits += value,
        }
        self.entries += 1;
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn debits(&self) -> i128 {
        self.debits
    }

    pub fn credits(&self) -> i128 {
        self.credits
    }

    /// Debits minus credits, regardless of account type.
    pub fn raw(&self) -> i128 {
        self.debits - self.credits
    }

    /// Balance with the normal-side sign applied.
    pub fn signed(&self) -> i128 {
        let debit_sign = i128::from(self.account_type.sign(EntryType::Debit));
        let credit_sign = i128::from(self.account_type.sign(EntryType::Credit));
        self.debits * debit_sign + self.credits * credit_sign
    }

    pub fn finish(&self, currency: Currency) -> DomainResult<Amount> {
        let value = i64::try_from(self.signed())
            .map_err(|_| DomainError::invariant("balance does not fit in i64 minor units"))?;
        Ok(Amount::new(value, currency))
    }
}

#[cfg(test)]
mod tests {
    use folio_core::{AccountId, TransactionId};
    use proptest::prelude::*;

    use super::*;
    use crate::entry::Tags;

    fn entry(entry_type: EntryType, value: i64) -> Entry {
        Entry {
            id: None,
            transaction_id: TransactionId::new(),
            account_id: AccountId::new("any").unwrap(),
            entry_type,
            amount: Amount::new(value, Currency::new("USD").unwrap()),
            tags: Tags::new(),
        }
    }

    fn account_type() -> impl Strategy<Value = AccountType> {
        prop::sample::select(AccountType::ALL.to_vec())
    }

    fn entry_type() -> impl Strategy<Value = EntryType> {
        prop_oneof![Just(EntryType::Debit), Just(EntryType::Credit)]
    }

    #[test]
    fn sale_is_positive_on_both_sides() {
        let mut cash = BalanceAccumulator::new(AccountType::Asset);
        cash.add(&entry(EntryType::Debit, 100_000));
        let mut revenue = BalanceAccumulator::new(AccountType::Income);
        revenue.add(&entry(EntryType::Credit, 100_000));

        let usd = Currency::new("USD").unwrap();
        assert_eq!(cash.finish(usd.clone()).unwrap().value(), 100_000);
        assert_eq!(revenue.finish(usd).unwrap().value(), 100_000);
    }

    #[test]
    fn overflow_is_reported() {
        let mut acc = BalanceAccumulator::new(AccountType::Asset);
        acc.add(&entry(EntryType::Debit, i64::MAX));
        acc.add(&entry(EntryType::Debit, 1));
        assert!(acc.finish(Currency::new("USD").unwrap()).is_err());
    }

    proptest! {
        /// A single entry contributes exactly `sign(type, side) * value`.
        #[test]
        fn single_entry_follows_sign_table(
            at in account_type(),
            et in entry_type(),
            value in 1i64..1_000_000_000i64,
        ) {
            let mut acc = BalanceAccumulator::new(at);
            acc.add(&entry(et, value));

            let expected = match (at, et) {
                (AccountType::Asset | AccountType::Expense, EntryType::Debit) => value,
                (AccountType::Asset | AccountType::Expense, EntryType::Credit) => -value,
                (_, EntryType::Debit) => -value,
                (_, EntryType::Credit) => value,
            };
            prop_assert_eq!(acc.signed(), i128::from(expected));
        }

        /// An entry and its mirror cancel for every account type.
        #[test]
        fn mirrored_entries_cancel(
            at in account_type(),
            et in entry_type(),
            value in 1i64..1_000_000_000i64,
        ) {
            let mut acc = BalanceAccumulator::new(at);
            acc.add(&entry(et, value));
            acc.add(&entry(et.opposite(), value));
            prop_assert_eq!(acc.signed(), 0);
            prop_assert_eq!(acc.entries(), 2);
        }
    }
}
