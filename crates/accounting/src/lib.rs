//! Accounting module (double-entry, bi-temporal ledger model).
//!
//! Pure domain logic only: no IO, no persistence concerns. The infra crate
//! drives these types through the event log and the projection store.

pub mod account;
pub mod balance;
pub mod entry;
pub mod event;
pub mod period;
pub mod transaction;
pub mod validation;

pub use account::{Account, AccountType};
pub use balance::BalanceAccumulator;
pub use entry::{Entry, EntryType, Tags};
pub use event::{
    AccountClosed, AccountCreated, LedgerEvent, PeriodClosed, PeriodCreated, TransactionCreated,
    TransactionPosted, TransactionReversed,
};
pub use period::{Period, PeriodStatus};
pub use transaction::{Transaction, TransactionStatus};
pub use validation::{
    BalanceMode, ValidationCode, ValidationError, ValidationPolicy, ValidationResult, validate,
};
