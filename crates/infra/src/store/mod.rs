//! Projection store boundary (the persistence collaborator).
//!
//! Accounts, transactions, the account-indexed entries and periods are all
//! projections of the journal: they can be cleared and rebuilt at any time.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryLedgerStore;
pub use r#trait::{LedgerStore, StorageError, Write, WriteBatch};
