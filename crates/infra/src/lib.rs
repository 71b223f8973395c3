//! Infrastructure layer: journal media, projection store, posting engine and
//! the `Ledger` facade.

pub mod config;
pub mod error;
pub mod event_log;
pub mod journal;
pub mod ledger;
pub mod periods;
pub mod posting;
pub mod processor;
pub mod query;
pub mod store;

pub use config::{ConfigError, LedgerConfig};
pub use error::{LedgerError, LedgerResult};
pub use event_log::{EventLog, InMemoryEventLog, JsonlEventLog, UncommittedEvent};
pub use journal::Journal;
pub use ledger::Ledger;
pub use periods::PeriodGate;
pub use posting::PostingEngine;
pub use processor::{EventProcessor, ProcessError};
pub use query::{AccountBalance, BalanceQuery, RollupFilter, RollupGroup, TrialBalance, TrialBalanceLine};
pub use store::{InMemoryLedgerStore, LedgerStore, StorageError, Write, WriteBatch};
