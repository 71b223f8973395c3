//! Append-only journal boundary.
//!
//! The journal is the only durable write path of the ledger; every other table
//! is a projection of it.

pub mod in_memory;
pub mod jsonl;
pub mod r#trait;

pub use in_memory::InMemoryEventLog;
pub use jsonl::JsonlEventLog;
pub use r#trait::{EventLog, UncommittedEvent};
