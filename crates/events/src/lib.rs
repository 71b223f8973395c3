//! Journal events, envelopes and projection plumbing.
//!
//! The event log is the only origin of ledger state; everything in this crate
//! treats events as immutable facts and projections as disposable.

pub mod envelope;
pub mod error;
pub mod event;
pub mod projection;
pub mod runner;

pub use envelope::{EventEnvelope, JournalEvent};
pub use error::{DecodeError, ProjectionError};
pub use event::Event;
pub use projection::Projection;
pub use runner::ProjectionRunner;
