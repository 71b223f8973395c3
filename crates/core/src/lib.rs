//! `folio-core`: ledger foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, money, and the domain error model.

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AccountId, EntryId, EventId, PeriodId, TransactionId, UserId};
pub use money::{Amount, BaseAmount, Currency};
pub use value_object::ValueObject;
