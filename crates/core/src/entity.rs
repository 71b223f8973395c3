//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Accounts, transactions, entries and periods keep their identity while their
/// lifecycle state changes (e.g. a transaction moving from pending to posted).
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
