use crate::{Event, EventEnvelope};

/// A projection builds a read model from the append-only journal.
///
/// Read models are **disposable**: `reset` discards them and replaying the
/// journal from the first event rebuilds them. The live path and the replay
/// path both go through `apply`, so there is exactly one implementation of
/// every state transition.
///
/// ## Idempotency
///
/// Replaying the full journal into a freshly reset projection must always
/// yield the same final state. Sequence tracking is handled by
/// `ProjectionRunner`; `apply` itself only needs to be deterministic.
///
/// ## Errors
///
/// Unlike fire-and-forget read models, ledger projections report failures:
/// a skipped posting would silently corrupt every balance after it.
pub trait Projection {
    type Ev: Event;
    type Error: std::error::Error + 'static;

    /// Apply a single event to the read model.
    fn apply(&mut self, envelope: &EventEnvelope<Self::Ev>) -> Result<(), Self::Error>;

    /// Discard all projected state.
    fn reset(&mut self) -> Result<(), Self::Error>;
}
