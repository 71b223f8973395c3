use serde::Serialize;
use serde::de::DeserializeOwned;

/// A typed journal event payload.
///
/// Events are:
/// - **immutable** (treat them as facts)
/// - **versioned** (schema evolution)
/// - designed to be **append-only**
///
/// Implementors are expected to be closed enums: the stored type tag is always
/// derived from the variant, so a tag can never disagree with its payload.
pub trait Event: Clone + core::fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "ledger.transaction.posted").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;
}
