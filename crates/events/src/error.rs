use folio_core::EventId;
use thiserror::Error;

/// Failure to turn a stored journal event back into its typed payload.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to deserialize event {event_id}: {source}")]
    Payload {
        event_id: EventId,
        #[source]
        source: serde_json::Error,
    },

    #[error("event {event_id} is tagged '{tagged}' but its payload is '{decoded}'")]
    TagMismatch {
        event_id: EventId,
        tagged: String,
        decoded: &'static str,
    },
}

/// Error raised while running events through a projection.
#[derive(Debug, Error)]
pub enum ProjectionError<E: std::error::Error + 'static> {
    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },

    #[error("projection failed: {0}")]
    Apply(#[source] E),
}
