use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use folio_core::{EventId, UserId};

use crate::{DecodeError, Event};

/// Envelope for an event, carrying the bi-temporal and audit metadata.
///
/// This is the unit you persist/append to the journal.
///
/// Notes:
/// - **Append-only**: `sequence` is assigned by the log and strictly increases.
/// - `valid_time` is the business-effective instant; `transaction_time` is when
///   the log recorded the event.
/// - `event_type` is derived from the payload variant at append time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: EventId,
    sequence: u64,

    event_type: String,
    event_version: u32,

    valid_time: DateTime<Utc>,
    transaction_time: DateTime<Utc>,
    user_id: UserId,

    payload: E,
}

/// A journal event as stored: the payload is kept opaque until decoded.
pub type JournalEvent = EventEnvelope<JsonValue>;

impl<E> EventEnvelope<E> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        event_id: EventId,
        sequence: u64,
        event_type: impl Into<String>,
        event_version: u32,
        valid_time: DateTime<Utc>,
        transaction_time: DateTime<Utc>,
        user_id: UserId,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            sequence,
            event_type: event_type.into(),
            event_version,
            valid_time,
            transaction_time,
            user_id,
            payload,
        }
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn event_version(&self) -> u32 {
        self.event_version
    }

    pub fn valid_time(&self) -> DateTime<Utc> {
        self.valid_time
    }

    pub fn transaction_time(&self) -> DateTime<Utc> {
        self.transaction_time
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }

    /// Same metadata, different payload representation.
    pub fn map_payload<F>(self, f: impl FnOnce(E) -> F) -> EventEnvelope<F> {
        EventEnvelope {
            event_id: self.event_id,
            sequence: self.sequence,
            event_type: self.event_type,
            event_version: self.event_version,
            valid_time: self.valid_time,
            transaction_time: self.transaction_time,
            user_id: self.user_id,
            payload: f(self.payload),
        }
    }
}

impl JournalEvent {
    /// Decode the opaque payload into the typed event union.
    ///
    /// The stored tag must match the variant the payload decodes to.
    pub fn decode<E: Event>(&self) -> Result<EventEnvelope<E>, DecodeError> {
        let typed: E = serde_json::from_value(self.payload.clone()).map_err(|source| {
            DecodeError::Payload {
                event_id: self.event_id,
                source,
            }
        })?;

        if typed.event_type() != self.event_type {
            return Err(DecodeError::TagMismatch {
                event_id: self.event_id,
                tagged: self.event_type.clone(),
                decoded: typed.event_type(),
            });
        }

        Ok(self.clone().map_payload(|_| typed))
    }
}
