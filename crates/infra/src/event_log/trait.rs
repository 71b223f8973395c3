use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;

use folio_core::{EventId, UserId};
use folio_events::{Event, JournalEvent};

use crate::store::StorageError;

/// An event ready to be appended (not yet assigned a sequence number or a
/// transaction time).
#[derive(Debug, Clone, PartialEq)]
pub struct UncommittedEvent {
    pub event_id: EventId,
    pub event_type: String,
    pub event_version: u32,
    pub valid_time: DateTime<Utc>,
    pub user_id: UserId,
    pub payload: JsonValue,
}

impl UncommittedEvent {
    /// Build from a typed payload; the type tag is taken from the variant.
    pub fn from_typed<E>(
        event: &E,
        valid_time: DateTime<Utc>,
        user_id: UserId,
    ) -> Result<Self, StorageError>
    where
        E: Event + Serialize,
    {
        Ok(Self {
            event_id: EventId::new(),
            event_type: event.event_type().to_string(),
            event_version: event.version(),
            valid_time,
            user_id,
            payload: serde_json::to_value(event)?,
        })
    }

    /// Stamp log position and record time.
    pub(crate) fn commit(self, sequence: u64, transaction_time: DateTime<Utc>) -> JournalEvent {
        JournalEvent::new(
            self.event_id,
            sequence,
            self.event_type,
            self.event_version,
            self.valid_time,
            transaction_time,
            self.user_id,
            self.payload,
        )
    }
}

/// Next (sequence, transaction time) after `last`.
///
/// Transaction time never moves backwards inside one journal, even if the wall
/// clock does.
pub(crate) fn next_position(last: Option<&JournalEvent>) -> (u64, DateTime<Utc>) {
    let now = Utc::now();
    match last {
        None => (1, now),
        Some(last) => (last.sequence() + 1, now.max(last.transaction_time())),
    }
}

/// Events with `from <= transaction_time <= to`, ordered by
/// (transaction time, id).
pub(crate) fn select_range(
    events: &[JournalEvent],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Vec<JournalEvent> {
    let mut selected: Vec<JournalEvent> = events
        .iter()
        .filter(|e| e.transaction_time() >= from && e.transaction_time() <= to)
        .cloned()
        .collect();
    selected.sort_by_key(|e| (e.transaction_time(), e.event_id()));
    selected
}

/// Append-only journal of ledger events.
///
/// Implementations must:
/// - assign strictly increasing sequence numbers starting at 1
/// - stamp a non-decreasing transaction time at append
/// - never update or delete an appended event
pub trait EventLog: Send + Sync {
    fn append(&self, event: UncommittedEvent) -> Result<JournalEvent, StorageError>;

    /// Events recorded in `[from, to]` (inclusive), ordered by
    /// (transaction time, id).
    fn query(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<JournalEvent>, StorageError>;

    /// The whole journal in append order (replay source).
    fn all(&self) -> Result<Vec<JournalEvent>, StorageError>;

    fn len(&self) -> Result<u64, StorageError>;

    fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

impl<L> EventLog for Arc<L>
where
    L: EventLog + ?Sized,
{
    fn append(&self, event: UncommittedEvent) -> Result<JournalEvent, StorageError> {
        (**self).append(event)
    }

    fn query(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<JournalEvent>, StorageError> {
        (**self).query(from, to)
    }

    fn all(&self) -> Result<Vec<JournalEvent>, StorageError> {
        (**self).all()
    }

    fn len(&self) -> Result<u64, StorageError> {
        (**self).len()
    }
}
