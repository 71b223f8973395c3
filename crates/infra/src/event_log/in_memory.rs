use std::sync::RwLock;

use chrono::{DateTime, Utc};

use folio_events::JournalEvent;

use super::r#trait::{EventLog, UncommittedEvent, next_position, select_range};
use crate::store::StorageError;

/// In-memory append-only journal.
///
/// Intended for tests/dev. Nothing survives the process.
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    events: RwLock<Vec<JournalEvent>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventLog for InMemoryEventLog {
    fn append(&self, event: UncommittedEvent) -> Result<JournalEvent, StorageError> {
        let mut events = self
            .events
            .write()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?;

        let (sequence, transaction_time) = next_position(events.last());
        let stored = event.commit(sequence, transaction_time);
        events.push(stored.clone());
        Ok(stored)
    }

    fn query(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<JournalEvent>, StorageError> {
        let events = self
            .events
            .read()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?;
        Ok(select_range(&events, from, to))
    }

    fn all(&self) -> Result<Vec<JournalEvent>, StorageError> {
        let events = self
            .events
            .read()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?;
        Ok(events.clone())
    }

    fn len(&self) -> Result<u64, StorageError> {
        let events = self
            .events
            .read()
            .map_err(|_| StorageError::Unavailable("lock poisoned".to_string()))?;
        Ok(events.len() as u64)
    }
}
