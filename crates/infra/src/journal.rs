//! Append-then-apply pipeline shared by every mutating operation.

use chrono::{DateTime, Utc};
use tracing::debug;

use folio_accounting::LedgerEvent;
use folio_core::UserId;
use folio_events::{EventEnvelope, JournalEvent, ProjectionRunner};

use crate::error::{LedgerResult, StorageContext};
use crate::event_log::{EventLog, UncommittedEvent};
use crate::processor::EventProcessor;
use crate::store::LedgerStore;

/// The journal plus the projection it feeds.
///
/// An event is durable once `append` returns; the projection commit comes
/// after. If the process dies between the two, `replay` on open closes the
/// gap.
#[derive(Debug)]
pub struct Journal<L, S>
where
    S: LedgerStore,
{
    log: L,
    runner: ProjectionRunner<EventProcessor<S>>,
}

impl<L, S> Journal<L, S>
where
    L: EventLog,
    S: LedgerStore,
{
    pub fn new(log: L, store: S) -> Self {
        Self {
            log,
            runner: ProjectionRunner::new(EventProcessor::new(store)),
        }
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub fn store(&self) -> &S {
        self.runner.projection().store()
    }

    /// Sequence number of the last event applied to the projection.
    pub fn last_applied(&self) -> Option<u64> {
        self.runner.last_sequence()
    }

    /// Append `event` and apply it to the projection.
    pub fn record(
        &mut self,
        event: LedgerEvent,
        valid_time: DateTime<Utc>,
        user_id: &UserId,
    ) -> LedgerResult<EventEnvelope<LedgerEvent>> {
        let draft = UncommittedEvent::from_typed(&event, valid_time, user_id.clone())
            .context("encode", "event")?;
        let stored = self.log.append(draft).context("append", "event")?;

        debug!(
            sequence = stored.sequence(),
            event_type = stored.event_type(),
            user_id = %user_id,
            "event appended"
        );

        let typed = stored.decode::<LedgerEvent>()?;
        self.runner.apply(&typed)?;
        Ok(typed)
    }

    /// Discard the projection and rebuild it from the whole journal.
    ///
    /// Returns the number of events applied.
    pub fn replay(&mut self) -> LedgerResult<usize> {
        let typed = self
            .log
            .all()
            .context("scan", "event")?
            .iter()
            .map(|event| event.decode::<LedgerEvent>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.runner.rebuild(&typed)?)
    }

    /// Journal events recorded in `[from, to]`.
    pub fn events(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> LedgerResult<Vec<JournalEvent>> {
        self.log.query(from, to).context("query", "event")
    }
}
