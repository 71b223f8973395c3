//! Period gate: accounting windows and their one-way close.

use chrono::{DateTime, Utc};
use tracing::info;

use folio_accounting::{LedgerEvent, Period, PeriodClosed, PeriodCreated};
use folio_core::{PeriodId, UserId};

use crate::error::{LedgerError, LedgerResult, StorageContext};
use crate::event_log::EventLog;
use crate::journal::Journal;
use crate::store::{LedgerStore, StorageError};

/// The period whose `[start, end)` window contains `at`, if any.
pub fn covering_period<S>(store: &S, at: DateTime<Utc>) -> Result<Option<Period>, StorageError>
where
    S: LedgerStore,
{
    Ok(store.periods()?.into_iter().find(|p| p.contains(at)))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PeriodGate;

impl PeriodGate {
    pub fn create_period<L, S>(
        &self,
        journal: &mut Journal<L, S>,
        name: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        user_id: &UserId,
    ) -> LedgerResult<Period>
    where
        L: EventLog,
        S: LedgerStore,
    {
        let period = Period::new(name, start, end)?;

        let existing = journal.store().periods().context("list", "period")?;
        if let Some(clash) = existing.iter().find(|p| p.overlaps(&period)) {
            return Err(LedgerError::precondition(format!(
                "period '{}' overlaps existing period '{}' ({})",
                period.name, clash.name, clash.id
            )));
        }

        let id = period.id;
        journal.record(LedgerEvent::PeriodCreated(PeriodCreated { period }), start, user_id)?;
        info!(period_id = %id, "period created");

        Self::load(journal.store(), id)
    }

    /// Soft close is legal only from `Open`; hard close from `Open` or
    /// `SoftClosed`.
    pub fn close_period<L, S>(
        &self,
        journal: &mut Journal<L, S>,
        period_id: PeriodId,
        soft: bool,
        user_id: &UserId,
    ) -> LedgerResult<Period>
    where
        L: EventLog,
        S: LedgerStore,
    {
        let mut period = Self::load(journal.store(), period_id)?;

        // Dry run so an illegal transition never reaches the journal.
        period.close(soft, Utc::now())?;

        journal.record(
            LedgerEvent::PeriodClosed(PeriodClosed { period_id, soft }),
            period.end,
            user_id,
        )?;
        info!(period_id = %period_id, soft, "period closed");

        Self::load(journal.store(), period_id)
    }

    fn load<S: LedgerStore>(store: &S, id: PeriodId) -> LedgerResult<Period> {
        store
            .period(&id)
            .context("load", "period")?
            .ok_or_else(|| LedgerError::not_found("period", id))
    }
}
