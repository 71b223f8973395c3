use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use folio_core::{DomainError, DomainResult, Entity, PeriodId};

/// Status of an accounting period. Closing is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    Open,
    SoftClosed,
    HardClosed,
}

/// An accounting window `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub id: PeriodId,
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub soft_closed_at: Option<DateTime<Utc>>,
    pub hard_closed_at: Option<DateTime<Utc>>,
}

impl Period {
    pub fn new(
        name: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if start >= end {
            return Err(DomainError::validation("period start must precede its end"));
        }
        Ok(Self {
            id: PeriodId::new(),
            name: name.into(),
            start,
            end,
            soft_closed_at: None,
            hard_closed_at: None,
        })
    }

    pub fn status(&self) -> PeriodStatus {
        if self.hard_closed_at.is_some() {
            PeriodStatus::HardClosed
        } else if self.soft_closed_at.is_some() {
            PeriodStatus::SoftClosed
        } else {
            PeriodStatus::Open
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    pub fn overlaps(&self, other: &Period) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Apply a close transition.
    ///
    /// Soft close is only legal from `Open`; hard close from `Open` or
    /// `SoftClosed`.
    pub fn close(&mut self, soft: bool, at: DateTime<Utc>) -> DomainResult<()> {
        match (self.status(), soft) {
            (PeriodStatus::Open, true) => {
                self.soft_closed_at = Some(at);
                Ok(())
            }
            (PeriodStatus::Open | PeriodStatus::SoftClosed, false) => {
                self.hard_closed_at = Some(at);
                Ok(())
            }
            (status, _) => Err(DomainError::precondition(format!(
                "period {} is {:?}; cannot {} close it",
                self.id,
                status,
                if soft { "soft" } else { "hard" }
            ))),
        }
    }
}

impl Entity for Period {
    type Id = PeriodId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn january() -> Period {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Period::new("2026-01", start, start + Duration::days(31)).unwrap()
    }

    #[test]
    fn bounds_are_half_open() {
        let p = january();
        assert!(p.contains(p.start));
        assert!(!p.contains(p.end));
    }

    #[test]
    fn closing_is_one_way() {
        let mut p = january();
        let now = Utc::now();

        p.close(true, now).unwrap();
        assert_eq!(p.status(), PeriodStatus::SoftClosed);
        assert!(p.close(true, now).is_err());

        p.close(false, now).unwrap();
        assert_eq!(p.status(), PeriodStatus::HardClosed);
        assert!(p.close(false, now).is_err());
        assert!(p.close(true, now).is_err());
    }

    #[test]
    fn empty_window_is_rejected() {
        let at = Utc::now();
        assert!(Period::new("empty", at, at).is_err());
    }

    #[test]
    fn adjacent_periods_do_not_overlap() {
        let jan = january();
        let feb = Period::new("2026-02", jan.end, jan.end + Duration::days(28)).unwrap();
        assert!(!jan.overlaps(&feb));
        assert!(jan.overlaps(&jan.clone()));
    }
}
