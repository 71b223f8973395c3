//! Projection runner utilities (read model builders).
//!
//! Read models are **disposable**; events are the source of truth.
//! This module provides deterministic replay and cursor tracking without
//! making storage assumptions.

use crate::{EventEnvelope, Projection, ProjectionError};

/// Runs envelopes through a projection and tracks the last applied sequence.
#[derive(Debug)]
pub struct ProjectionRunner<P>
where
    P: Projection,
{
    projection: P,
    last_sequence: Option<u64>,
}

impl<P> ProjectionRunner<P>
where
    P: Projection,
{
    pub fn new(projection: P) -> Self {
        Self {
            projection,
            last_sequence: None,
        }
    }

    pub fn projection(&self) -> &P {
        &self.projection
    }

    pub fn projection_mut(&mut self) -> &mut P {
        &mut self.projection
    }

    pub fn into_projection(self) -> P {
        self.projection
    }

    /// Sequence number of the last applied envelope (if any).
    pub fn last_sequence(&self) -> Option<u64> {
        self.last_sequence
    }

    /// Apply a single envelope, enforcing strictly increasing sequence numbers.
    pub fn apply(
        &mut self,
        envelope: &EventEnvelope<P::Ev>,
    ) -> Result<(), ProjectionError<P::Error>> {
        let found = envelope.sequence();
        if let Some(last) = self.last_sequence {
            if found <= last {
                return Err(ProjectionError::NonMonotonicSequence { last, found });
            }
        }

        self.projection
            .apply(envelope)
            .map_err(ProjectionError::Apply)?;
        self.last_sequence = Some(found);

        tracing::debug!(
            sequence = found,
            event_type = envelope.event_type(),
            "projection applied event"
        );
        Ok(())
    }

    /// Apply many envelopes in order.
    pub fn run<'a>(
        &mut self,
        envelopes: impl IntoIterator<Item = &'a EventEnvelope<P::Ev>>,
    ) -> Result<usize, ProjectionError<P::Error>>
    where
        P::Ev: 'a,
    {
        let mut applied = 0;
        for env in envelopes {
            self.apply(env)?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Reset the projection and replay the full history into it.
    ///
    /// Returns the number of envelopes applied.
    pub fn rebuild<'a>(
        &mut self,
        envelopes: impl IntoIterator<Item = &'a EventEnvelope<P::Ev>>,
    ) -> Result<usize, ProjectionError<P::Error>>
    where
        P::Ev: 'a,
    {
        self.projection.reset().map_err(ProjectionError::Apply)?;
        self.last_sequence = None;
        self.run(envelopes)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use folio_core::{EventId, UserId};
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::Event;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Deposited(i64);

    impl Event for Deposited {
        fn event_type(&self) -> &'static str {
            "test.deposited"
        }

        fn version(&self) -> u32 {
            1
        }
    }

    #[derive(Debug, Default)]
    struct Total(i64);

    impl Projection for Total {
        type Ev = Deposited;
        type Error = std::convert::Infallible;

        fn apply(&mut self, envelope: &EventEnvelope<Deposited>) -> Result<(), Self::Error> {
            self.0 += envelope.payload().0;
            Ok(())
        }

        fn reset(&mut self) -> Result<(), Self::Error> {
            self.0 = 0;
            Ok(())
        }
    }

    fn envelope(sequence: u64, amount: i64) -> EventEnvelope<Deposited> {
        let now = Utc::now();
        EventEnvelope::new(
            EventId::new(),
            sequence,
            "test.deposited",
            1,
            now,
            now,
            UserId::new("tester").unwrap(),
            Deposited(amount),
        )
    }

    #[test]
    fn rejects_replayed_sequence_numbers() {
        let mut runner = ProjectionRunner::new(Total::default());
        runner.apply(&envelope(1, 10)).unwrap();

        let err = runner.apply(&envelope(1, 10)).unwrap_err();
        assert!(matches!(
            err,
            ProjectionError::NonMonotonicSequence { last: 1, found: 1 }
        ));
        assert_eq!(runner.projection().0, 10);
    }

    #[test]
    fn rebuild_is_repeatable() {
        let history = vec![envelope(1, 10), envelope(2, -3), envelope(3, 5)];
        let mut runner = ProjectionRunner::new(Total::default());

        assert_eq!(runner.rebuild(&history).unwrap(), 3);
        assert_eq!(runner.rebuild(&history).unwrap(), 3);
        assert_eq!(runner.projection().0, 12);
        assert_eq!(runner.last_sequence(), Some(3));
    }

    #[test]
    fn decode_rejects_tag_mismatch() {
        let now = Utc::now();
        let stored = crate::JournalEvent::new(
            EventId::new(),
            1,
            "test.withdrawn",
            1,
            now,
            now,
            UserId::new("tester").unwrap(),
            serde_json::to_value(Deposited(4)).unwrap(),
        );

        assert!(matches!(
            stored.decode::<Deposited>(),
            Err(crate::DecodeError::TagMismatch { .. })
        ));
    }
}
