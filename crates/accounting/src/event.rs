use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use folio_core::{AccountId, PeriodId, TransactionId};
use folio_events::Event;

use crate::account::Account;
use crate::entry::Entry;
use crate::period::Period;
use crate::transaction::Transaction;

/// Event: AccountCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCreated {
    pub account: Account,
}

/// Event: AccountClosed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountClosed {
    pub account_id: AccountId,
    pub closed_at: DateTime<Utc>,
}

/// Event: TransactionCreated (always pending).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCreated {
    pub transaction: Transaction,
}

/// Event: TransactionPosted.
///
/// Carries the finalized entries (ids assigned) so replay reproduces the exact
/// same account index. The posting instant is the envelope's transaction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPosted {
    pub transaction_id: TransactionId,
    pub entries: Vec<Entry>,
}

/// Event: TransactionReversed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReversed {
    pub transaction_id: TransactionId,
    pub reversal_id: TransactionId,
}

/// Event: PeriodCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodCreated {
    pub period: Period,
}

/// Event: PeriodClosed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodClosed {
    pub period_id: PeriodId,
    pub soft: bool,
}

/// Closed set of journal payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum LedgerEvent {
    AccountCreated(AccountCreated),
    AccountClosed(AccountClosed),
    TransactionCreated(TransactionCreated),
    TransactionPosted(TransactionPosted),
    TransactionReversed(TransactionReversed),
    PeriodCreated(PeriodCreated),
    PeriodClosed(PeriodClosed),
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::AccountCreated(_) => "ledger.account.created",
            LedgerEvent::AccountClosed(_) => "ledger.account.closed",
            LedgerEvent::TransactionCreated(_) => "ledger.transaction.created",
            LedgerEvent::TransactionPosted(_) => "ledger.transaction.posted",
            LedgerEvent::TransactionReversed(_) => "ledger.transaction.reversed",
            LedgerEvent::PeriodCreated(_) => "ledger.period.created",
            LedgerEvent::PeriodClosed(_) => "ledger.period.closed",
        }
    }

    fn version(&self) -> u32 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_internally_tagged() {
        let ev = LedgerEvent::PeriodClosed(PeriodClosed {
            period_id: PeriodId::new(),
            soft: true,
        });

        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "period_closed");
        assert_eq!(json["data"]["soft"], true);

        let back: LedgerEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, ev);
        assert_eq!(back.event_type(), "ledger.period.closed");
    }
}
