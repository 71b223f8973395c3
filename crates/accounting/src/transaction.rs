use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use folio_core::{AccountId, Amount, DomainError, DomainResult, Entity, EntryId, TransactionId, UserId};

use crate::entry::{Entry, EntryType, Tags};

/// Transaction lifecycle: `Pending → Posted → Reversed`.
///
/// `Reversed` is terminal for posting but keeps every entry in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Posted,
    Reversed,
}

impl TransactionStatus {
    /// Whether entries of a transaction in this status count towards balances.
    pub fn counts_in_balances(self) -> bool {
        matches!(self, TransactionStatus::Posted | TransactionStatus::Reversed)
    }
}

/// Bi-temporal aggregate of entries.
///
/// `valid_time` is when the movement is effective for the business;
/// `transaction_time` is when the ledger recorded it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub description: String,
    pub valid_time: DateTime<Utc>,
    pub transaction_time: DateTime<Utc>,
    pub status: TransactionStatus,
    pub entries: Vec<Entry>,
    pub source_ref: Option<String>,
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub posted_at: Option<DateTime<Utc>>,
    /// Set on a reversing transaction: the transaction it mirrors.
    pub reverses: Option<TransactionId>,
    /// Set on a reversed transaction: the mirror that cancelled it.
    pub reversed_by: Option<TransactionId>,
}

impl Transaction {
    /// A new pending transaction with no entries.
    pub fn new(description: impl Into<String>, valid_time: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            description: description.into(),
            valid_time,
            transaction_time: now,
            status: TransactionStatus::Pending,
            entries: Vec::new(),
            source_ref: None,
            user_id: None,
            created_at: now,
            updated_at: now,
            posted_at: None,
            reverses: None,
            reversed_by: None,
        }
    }

    pub fn with_id(mut self, id: TransactionId) -> Self {
        self.id = id;
        for entry in &mut self.entries {
            entry.transaction_id = id;
        }
        self
    }

    pub fn with_source_ref(mut self, source_ref: impl Into<String>) -> Self {
        self.source_ref = Some(source_ref.into());
        self
    }

    pub fn debit(self, account_id: AccountId, amount: Amount) -> Self {
        self.line(account_id, EntryType::Debit, amount, Tags::new())
    }

    pub fn credit(self, account_id: AccountId, amount: Amount) -> Self {
        self.line(account_id, EntryType::Credit, amount, Tags::new())
    }

    /// Append an entry line with tags.
    pub fn line(
        mut self,
        account_id: AccountId,
        entry_type: EntryType,
        amount: Amount,
        tags: Tags,
    ) -> Self {
        self.entries.push(Entry {
            id: None,
            transaction_id: self.id,
            account_id,
            entry_type,
            amount,
            tags,
        });
        self
    }

    pub fn is_reversal(&self) -> bool {
        self.reverses.is_some()
    }

    /// Sum of entry values of one side, as raw minor units across currencies.
    pub fn side_total(&self, side: EntryType) -> i128 {
        self.entries
            .iter()
            .filter(|e| e.entry_type == side)
            .map(|e| i128::from(e.amount.value()))
            .sum()
    }

    /// Entries with every missing id filled in.
    pub fn entries_with_ids(&self) -> Vec<Entry> {
        self.entries
            .iter()
            .cloned()
            .map(|mut e| {
                e.id.get_or_insert_with(EntryId::new);
                e.transaction_id = self.id;
                e
            })
            .collect()
    }

    /// `Pending → Posted`. The finalized entries replace the draft ones.
    pub fn mark_posted(&mut self, entries: Vec<Entry>, posted_at: DateTime<Utc>) -> DomainResult<()> {
        if self.status != TransactionStatus::Pending {
            return Err(DomainError::precondition(format!(
                "transaction {} is {:?}; only pending transactions can be posted",
                self.id, self.status
            )));
        }
        self.entries = entries;
        self.status = TransactionStatus::Posted;
        self.posted_at = Some(posted_at);
        self.updated_at = posted_at;
        Ok(())
    }

    /// `Posted → Reversed`.
    pub fn mark_reversed(&mut self, reversal_id: TransactionId, at: DateTime<Utc>) -> DomainResult<()> {
        if self.status != TransactionStatus::Posted {
            return Err(DomainError::precondition("can only reverse posted transactions"));
        }
        self.status = TransactionStatus::Reversed;
        self.reversed_by = Some(reversal_id);
        self.updated_at = at;
        Ok(())
    }

    /// Build the pending mirror of this transaction: same amounts and tags with
    /// debit and credit swapped.
    pub fn mirror(&self, description: impl Into<String>, valid_time: DateTime<Utc>) -> Transaction {
        let mut mirror = Transaction::new(description, valid_time)
            .with_source_ref(format!("reversal:{}", self.id));
        mirror.reverses = Some(self.id);
        for entry in &self.entries {
            mirror = mirror.line(
                entry.account_id.clone(),
                entry.entry_type.opposite(),
                entry.amount.clone(),
                entry.tags.clone(),
            );
        }
        mirror
    }
}

impl Entity for Transaction {
    type Id = TransactionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
