use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use folio_core::{AccountId, Amount, EntryId, TransactionId};

/// Descriptive key/value tags used by dimension rollups.
pub type Tags = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Debit,
    Credit,
}

impl EntryType {
    pub fn opposite(self) -> Self {
        match self {
            EntryType::Debit => EntryType::Credit,
            EntryType::Credit => EntryType::Debit,
        }
    }
}

/// One debit or credit line of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Assigned at post time when the caller left it empty.
    pub id: Option<EntryId>,
    pub transaction_id: TransactionId,
    pub account_id: AccountId,
    pub entry_type: EntryType,
    /// Positive amount in minor units.
    pub amount: Amount,
    #[serde(default)]
    pub tags: Tags,
}

impl Entry {
    pub fn is_debit(&self) -> bool {
        self.entry_type == EntryType::Debit
    }

    /// Projection of the tag set onto `keys`; absent keys project to `None`.
    pub fn project_tags(&self, keys: &[String]) -> BTreeMap<String, Option<String>> {
        keys.iter()
            .map(|k| (k.clone(), self.tags.get(k).cloned()))
            .collect()
    }
}
