//! Error model of the ledger's consumer-facing operations.

use thiserror::Error;

use folio_accounting::ValidationError;
use folio_core::DomainError;
use folio_events::{DecodeError, ProjectionError};

use crate::processor::ProcessError;
use crate::store::StorageError;

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger operation error.
///
/// Every failure returns to the immediate caller; nothing is retried and
/// nothing is partially applied.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Validation failed; no event was written.
    #[error("transaction rejected: {}", codes(.0))]
    Rejected(Vec<ValidationError>),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The operation is illegal in the current state (e.g. reversing a pending
    /// transaction, creating a duplicate account).
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Malformed input (e.g. a period whose start is not before its end).
    #[error("invalid input: {0}")]
    Invalid(String),

    /// Arithmetic left the representable range.
    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("storage failure during {operation} on {entity}: {source}")]
    Storage {
        operation: &'static str,
        entity: &'static str,
        #[source]
        source: StorageError,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Projection(#[from] ProjectionError<ProcessError>),
}

fn codes(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.code.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl LedgerError {
    pub fn not_found(entity: &'static str, id: impl core::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Validation errors carried by a rejection (empty for other variants).
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            LedgerError::Rejected(errors) => errors,
            _ => &[],
        }
    }
}

impl From<DomainError> for LedgerError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => LedgerError::Invalid(msg),
            DomainError::InvariantViolation(msg) => LedgerError::Invariant(msg),
            DomainError::NotFound { entity, id } => LedgerError::NotFound { entity, id },
            DomainError::Precondition(msg) | DomainError::Conflict(msg) => {
                LedgerError::Precondition(msg)
            }
        }
    }
}

/// Attach operation/entity context to a storage failure.
pub(crate) trait StorageContext<T> {
    fn context(self, operation: &'static str, entity: &'static str) -> LedgerResult<T>;
}

impl<T> StorageContext<T> for Result<T, StorageError> {
    fn context(self, operation: &'static str, entity: &'static str) -> LedgerResult<T> {
        self.map_err(|source| LedgerError::Storage {
            operation,
            entity,
            source,
        })
    }
}
