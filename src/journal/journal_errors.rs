use diesel::result::Error as DieselError;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::accounts::AccountError;

/// Custom error type for journal-entry operations.
///
/// Accounting-correctness failures carry the offending values so the
/// caller sees exactly which rule was violated.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Journal entry has no lines")]
    EmptyEntry,

    #[error("Line {line_index}: {reason}")]
    UnbalancedLine { line_index: usize, reason: String },

    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Account {0} is inactive")]
    InactiveAccount(String),

    #[error("Entry total debit {total_debit} does not equal total credit {total_credit}")]
    Imbalance {
        total_debit: Decimal,
        total_credit: Decimal,
    },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<DieselError> for JournalError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => JournalError::NotFound("Record not found".to_string()),
            _ => JournalError::DatabaseError(err.to_string()),
        }
    }
}

impl From<AccountError> for JournalError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NotFound(msg) => JournalError::UnknownAccount(msg),
            AccountError::DatabaseError(msg) => JournalError::DatabaseError(msg),
            other => JournalError::Validation(other.to_string()),
        }
    }
}

/// Result type for journal operations
pub type Result<T> = std::result::Result<T, JournalError>;
