// Module declarations
pub(crate) mod journal_errors;
pub(crate) mod journal_model;
pub(crate) mod journal_repository;
pub(crate) mod journal_service;
pub(crate) mod journal_traits;
pub(crate) mod journal_validator;
pub(crate) mod journal_validator_tests;

// Re-export the public interface
pub use journal_model::{
    EntryStatus, JournalEntry, JournalEntryDB, JournalEntryFilter, JournalEntryUpdate,
    JournalLine, JournalLineDB, NewJournalEntry, NewJournalLine,
};
pub use journal_repository::JournalRepository;
pub use journal_service::JournalService;
pub use journal_traits::{JournalRepositoryTrait, JournalServiceTrait};
pub use journal_validator::{validate_lines, ValidatedTotals};

// Re-export error types for convenience
pub use journal_errors::{JournalError, Result};
