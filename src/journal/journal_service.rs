use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::sync::Arc;

use super::journal_model::{
    JournalEntry, JournalEntryFilter, JournalEntryUpdate, NewJournalEntry, NewJournalLine,
};
use super::journal_repository::JournalRepository;
use super::journal_traits::{JournalRepositoryTrait, JournalServiceTrait};
use super::journal_validator::{validate_lines, ValidatedTotals};
use crate::accounts::{AccountError, AccountRepository, AccountRepositoryTrait};
use crate::audit::{AuditRepository, NewAuditRecord};
use crate::journal::{JournalError, Result};

/// Service for draft journal entries.
///
/// Posting and voiding live in the posting state machine; this service
/// only ever touches entries that have not yet moved balances.
pub struct JournalService {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl JournalService {
    /// Creates a new JournalService instance
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    /// Validates lines against the live registry
    fn validate_against_registry(&self, lines: &[NewJournalLine]) -> Result<ValidatedTotals> {
        let account_repo = AccountRepository::new(self.pool.clone());
        validate_lines(lines, |account_id| {
            match account_repo.get_by_id(account_id) {
                Ok(account) => Ok(Some(account)),
                Err(AccountError::NotFound(_)) => Ok(None),
                Err(e) => Err(JournalError::from(e)),
            }
        })
    }

    fn audit(&self, entry_id: &str, action: &str, actor: &str) -> Result<()> {
        AuditRepository::new(self.pool.clone())
            .append(NewAuditRecord::journal_entry(entry_id, action, actor, None))
            .map_err(|e| JournalError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

impl JournalServiceTrait for JournalService {
    /// Validates and stores a new draft entry
    fn create_draft(&self, new_entry: NewJournalEntry, actor: &str) -> Result<JournalEntry> {
        debug!("Creating draft journal entry {}", new_entry.entry_number);

        new_entry.validate()?;
        let totals = self.validate_against_registry(&new_entry.lines)?;

        let repo = JournalRepository::new(self.pool.clone());
        let entry = repo.create(new_entry, &totals)?;

        self.audit(&entry.id, "draft_created", actor)?;
        Ok(entry)
    }

    /// Re-validates and replaces a draft entry's content
    fn update_draft(&self, entry_update: JournalEntryUpdate, actor: &str) -> Result<JournalEntry> {
        entry_update.validate()?;
        let totals = self.validate_against_registry(&entry_update.lines)?;

        let repo = JournalRepository::new(self.pool.clone());
        let entry = repo.update_draft(entry_update, &totals)?;

        self.audit(&entry.id, "draft_updated", actor)?;
        Ok(entry)
    }

    /// Deletes a draft entry
    fn delete_draft(&self, entry_id: &str, actor: &str) -> Result<()> {
        let repo = JournalRepository::new(self.pool.clone());
        repo.delete_draft(entry_id)?;

        self.audit(entry_id, "draft_deleted", actor)
    }

    /// Retrieves an entry with its lines
    fn get_entry(&self, entry_id: &str) -> Result<JournalEntry> {
        let repo = JournalRepository::new(self.pool.clone());
        repo.get_by_id(entry_id)
    }

    /// Retrieves an entry by its operator-assigned number
    fn get_entry_by_number(&self, entry_number: &str) -> Result<JournalEntry> {
        let repo = JournalRepository::new(self.pool.clone());
        repo.get_by_number(entry_number)
    }

    /// Lists entries matching the filter
    fn list_entries(&self, filter: &JournalEntryFilter) -> Result<Vec<JournalEntry>> {
        let repo = JournalRepository::new(self.pool.clone());
        repo.list(filter)
    }
}
