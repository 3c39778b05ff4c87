use super::journal_model::{
    JournalEntry, JournalEntryFilter, JournalEntryUpdate, NewJournalEntry,
};
use super::journal_validator::ValidatedTotals;
use crate::journal::Result;

/// Trait defining the contract for journal repository operations.
pub trait JournalRepositoryTrait: Send + Sync {
    fn create(&self, new_entry: NewJournalEntry, totals: &ValidatedTotals) -> Result<JournalEntry>;
    fn update_draft(
        &self,
        entry_update: JournalEntryUpdate,
        totals: &ValidatedTotals,
    ) -> Result<JournalEntry>;
    fn delete_draft(&self, entry_id: &str) -> Result<()>;
    fn get_by_id(&self, entry_id: &str) -> Result<JournalEntry>;
    fn get_by_number(&self, entry_number: &str) -> Result<JournalEntry>;
    fn list(&self, filter: &JournalEntryFilter) -> Result<Vec<JournalEntry>>;
}

/// Trait defining the contract for journal service operations.
pub trait JournalServiceTrait: Send + Sync {
    fn create_draft(&self, new_entry: NewJournalEntry, actor: &str) -> Result<JournalEntry>;
    fn update_draft(&self, entry_update: JournalEntryUpdate, actor: &str) -> Result<JournalEntry>;
    fn delete_draft(&self, entry_id: &str, actor: &str) -> Result<()>;
    fn get_entry(&self, entry_id: &str) -> Result<JournalEntry>;
    fn get_entry_by_number(&self, entry_number: &str) -> Result<JournalEntry>;
    fn list_entries(&self, filter: &JournalEntryFilter) -> Result<Vec<JournalEntry>>;
}
