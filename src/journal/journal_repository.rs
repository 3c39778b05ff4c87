use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::DatabaseErrorKind;
use diesel::sqlite::SqliteConnection;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::get_connection;
use crate::journal::{JournalError, Result};
use crate::schema::{journal_entries, journal_lines};

use super::journal_model::{
    EntryStatus, JournalEntry, JournalEntryDB, JournalEntryFilter, JournalEntryUpdate,
    JournalLineDB, NewJournalEntry,
};
use super::journal_traits::JournalRepositoryTrait;
use super::journal_validator::ValidatedTotals;

/// Repository for journal entry headers and lines
pub struct JournalRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl JournalRepository {
    /// Creates a new JournalRepository instance
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    /// Loads an entry with its lines on an existing connection
    pub fn get_by_id_in_transaction(
        conn: &mut SqliteConnection,
        entry_id: &str,
    ) -> Result<JournalEntry> {
        let header = journal_entries::table
            .find(entry_id)
            .first::<JournalEntryDB>(conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => JournalError::NotFound(format!(
                    "Journal entry with id {} not found",
                    entry_id
                )),
                _ => JournalError::DatabaseError(e.to_string()),
            })?;

        let lines = journal_lines::table
            .filter(journal_lines::entry_id.eq(entry_id))
            .order(journal_lines::line_index.asc())
            .load::<JournalLineDB>(conn)
            .map_err(|e| JournalError::DatabaseError(e.to_string()))?;

        Ok(JournalEntry::from_db(header, lines))
    }

    /// Inserts a draft header and its lines on an existing connection
    pub fn insert_in_transaction(
        conn: &mut SqliteConnection,
        header: &JournalEntryDB,
        lines: &[JournalLineDB],
    ) -> Result<()> {
        diesel::insert_into(journal_entries::table)
            .values(header)
            .execute(conn)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    JournalError::Validation(format!(
                        "Entry number '{}' is already in use",
                        header.entry_number
                    ))
                }
                other => JournalError::DatabaseError(other.to_string()),
            })?;

        diesel::insert_into(journal_lines::table)
            .values(lines)
            .execute(conn)
            .map_err(|e| JournalError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    /// Stamps an entry as posted. Part of the posting transaction; never
    /// called outside it.
    pub fn mark_posted_in_transaction(
        conn: &mut SqliteConnection,
        entry_id: &str,
        totals: &ValidatedTotals,
    ) -> Result<()> {
        let now = chrono::Utc::now().naive_utc();
        diesel::update(journal_entries::table.find(entry_id))
            .set((
                journal_entries::status.eq(EntryStatus::Posted.as_str()),
                journal_entries::total_debit.eq(totals.total_debit.to_string()),
                journal_entries::total_credit.eq(totals.total_credit.to_string()),
                journal_entries::posted_at.eq(now),
                journal_entries::updated_at.eq(now),
            ))
            .execute(conn)
            .map_err(|e| JournalError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    /// Stamps an entry as voided and links it to its reversal
    pub fn mark_voided_in_transaction(
        conn: &mut SqliteConnection,
        entry_id: &str,
        reversal_entry_id: &str,
    ) -> Result<()> {
        let now = chrono::Utc::now().naive_utc();
        diesel::update(journal_entries::table.find(entry_id))
            .set((
                journal_entries::status.eq(EntryStatus::Voided.as_str()),
                journal_entries::reversed_by_entry_id.eq(reversal_entry_id),
                journal_entries::voided_at.eq(now),
                journal_entries::updated_at.eq(now),
            ))
            .execute(conn)
            .map_err(|e| JournalError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

impl JournalRepositoryTrait for JournalRepository {
    /// Persists a validated draft entry and its lines atomically
    fn create(&self, new_entry: NewJournalEntry, totals: &ValidatedTotals) -> Result<JournalEntry> {
        new_entry.validate()?;

        let mut conn = get_connection(&self.pool)
            .map_err(|e| JournalError::DatabaseError(e.to_string()))?;

        let lines_input = new_entry.lines.clone();
        let mut header: JournalEntryDB = new_entry.into();
        if header.id.is_empty() {
            header.id = uuid::Uuid::new_v4().to_string();
        }
        header.total_debit = totals.total_debit.to_string();
        header.total_credit = totals.total_credit.to_string();

        let lines_db: Vec<JournalLineDB> = lines_input
            .into_iter()
            .enumerate()
            .map(|(i, line)| line.into_db(&header.id, i as i32))
            .collect();

        let entry_id = header.id.clone();
        conn.transaction::<_, JournalError, _>(|tx_conn| {
            Self::insert_in_transaction(tx_conn, &header, &lines_db)?;
            Self::get_by_id_in_transaction(tx_conn, &entry_id)
        })
    }

    /// Replaces a draft entry's header fields and lines.
    ///
    /// Posted and voided entries are immutable; any attempt to edit them
    /// fails with `InvalidState`.
    fn update_draft(
        &self,
        entry_update: JournalEntryUpdate,
        totals: &ValidatedTotals,
    ) -> Result<JournalEntry> {
        entry_update.validate()?;

        let mut conn = get_connection(&self.pool)
            .map_err(|e| JournalError::DatabaseError(e.to_string()))?;

        let entry_id = entry_update.id.clone().unwrap_or_default();
        conn.transaction::<_, JournalError, _>(|tx_conn| {
            let existing = Self::get_by_id_in_transaction(tx_conn, &entry_id)?;
            if !existing.status.is_editable() {
                return Err(JournalError::InvalidState(format!(
                    "Journal entry {} is {} and cannot be edited",
                    existing.entry_number,
                    existing.status.as_str()
                )));
            }

            let now = chrono::Utc::now().naive_utc();
            diesel::update(journal_entries::table.find(&entry_id))
                .set((
                    journal_entries::entry_date.eq(entry_update.entry_date),
                    journal_entries::description.eq(&entry_update.description),
                    journal_entries::property_id.eq(&entry_update.property_id),
                    journal_entries::total_debit.eq(totals.total_debit.to_string()),
                    journal_entries::total_credit.eq(totals.total_credit.to_string()),
                    journal_entries::updated_at.eq(now),
                ))
                .execute(tx_conn)
                .map_err(|e| JournalError::DatabaseError(e.to_string()))?;

            diesel::delete(journal_lines::table.filter(journal_lines::entry_id.eq(&entry_id)))
                .execute(tx_conn)
                .map_err(|e| JournalError::DatabaseError(e.to_string()))?;

            let lines_db: Vec<JournalLineDB> = entry_update
                .lines
                .into_iter()
                .enumerate()
                .map(|(i, line)| line.into_db(&entry_id, i as i32))
                .collect();

            diesel::insert_into(journal_lines::table)
                .values(&lines_db)
                .execute(tx_conn)
                .map_err(|e| JournalError::DatabaseError(e.to_string()))?;

            Self::get_by_id_in_transaction(tx_conn, &entry_id)
        })
    }

    /// Deletes a draft entry and its lines. Drafts have never touched
    /// balances, so deletion is unrestricted; posted entries can only be
    /// voided.
    fn delete_draft(&self, entry_id: &str) -> Result<()> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| JournalError::DatabaseError(e.to_string()))?;

        conn.transaction::<_, JournalError, _>(|tx_conn| {
            let existing = Self::get_by_id_in_transaction(tx_conn, entry_id)?;
            if !existing.status.is_editable() {
                return Err(JournalError::InvalidState(format!(
                    "Journal entry {} is {} and cannot be deleted",
                    existing.entry_number,
                    existing.status.as_str()
                )));
            }

            diesel::delete(journal_lines::table.filter(journal_lines::entry_id.eq(entry_id)))
                .execute(tx_conn)
                .map_err(|e| JournalError::DatabaseError(e.to_string()))?;
            diesel::delete(journal_entries::table.find(entry_id))
                .execute(tx_conn)
                .map_err(|e| JournalError::DatabaseError(e.to_string()))?;
            Ok(())
        })
    }

    /// Retrieves an entry with its lines by ID
    fn get_by_id(&self, entry_id: &str) -> Result<JournalEntry> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| JournalError::DatabaseError(e.to_string()))?;
        Self::get_by_id_in_transaction(&mut conn, entry_id)
    }

    /// Retrieves an entry with its lines by entry number
    fn get_by_number(&self, entry_number: &str) -> Result<JournalEntry> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| JournalError::DatabaseError(e.to_string()))?;

        let header = journal_entries::table
            .filter(journal_entries::entry_number.eq(entry_number))
            .first::<JournalEntryDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => JournalError::NotFound(format!(
                    "Journal entry with number {} not found",
                    entry_number
                )),
                _ => JournalError::DatabaseError(e.to_string()),
            })?;

        let entry_id = header.id.clone();
        let lines = journal_lines::table
            .filter(journal_lines::entry_id.eq(&entry_id))
            .order(journal_lines::line_index.asc())
            .load::<JournalLineDB>(&mut conn)
            .map_err(|e| JournalError::DatabaseError(e.to_string()))?;

        Ok(JournalEntry::from_db(header, lines))
    }

    /// Lists entries with their lines, filtered by status, property and
    /// date range, ordered by entry date then entry number
    fn list(&self, filter: &JournalEntryFilter) -> Result<Vec<JournalEntry>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| JournalError::DatabaseError(e.to_string()))?;

        let mut query = journal_entries::table.into_boxed();

        if let Some(status) = filter.status {
            query = query.filter(journal_entries::status.eq(status.as_str()));
        }
        if let Some(ref property_id) = filter.property_id {
            query = query.filter(journal_entries::property_id.eq(property_id));
        }
        if let Some(from_date) = filter.from_date {
            query = query.filter(journal_entries::entry_date.ge(from_date));
        }
        if let Some(to_date) = filter.to_date {
            query = query.filter(journal_entries::entry_date.le(to_date));
        }

        let headers = query
            .order((
                journal_entries::entry_date.asc(),
                journal_entries::entry_number.asc(),
            ))
            .load::<JournalEntryDB>(&mut conn)
            .map_err(|e| JournalError::DatabaseError(e.to_string()))?;

        let entry_ids: Vec<String> = headers.iter().map(|h| h.id.clone()).collect();
        let all_lines = journal_lines::table
            .filter(journal_lines::entry_id.eq_any(&entry_ids))
            .order(journal_lines::line_index.asc())
            .load::<JournalLineDB>(&mut conn)
            .map_err(|e| JournalError::DatabaseError(e.to_string()))?;

        let mut lines_by_entry: HashMap<String, Vec<JournalLineDB>> = HashMap::new();
        for line in all_lines {
            lines_by_entry
                .entry(line.entry_id.clone())
                .or_default()
                .push(line);
        }

        Ok(headers
            .into_iter()
            .map(|header| {
                let lines = lines_by_entry.remove(&header.id).unwrap_or_default();
                JournalEntry::from_db(header, lines)
            })
            .collect())
    }
}
