use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use log::error;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::journal_errors::{JournalError, Result};
use crate::utils::parse_stored_decimal;

/// Journal entry lifecycle state.
///
/// The only legal transitions are draft -> posted and posted -> voided;
/// everything else is rejected by `transition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Entry is being drafted and can be edited or deleted freely.
    Draft,
    /// Entry has been posted; balances reflect it and it is immutable.
    Posted,
    /// Entry was reversed by a compensating entry; immutable.
    Voided,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Draft => "draft",
            EntryStatus::Posted => "posted",
            EntryStatus::Voided => "voided",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(EntryStatus::Draft),
            "posted" => Some(EntryStatus::Posted),
            "voided" => Some(EntryStatus::Voided),
            _ => None,
        }
    }

    /// True when the entry can still be edited or deleted.
    pub fn is_editable(&self) -> bool {
        matches!(self, EntryStatus::Draft)
    }

    /// Checks a lifecycle transition and returns the new state.
    pub fn transition(self, to: EntryStatus) -> Result<EntryStatus> {
        match (self, to) {
            (EntryStatus::Draft, EntryStatus::Posted) => Ok(EntryStatus::Posted),
            (EntryStatus::Posted, EntryStatus::Voided) => Ok(EntryStatus::Voided),
            (from, to) => Err(JournalError::InvalidState(format!(
                "Journal entry cannot move from '{}' to '{}'",
                from.as_str(),
                to.as_str()
            ))),
        }
    }
}

/// Domain model for a single debit/credit leg of an entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalLine {
    pub id: String,
    pub entry_id: String,
    pub line_index: i32,
    pub account_id: String,
    pub debit_amount: Decimal,
    pub credit_amount: Decimal,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Domain model for a journal entry with its lines
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: String,
    pub entry_number: String,
    pub entry_date: NaiveDate,
    pub description: String,
    pub property_id: Option<String>,
    pub status: EntryStatus,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub reversal_of_entry_id: Option<String>,
    pub reversed_by_entry_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub posted_at: Option<NaiveDateTime>,
    pub voided_at: Option<NaiveDateTime>,
    pub lines: Vec<JournalLine>,
}

/// Input model for a new line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJournalLine {
    pub account_id: String,
    pub debit_amount: Decimal,
    pub credit_amount: Decimal,
    pub description: Option<String>,
}

/// Input model for creating a new draft entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJournalEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub entry_number: String,
    pub entry_date: NaiveDate,
    pub description: String,
    pub property_id: Option<String>,
    pub lines: Vec<NewJournalLine>,
}

impl NewJournalEntry {
    /// Validates the entry header; line and balance checks live in the
    /// validator.
    pub fn validate(&self) -> Result<()> {
        if self.entry_number.trim().is_empty() {
            return Err(JournalError::Validation(
                "Entry number cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Input model for replacing a draft entry's header and lines
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntryUpdate {
    pub id: Option<String>,
    pub entry_date: NaiveDate,
    pub description: String,
    pub property_id: Option<String>,
    pub lines: Vec<NewJournalLine>,
}

impl JournalEntryUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.id.is_none() {
            return Err(JournalError::Validation(
                "Entry ID is required for updates".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read filter for `list_entries`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntryFilter {
    pub status: Option<EntryStatus>,
    pub property_id: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
}

/// Database model for journal entry headers
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::journal_entries)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct JournalEntryDB {
    pub id: String,
    pub entry_number: String,
    pub entry_date: NaiveDate,
    pub description: String,
    pub property_id: Option<String>,
    pub status: String,
    pub total_debit: String,
    pub total_credit: String,
    pub reversal_of_entry_id: Option<String>,
    pub reversed_by_entry_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub posted_at: Option<NaiveDateTime>,
    pub voided_at: Option<NaiveDateTime>,
}

/// Database model for journal lines
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    Associations,
    PartialEq,
    Serialize,
    Deserialize,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::journal_lines)]
#[diesel(belongs_to(JournalEntryDB, foreign_key = entry_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct JournalLineDB {
    pub id: String,
    pub entry_id: String,
    pub line_index: i32,
    pub account_id: String,
    pub debit_amount: String,
    pub credit_amount: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

fn parse_stored_status(s: &str) -> EntryStatus {
    EntryStatus::from_str(s).unwrap_or_else(|| {
        error!("Unknown stored entry status '{}', treating as draft", s);
        EntryStatus::Draft
    })
}

impl From<JournalLineDB> for JournalLine {
    fn from(db: JournalLineDB) -> Self {
        Self {
            id: db.id,
            entry_id: db.entry_id,
            line_index: db.line_index,
            account_id: db.account_id,
            debit_amount: parse_stored_decimal(&db.debit_amount, "debit_amount"),
            credit_amount: parse_stored_decimal(&db.credit_amount, "credit_amount"),
            description: db.description,
            created_at: db.created_at,
        }
    }
}

impl JournalEntry {
    /// Assembles the domain entry from its header and line rows.
    pub fn from_db(header: JournalEntryDB, lines: Vec<JournalLineDB>) -> Self {
        Self {
            id: header.id,
            entry_number: header.entry_number,
            entry_date: header.entry_date,
            description: header.description,
            property_id: header.property_id,
            status: parse_stored_status(&header.status),
            total_debit: parse_stored_decimal(&header.total_debit, "total_debit"),
            total_credit: parse_stored_decimal(&header.total_credit, "total_credit"),
            reversal_of_entry_id: header.reversal_of_entry_id,
            reversed_by_entry_id: header.reversed_by_entry_id,
            created_at: header.created_at,
            updated_at: header.updated_at,
            posted_at: header.posted_at,
            voided_at: header.voided_at,
            lines: lines.into_iter().map(JournalLine::from).collect(),
        }
    }
}

impl From<NewJournalEntry> for JournalEntryDB {
    fn from(domain: NewJournalEntry) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: domain.id.unwrap_or_default(),
            entry_number: domain.entry_number,
            entry_date: domain.entry_date,
            description: domain.description,
            property_id: domain.property_id,
            status: EntryStatus::Draft.as_str().to_string(),
            total_debit: Decimal::ZERO.to_string(),
            total_credit: Decimal::ZERO.to_string(),
            reversal_of_entry_id: None,
            reversed_by_entry_id: None,
            created_at: now,
            updated_at: now,
            posted_at: None,
            voided_at: None,
        }
    }
}

impl NewJournalLine {
    /// Builds the storage row for this line under the given entry.
    pub fn into_db(self, entry_id: &str, line_index: i32) -> JournalLineDB {
        JournalLineDB {
            id: uuid::Uuid::new_v4().to_string(),
            entry_id: entry_id.to_string(),
            line_index,
            account_id: self.account_id,
            debit_amount: self.debit_amount.to_string(),
            credit_amount: self.credit_amount.to_string(),
            description: self.description,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
