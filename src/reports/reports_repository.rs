use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::errors::Result;
use crate::journal::EntryStatus;
use crate::schema::{accounts, journal_entries, journal_lines};
use crate::utils::parse_stored_decimal;

/// One posted line's contribution to an account, already parsed.
#[derive(Debug, Clone)]
pub struct Movement {
    pub account_id: String,
    pub debit_amount: Decimal,
    pub credit_amount: Decimal,
}

/// A movement tagged with its account's stored type, for range reports
/// that group by classification rather than by account.
#[derive(Debug, Clone)]
pub struct TypedMovement {
    pub account_type: String,
    pub debit_amount: Decimal,
    pub credit_amount: Decimal,
}

/// Read-only queries over the movement log. Only drafts are excluded:
/// a voided entry once moved balances and stays in the log, its effect
/// cancelled by its posted reversal rather than by filtering.
pub struct ReportRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl ReportRepository {
    /// Creates a new ReportRepository instance
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    fn parse_rows(rows: Vec<(String, String, String)>) -> Vec<Movement> {
        rows.into_iter()
            .map(|(account_id, debit, credit)| Movement {
                account_id,
                debit_amount: parse_stored_decimal(&debit, "debit_amount"),
                credit_amount: parse_stored_decimal(&credit, "credit_amount"),
            })
            .collect()
    }

    /// Balance-affecting movements for one account with
    /// `entry_date <= as_of`.
    pub fn movements_for_account(
        &self,
        account_id: &str,
        as_of: NaiveDate,
    ) -> Result<Vec<Movement>> {
        let mut conn = self.pool.get()?;
        let rows = journal_lines::table
            .inner_join(journal_entries::table)
            .filter(journal_entries::status.ne(EntryStatus::Draft.as_str()))
            .filter(journal_entries::entry_date.le(as_of))
            .filter(journal_lines::account_id.eq(account_id))
            .select((
                journal_lines::account_id,
                journal_lines::debit_amount,
                journal_lines::credit_amount,
            ))
            .load::<(String, String, String)>(&mut conn)?;
        Ok(Self::parse_rows(rows))
    }

    /// All balance-affecting movements with `entry_date <= as_of`.
    pub fn movements_as_of(&self, as_of: NaiveDate) -> Result<Vec<Movement>> {
        let mut conn = self.pool.get()?;
        let rows = journal_lines::table
            .inner_join(journal_entries::table)
            .filter(journal_entries::status.ne(EntryStatus::Draft.as_str()))
            .filter(journal_entries::entry_date.le(as_of))
            .select((
                journal_lines::account_id,
                journal_lines::debit_amount,
                journal_lines::credit_amount,
            ))
            .load::<(String, String, String)>(&mut conn)?;
        Ok(Self::parse_rows(rows))
    }

    /// Every balance-affecting movement regardless of date, for full
    /// reconstruction.
    pub fn all_movements(&self) -> Result<Vec<Movement>> {
        let mut conn = self.pool.get()?;
        let rows = journal_lines::table
            .inner_join(journal_entries::table)
            .filter(journal_entries::status.ne(EntryStatus::Draft.as_str()))
            .select((
                journal_lines::account_id,
                journal_lines::debit_amount,
                journal_lines::credit_amount,
            ))
            .load::<(String, String, String)>(&mut conn)?;
        Ok(Self::parse_rows(rows))
    }

    /// Movements in a date range, tagged with the account type.
    pub fn typed_movements_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<TypedMovement>> {
        let mut conn = self.pool.get()?;
        let rows = journal_lines::table
            .inner_join(journal_entries::table)
            .inner_join(accounts::table)
            .filter(journal_entries::status.ne(EntryStatus::Draft.as_str()))
            .filter(journal_entries::entry_date.ge(from))
            .filter(journal_entries::entry_date.le(to))
            .select((
                accounts::account_type,
                journal_lines::debit_amount,
                journal_lines::credit_amount,
            ))
            .load::<(String, String, String)>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(|(account_type, debit, credit)| TypedMovement {
                account_type,
                debit_amount: parse_stored_decimal(&debit, "debit_amount"),
                credit_amount: parse_stored_decimal(&credit, "credit_amount"),
            })
            .collect())
    }
}
