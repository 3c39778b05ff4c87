use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tempfile::TempDir;

use ledger_core::accounts::{AccountSubtype, AccountType, NewAccount};
use ledger_core::db::{self, DbPool};
use ledger_core::journal::{NewJournalEntry, NewJournalLine};

/// A migrated database in a temp directory. The directory is removed when
/// the value is dropped at the end of the test.
pub struct TestDb {
    pub pool: Arc<DbPool>,
    _dir: TempDir,
}

pub fn setup_db() -> TestDb {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = db::init(dir.path().to_str().unwrap()).expect("Failed to initialize database");
    let pool = db::create_pool(&db_path).expect("Failed to create database pool");
    db::run_migrations(&pool).expect("Failed to run migrations");
    TestDb {
        pool,
        _dir: dir,
    }
}

pub fn new_account(
    number: &str,
    name: &str,
    account_type: AccountType,
    account_subtype: AccountSubtype,
) -> NewAccount {
    NewAccount {
        id: None,
        account_number: number.to_string(),
        name: name.to_string(),
        account_type,
        account_subtype,
        description: None,
        parent_account_id: None,
        opening_balance: None,
        is_active: true,
    }
}

pub fn debit_line(account_id: &str, amount: Decimal) -> NewJournalLine {
    NewJournalLine {
        account_id: account_id.to_string(),
        debit_amount: amount,
        credit_amount: Decimal::ZERO,
        description: None,
    }
}

pub fn credit_line(account_id: &str, amount: Decimal) -> NewJournalLine {
    NewJournalLine {
        account_id: account_id.to_string(),
        debit_amount: Decimal::ZERO,
        credit_amount: amount,
        description: None,
    }
}

pub fn draft_entry(number: &str, date: NaiveDate, lines: Vec<NewJournalLine>) -> NewJournalEntry {
    NewJournalEntry {
        id: None,
        entry_number: number.to_string(),
        entry_date: date,
        description: format!("Test entry {}", number),
        property_id: None,
        lines,
    }
}

pub fn entry_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
}
