use log::{debug, error, info};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use diesel::connection::{Connection, SimpleConnection};
use diesel::r2d2;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::DatabaseErrorKind;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use crate::errors::{DatabaseError, Error, Result};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Attempts made on a write transaction before a lock conflict is surfaced.
const WRITE_RETRY_ATTEMPTS: u32 = 3;
const WRITE_RETRY_BACKOFF_MS: u64 = 50;

pub type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

pub fn init(app_data_dir: &str) -> Result<String> {
    let db_path = get_db_path(app_data_dir);

    // Ensure directory exists
    let db_dir = Path::new(&db_path).parent().unwrap();
    if !db_dir.exists() {
        fs::create_dir_all(db_dir)?;
    }

    {
        let mut conn = SqliteConnection::establish(&db_path)
            .map_err(DatabaseError::ConnectionFailed)?;
        conn.batch_execute(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 30000;
            PRAGMA synchronous  = NORMAL;
        ",
        )
        .map_err(DatabaseError::QueryFailed)?;
    }

    Ok(db_path)
}

pub fn create_pool(db_path: &str) -> Result<Arc<DbPool>> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    let pool = r2d2::Pool::builder()
        .max_size(8)
        .min_idle(Some(1)) // Keep at least one connection ready
        .connection_timeout(Duration::from_secs(30))
        .connection_customizer(Box::new(ConnectionCustomizer {}))
        .build(manager)
        .map_err(DatabaseError::PoolCreationFailed)?;
    Ok(Arc::new(pool))
}

pub fn run_migrations(pool: &DbPool) -> Result<()> {
    info!("Running database migrations");
    let mut connection = get_connection(pool)?;

    let result = connection.run_pending_migrations(MIGRATIONS).map_err(|e| {
        error!("Database migration failed: {}", e);
        Error::Database(DatabaseError::MigrationFailed(e.to_string()))
    })?;

    if result.is_empty() {
        info!("No pending migrations to apply.");
    } else {
        info!("Applied the following migrations:");
        for migration_version in &result {
            info!("  - {}", migration_version);
        }
    }

    Ok(())
}

pub fn get_db_path(app_data_dir: &str) -> String {
    // Try to get the database URL from the environment variable
    std::env::var("DATABASE_URL").unwrap_or_else(|_| {
        Path::new(app_data_dir)
            .join("ledger.db")
            .to_str()
            .unwrap()
            .to_string()
    })
}

/// Gets a connection from the pool
pub fn get_connection(pool: &Pool<ConnectionManager<SqliteConnection>>) -> Result<DbConnection> {
    Ok(pool.get()?)
}

#[derive(Debug)]
struct ConnectionCustomizer;

impl r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionCustomizer {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        use diesel::RunQueryDsl;

        diesel::sql_query(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 30000;
            PRAGMA synchronous = NORMAL;
        ",
        )
        .execute(conn)
        .map_err(diesel::r2d2::Error::QueryError)?;

        Ok(())
    }
}

/// Trait for executing database transactions
pub trait DbTransactionExecutor {
    /// Execute operations within a deferred transaction and return the result
    fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T>;

    /// Execute operations within an immediate (write-locking) transaction.
    ///
    /// The closure may run more than once: transient lock contention is
    /// retried a bounded number of times before the error is surfaced.
    fn execute_immediate<F, T>(&self, f: F) -> Result<T>
    where
        F: FnMut(&mut SqliteConnection) -> Result<T>;
}

impl DbTransactionExecutor for DbPool {
    fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T>,
    {
        let mut conn = self.get()?;
        conn.transaction(|tx_conn| f(tx_conn))
    }

    fn execute_immediate<F, T>(&self, mut f: F) -> Result<T>
    where
        F: FnMut(&mut SqliteConnection) -> Result<T>,
    {
        let mut conn = self.get()?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            match conn.immediate_transaction(|tx_conn| f(tx_conn)) {
                Err(ref e) if is_lock_contention(e) && attempt < WRITE_RETRY_ATTEMPTS => {
                    debug!(
                        "Write transaction hit lock contention (attempt {}), retrying",
                        attempt
                    );
                    std::thread::sleep(Duration::from_millis(WRITE_RETRY_BACKOFF_MS * attempt as u64));
                }
                other => return other,
            }
        }
    }
}

impl DbTransactionExecutor for Arc<DbPool> {
    fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T>,
    {
        (**self).execute(f)
    }

    fn execute_immediate<F, T>(&self, f: F) -> Result<T>
    where
        F: FnMut(&mut SqliteConnection) -> Result<T>,
    {
        (**self).execute_immediate(f)
    }
}

/// True when the error is SQLite lock contention that is safe to retry.
///
/// The repositories stringify diesel errors into their module error
/// variants, so contention raised mid-transaction arrives here as a
/// message rather than a typed diesel error. Both shapes are matched.
pub fn is_lock_contention(err: &Error) -> bool {
    match err {
        Error::Database(DatabaseError::QueryFailed(diesel::result::Error::DatabaseError(
            kind,
            info,
        ))) => matches!(kind, DatabaseErrorKind::Unknown) && is_locked_message(info.message()),
        Error::Journal(crate::journal::JournalError::DatabaseError(msg)) => {
            is_locked_message(msg)
        }
        Error::Account(crate::accounts::AccountError::DatabaseError(msg)) => {
            is_locked_message(msg)
        }
        _ => false,
    }
}

fn is_locked_message(msg: &str) -> bool {
    msg.contains("database is locked") || msg.contains("database table is locked")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::AccountError;
    use crate::journal::JournalError;

    #[test]
    fn test_lock_contention_detected_in_stringified_errors() {
        let journal = Error::Journal(JournalError::DatabaseError(
            "database is locked".to_string(),
        ));
        assert!(is_lock_contention(&journal));

        let account = Error::Account(AccountError::DatabaseError(
            "database table is locked".to_string(),
        ));
        assert!(is_lock_contention(&account));
    }

    #[test]
    fn test_other_database_errors_are_not_retried() {
        let err = Error::Journal(JournalError::DatabaseError(
            "UNIQUE constraint failed: journal_entries.entry_number".to_string(),
        ));
        assert!(!is_lock_contention(&err));

        let not_found = Error::Journal(JournalError::NotFound("gone".to_string()));
        assert!(!is_lock_contention(&not_found));
    }
}
