use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::DatabaseErrorKind;
use diesel::sqlite::SqliteConnection;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::accounts::{AccountError, Result};
use crate::db::get_connection;
use crate::schema::{accounts, journal_lines};

use super::accounts_model::{Account, AccountDB, AccountFilter, AccountUpdate, NewAccount};
use super::accounts_traits::AccountRepositoryTrait;

/// Repository for managing account data in the database
pub struct AccountRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl AccountRepository {
    /// Creates a new AccountRepository instance
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    /// Retrieves an account by ID on an existing connection. Used by the
    /// posting state machine inside its write transaction.
    pub fn get_by_id_in_transaction(
        conn: &mut SqliteConnection,
        account_id: &str,
    ) -> Result<Account> {
        accounts::table
            .find(account_id)
            .first::<AccountDB>(conn)
            .map(Account::from)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    AccountError::NotFound(format!("Account with id {} not found", account_id))
                }
                _ => AccountError::DatabaseError(e.to_string()),
            })
    }

    /// Writes a new materialized balance. Only the posting state machine
    /// calls this, always inside the same transaction that read the balance.
    pub fn update_balance_in_transaction(
        conn: &mut SqliteConnection,
        account_id: &str,
        new_balance: &Decimal,
    ) -> Result<()> {
        let affected = diesel::update(accounts::table.find(account_id))
            .set((
                accounts::balance.eq(new_balance.to_string()),
                accounts::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(conn)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        if affected == 0 {
            return Err(AccountError::NotFound(format!(
                "Account with id {} not found",
                account_id
            )));
        }
        Ok(())
    }

    fn is_referenced_in_transaction(
        conn: &mut SqliteConnection,
        account_id: &str,
    ) -> Result<bool> {
        let count: i64 = journal_lines::table
            .filter(journal_lines::account_id.eq(account_id))
            .count()
            .get_result(conn)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;
        Ok(count > 0)
    }
}

impl AccountRepositoryTrait for AccountRepository {
    /// Creates a new account in the database
    fn create(&self, new_account: NewAccount) -> Result<Account> {
        new_account.validate()?;

        let mut account_db: AccountDB = new_account.into();
        if account_db.id.is_empty() {
            account_db.id = uuid::Uuid::new_v4().to_string();
        }

        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        diesel::insert_into(accounts::table)
            .values(&account_db)
            .execute(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    AccountError::Validation(format!(
                        "Account number '{}' is already in use",
                        account_db.account_number
                    ))
                }
                other => AccountError::DatabaseError(other.to_string()),
            })?;

        Ok(account_db.into())
    }

    /// Updates an existing account in the database.
    ///
    /// The caller (service layer) is responsible for the reference checks
    /// that guard type reclassification; this method applies the patch.
    fn update(&self, account_update: AccountUpdate) -> Result<Account> {
        account_update.validate()?;

        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        let update_id = account_update.id.clone().unwrap_or_default();
        let mut account_db = accounts::table
            .find(&update_id)
            .first::<AccountDB>(&mut conn)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    AccountError::NotFound(format!("Account with id {} not found", update_id))
                }
                _ => AccountError::DatabaseError(e.to_string()),
            })?;

        account_db.name = account_update.name;
        if let Some(new_type) = account_update.account_type {
            account_db.account_type = new_type.as_str().to_string();
        }
        account_db.account_subtype = account_update.account_subtype.as_str().to_string();
        account_db.description = account_update.description;
        account_db.parent_account_id = account_update.parent_account_id;
        account_db.is_active = account_update.is_active;
        account_db.updated_at = chrono::Utc::now().naive_utc();

        diesel::update(accounts::table.find(&account_db.id))
            .set(&account_db)
            .execute(&mut conn)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(account_db.into())
    }

    /// Retrieves an account by its ID
    fn get_by_id(&self, account_id: &str) -> Result<Account> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Self::get_by_id_in_transaction(&mut conn, account_id)
    }

    /// Retrieves an account by its account number
    fn get_by_number(&self, number: &str) -> Result<Account> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        accounts::table
            .filter(accounts::account_number.eq(number))
            .first::<AccountDB>(&mut conn)
            .map(Account::from)
            .map_err(|e| match e {
                diesel::result::Error::NotFound => {
                    AccountError::NotFound(format!("Account with number {} not found", number))
                }
                _ => AccountError::DatabaseError(e.to_string()),
            })
    }

    /// Lists accounts, filtered by type, subtype and active status
    fn list(&self, filter: &AccountFilter) -> Result<Vec<Account>> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        let mut query = accounts::table.into_boxed();

        if let Some(account_type) = filter.account_type {
            query = query.filter(accounts::account_type.eq(account_type.as_str()));
        }
        if let Some(subtype) = filter.account_subtype {
            query = query.filter(accounts::account_subtype.eq(subtype.as_str()));
        }
        if filter.active_only {
            query = query.filter(accounts::is_active.eq(true));
        }

        query
            .order(accounts::account_number.asc())
            .load::<AccountDB>(&mut conn)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))
            .map(|results| results.into_iter().map(Account::from).collect())
    }

    /// Deletes an account. Only succeeds for accounts that no journal line
    /// references; referenced accounts must be deactivated instead.
    fn delete(&self, account_id: &str) -> Result<usize> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        if Self::is_referenced_in_transaction(&mut conn, account_id)? {
            return Err(AccountError::Conflict(format!(
                "Account {} is referenced by journal entries and can only be deactivated",
                account_id
            )));
        }

        let affected = diesel::delete(accounts::table.find(account_id))
            .execute(&mut conn)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        if affected == 0 {
            return Err(AccountError::NotFound(format!(
                "Account with id {} not found",
                account_id
            )));
        }

        Ok(affected)
    }

    /// Flips the soft-disable flag
    fn set_active(&self, account_id: &str, active: bool) -> Result<Account> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        diesel::update(accounts::table.find(account_id))
            .set((
                accounts::is_active.eq(active),
                accounts::updated_at.eq(chrono::Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Self::get_by_id_in_transaction(&mut conn, account_id)
    }

    /// True when any journal line references the account
    fn is_referenced(&self, account_id: &str) -> Result<bool> {
        let mut conn = get_connection(&self.pool)
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;
        Self::is_referenced_in_transaction(&mut conn, account_id)
    }
}
