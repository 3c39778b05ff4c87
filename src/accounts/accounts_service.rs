use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;

use super::accounts_model::{Account, AccountFilter, AccountUpdate, NewAccount};
use super::accounts_repository::AccountRepository;
use super::accounts_traits::{AccountRepositoryTrait, AccountServiceTrait};
use crate::accounts::{AccountError, Result};
use crate::audit::{AuditRepository, NewAuditRecord};

/// Service for managing the chart of accounts
pub struct AccountService {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl AccountService {
    /// Creates a new AccountService instance
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    /// Rejects a parent assignment that would close a cycle: walking up
    /// from the proposed parent must never reach the account itself.
    fn check_parent_assignment(
        &self,
        repo: &AccountRepository,
        account_id: &str,
        parent_id: &str,
    ) -> Result<()> {
        if parent_id == account_id {
            return Err(AccountError::Cycle(format!(
                "Account {} cannot be its own parent",
                account_id
            )));
        }

        let mut visited: HashSet<String> = HashSet::new();
        let mut current = repo.get_by_id(parent_id)?;
        while let Some(next_parent) = current.parent_account_id.clone() {
            if next_parent == account_id {
                return Err(AccountError::Cycle(format!(
                    "Assigning parent {} to account {} would create a cycle",
                    parent_id, account_id
                )));
            }
            if !visited.insert(next_parent.clone()) {
                return Err(AccountError::Cycle(format!(
                    "Parent chain of account {} already contains a cycle",
                    parent_id
                )));
            }
            current = repo.get_by_id(&next_parent)?;
        }

        Ok(())
    }
}

impl AccountServiceTrait for AccountService {
    /// Creates a new account.
    ///
    /// An opening balance, when supplied, is not a magic value: it is
    /// recorded in the audit log as a balance adjustment with the actor
    /// and timestamp attached.
    fn create_account(&self, new_account: NewAccount, actor: &str) -> Result<Account> {
        debug!(
            "Creating account {} ({})",
            new_account.account_number, new_account.name
        );

        let repo = AccountRepository::new(self.pool.clone());

        if let Some(parent_id) = &new_account.parent_account_id {
            // Parent must exist; a fresh account cannot yet close a cycle
            repo.get_by_id(parent_id)?;
        }

        let opening_balance = new_account.opening_balance.unwrap_or(Decimal::ZERO);
        let account = repo.create(new_account)?;

        let audit = AuditRepository::new(self.pool.clone());
        audit
            .append(NewAuditRecord::account(&account.id, "created", actor, None))
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        if opening_balance != Decimal::ZERO {
            audit
                .append(NewAuditRecord::account(
                    &account.id,
                    "balance_adjustment",
                    actor,
                    Some(format!("opening balance {}", opening_balance)),
                ))
                .map_err(|e| AccountError::DatabaseError(e.to_string()))?;
        }

        Ok(account)
    }

    /// Updates an existing account.
    ///
    /// Reclassifying the account type is rejected once any journal line
    /// references the account, since it would silently change how every
    /// historical movement is reported.
    fn update_account(&self, account_update: AccountUpdate, actor: &str) -> Result<Account> {
        account_update.validate()?;

        let repo = AccountRepository::new(self.pool.clone());
        let account_id = account_update.id.clone().unwrap_or_default();
        let existing = repo.get_by_id(&account_id)?;

        let effective_type = account_update.account_type.unwrap_or(existing.account_type);
        if effective_type != existing.account_type && repo.is_referenced(&account_id)? {
            return Err(AccountError::Conflict(format!(
                "Account {} is referenced by journal entries; its type cannot be changed from '{}' to '{}'",
                existing.account_number,
                existing.account_type.as_str(),
                effective_type.as_str()
            )));
        }

        if !account_update.account_subtype.is_valid_for(effective_type) {
            return Err(AccountError::Validation(format!(
                "Subtype '{}' is not valid for account type '{}'",
                account_update.account_subtype.as_str(),
                effective_type.as_str()
            )));
        }

        if let Some(parent_id) = &account_update.parent_account_id {
            self.check_parent_assignment(&repo, &account_id, parent_id)?;
        }

        let updated = repo.update(account_update)?;

        AuditRepository::new(self.pool.clone())
            .append(NewAuditRecord::account(&updated.id, "updated", actor, None))
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(updated)
    }

    /// Retrieves an account by its ID
    fn get_account(&self, account_id: &str) -> Result<Account> {
        let repo = AccountRepository::new(self.pool.clone());
        repo.get_by_id(account_id)
    }

    /// Retrieves an account by its account number
    fn get_account_by_number(&self, number: &str) -> Result<Account> {
        let repo = AccountRepository::new(self.pool.clone());
        repo.get_by_number(number)
    }

    /// Lists accounts, filtered by type, subtype and active status
    fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>> {
        let repo = AccountRepository::new(self.pool.clone());
        repo.list(filter)
    }

    /// Lists only active accounts
    fn get_active_accounts(&self) -> Result<Vec<Account>> {
        self.list_accounts(&AccountFilter {
            active_only: true,
            ..AccountFilter::default()
        })
    }

    /// Produces the ancestor path of an account, nearest parent first.
    fn resolve_parent_chain(&self, account_id: &str) -> Result<Vec<Account>> {
        let repo = AccountRepository::new(self.pool.clone());
        let mut chain = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(account_id.to_string());

        let mut current = repo.get_by_id(account_id)?;
        while let Some(parent_id) = current.parent_account_id.clone() {
            if !visited.insert(parent_id.clone()) {
                return Err(AccountError::Cycle(format!(
                    "Parent chain of account {} loops back to account {}",
                    account_id, parent_id
                )));
            }
            let parent = repo.get_by_id(&parent_id)?;
            chain.push(parent.clone());
            current = parent;
        }

        Ok(chain)
    }

    /// Soft-disables an account. Referenced accounts are never deleted.
    fn deactivate_account(&self, account_id: &str, actor: &str) -> Result<Account> {
        let repo = AccountRepository::new(self.pool.clone());
        let account = repo.set_active(account_id, false)?;

        AuditRepository::new(self.pool.clone())
            .append(NewAuditRecord::account(account_id, "deactivated", actor, None))
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(account)
    }

    /// Re-enables a previously deactivated account
    fn reactivate_account(&self, account_id: &str, actor: &str) -> Result<Account> {
        let repo = AccountRepository::new(self.pool.clone());
        let account = repo.set_active(account_id, true)?;

        AuditRepository::new(self.pool.clone())
            .append(NewAuditRecord::account(account_id, "reactivated", actor, None))
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(account)
    }

    /// Deletes an account that no journal line references
    fn delete_account(&self, account_id: &str, actor: &str) -> Result<()> {
        let repo = AccountRepository::new(self.pool.clone());
        repo.delete(account_id)?;

        AuditRepository::new(self.pool.clone())
            .append(NewAuditRecord::account(account_id, "deleted", actor, None))
            .map_err(|e| AccountError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
