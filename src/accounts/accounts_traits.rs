use super::accounts_model::{Account, AccountFilter, AccountUpdate, NewAccount};
use crate::accounts::Result;

/// Trait defining the contract for Account repository operations.
pub trait AccountRepositoryTrait: Send + Sync {
    fn create(&self, new_account: NewAccount) -> Result<Account>;
    fn update(&self, account_update: AccountUpdate) -> Result<Account>;
    fn get_by_id(&self, account_id: &str) -> Result<Account>;
    fn get_by_number(&self, number: &str) -> Result<Account>;
    fn list(&self, filter: &AccountFilter) -> Result<Vec<Account>>;
    fn delete(&self, account_id: &str) -> Result<usize>;
    fn set_active(&self, account_id: &str, active: bool) -> Result<Account>;
    fn is_referenced(&self, account_id: &str) -> Result<bool>;
}

/// Trait defining the contract for Account service operations.
pub trait AccountServiceTrait: Send + Sync {
    fn create_account(&self, new_account: NewAccount, actor: &str) -> Result<Account>;
    fn update_account(&self, account_update: AccountUpdate, actor: &str) -> Result<Account>;
    fn get_account(&self, account_id: &str) -> Result<Account>;
    fn get_account_by_number(&self, number: &str) -> Result<Account>;
    fn list_accounts(&self, filter: &AccountFilter) -> Result<Vec<Account>>;
    fn get_active_accounts(&self) -> Result<Vec<Account>>;
    fn resolve_parent_chain(&self, account_id: &str) -> Result<Vec<Account>>;
    fn deactivate_account(&self, account_id: &str, actor: &str) -> Result<Account>;
    fn reactivate_account(&self, account_id: &str, actor: &str) -> Result<Account>;
    fn delete_account(&self, account_id: &str, actor: &str) -> Result<()>;
}
