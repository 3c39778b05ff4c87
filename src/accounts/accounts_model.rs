use chrono::NaiveDateTime;
use diesel::prelude::*;
use log::error;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::accounts_constants::allowed_subtypes;
use super::accounts_errors::{AccountError, Result};
use crate::utils::parse_stored_decimal;

/// Account classification. Determines the normal balance side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "asset",
            AccountType::Liability => "liability",
            AccountType::Equity => "equity",
            AccountType::Revenue => "revenue",
            AccountType::Expense => "expense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "asset" => Some(AccountType::Asset),
            "liability" => Some(AccountType::Liability),
            "equity" => Some(AccountType::Equity),
            "revenue" => Some(AccountType::Revenue),
            "expense" => Some(AccountType::Expense),
            _ => None,
        }
    }

    /// True when the account's balance increases on the debit side.
    pub fn is_debit_normal(&self) -> bool {
        matches!(self, AccountType::Asset | AccountType::Expense)
    }

    /// Signed balance movement of a line against an account of this type.
    ///
    /// Assets and expenses increase on debit; liabilities, equity and
    /// revenue increase on credit. Every balance mutation in the crate goes
    /// through this one function.
    pub fn signed_delta(&self, debit: Decimal, credit: Decimal) -> Decimal {
        if self.is_debit_normal() {
            debit - credit
        } else {
            credit - debit
        }
    }
}

/// Closed set of subtype refinements. Each is valid under exactly one
/// account type (see `accounts_constants::allowed_subtypes`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountSubtype {
    Cash,
    AccountsReceivable,
    FixedAsset,
    OtherAsset,
    AccountsPayable,
    CreditCard,
    SecurityDeposits,
    OtherLiability,
    Equity,
    RetainedEarnings,
    OwnerContribution,
    OperatingIncome,
    OtherIncome,
    OperatingExpense,
    OtherExpense,
}

impl AccountSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountSubtype::Cash => "cash",
            AccountSubtype::AccountsReceivable => "accounts_receivable",
            AccountSubtype::FixedAsset => "fixed_asset",
            AccountSubtype::OtherAsset => "other_asset",
            AccountSubtype::AccountsPayable => "accounts_payable",
            AccountSubtype::CreditCard => "credit_card",
            AccountSubtype::SecurityDeposits => "security_deposits",
            AccountSubtype::OtherLiability => "other_liability",
            AccountSubtype::Equity => "equity",
            AccountSubtype::RetainedEarnings => "retained_earnings",
            AccountSubtype::OwnerContribution => "owner_contribution",
            AccountSubtype::OperatingIncome => "operating_income",
            AccountSubtype::OtherIncome => "other_income",
            AccountSubtype::OperatingExpense => "operating_expense",
            AccountSubtype::OtherExpense => "other_expense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(AccountSubtype::Cash),
            "accounts_receivable" => Some(AccountSubtype::AccountsReceivable),
            "fixed_asset" => Some(AccountSubtype::FixedAsset),
            "other_asset" => Some(AccountSubtype::OtherAsset),
            "accounts_payable" => Some(AccountSubtype::AccountsPayable),
            "credit_card" => Some(AccountSubtype::CreditCard),
            "security_deposits" => Some(AccountSubtype::SecurityDeposits),
            "other_liability" => Some(AccountSubtype::OtherLiability),
            "equity" => Some(AccountSubtype::Equity),
            "retained_earnings" => Some(AccountSubtype::RetainedEarnings),
            "owner_contribution" => Some(AccountSubtype::OwnerContribution),
            "operating_income" => Some(AccountSubtype::OperatingIncome),
            "other_income" => Some(AccountSubtype::OtherIncome),
            "operating_expense" => Some(AccountSubtype::OperatingExpense),
            "other_expense" => Some(AccountSubtype::OtherExpense),
            _ => None,
        }
    }

    /// True when this subtype is allowed under the given account type.
    pub fn is_valid_for(&self, account_type: AccountType) -> bool {
        allowed_subtypes(account_type).contains(self)
    }
}

/// Domain model representing a ledger account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub account_number: String,
    pub name: String,
    pub account_type: AccountType,
    pub account_subtype: AccountSubtype,
    pub description: Option<String>,
    pub parent_account_id: Option<String>,
    pub opening_balance: Decimal,
    pub balance: Decimal,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Input model for creating a new account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub account_number: String,
    pub name: String,
    pub account_type: AccountType,
    pub account_subtype: AccountSubtype,
    pub description: Option<String>,
    pub parent_account_id: Option<String>,
    /// Opening balance; recorded as an audited balance adjustment.
    pub opening_balance: Option<Decimal>,
    pub is_active: bool,
}

impl NewAccount {
    /// Validates the new account data
    pub fn validate(&self) -> Result<()> {
        if self.account_number.trim().is_empty() {
            return Err(AccountError::Validation(
                "Account number cannot be empty".to_string(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(AccountError::Validation(
                "Account name cannot be empty".to_string(),
            ));
        }
        if !self.account_subtype.is_valid_for(self.account_type) {
            return Err(AccountError::Validation(format!(
                "Subtype '{}' is not valid for account type '{}'",
                self.account_subtype.as_str(),
                self.account_type.as_str()
            )));
        }
        Ok(())
    }
}

/// Input model for updating an existing account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdate {
    pub id: Option<String>,
    pub name: String,
    /// None leaves the type unchanged. Changing the type of an account
    /// already referenced by journal lines is rejected.
    pub account_type: Option<AccountType>,
    pub account_subtype: AccountSubtype,
    pub description: Option<String>,
    pub parent_account_id: Option<String>,
    pub is_active: bool,
}

impl AccountUpdate {
    /// Validates the account update data
    pub fn validate(&self) -> Result<()> {
        if self.id.is_none() {
            return Err(AccountError::Validation(
                "Account ID is required for updates".to_string(),
            ));
        }
        if self.name.trim().is_empty() {
            return Err(AccountError::Validation(
                "Account name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read filter for `list_accounts`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountFilter {
    pub account_type: Option<AccountType>,
    pub account_subtype: Option<AccountSubtype>,
    pub active_only: bool,
}

/// Database model for accounts
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
#[diesel(table_name = crate::schema::accounts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccountDB {
    pub id: String,
    pub account_number: String,
    pub name: String,
    pub account_type: String,
    pub account_subtype: String,
    pub description: Option<String>,
    pub parent_account_id: Option<String>,
    pub opening_balance: String,
    pub balance: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

fn parse_stored_account_type(s: &str) -> AccountType {
    AccountType::from_str(s).unwrap_or_else(|| {
        error!("Unknown stored account type '{}', treating as asset", s);
        AccountType::Asset
    })
}

fn parse_stored_account_subtype(s: &str) -> AccountSubtype {
    AccountSubtype::from_str(s).unwrap_or_else(|| {
        error!("Unknown stored account subtype '{}', treating as other_asset", s);
        AccountSubtype::OtherAsset
    })
}

// Conversion implementations
impl From<AccountDB> for Account {
    fn from(db: AccountDB) -> Self {
        Self {
            id: db.id,
            account_number: db.account_number,
            name: db.name,
            account_type: parse_stored_account_type(&db.account_type),
            account_subtype: parse_stored_account_subtype(&db.account_subtype),
            description: db.description,
            parent_account_id: db.parent_account_id,
            opening_balance: parse_stored_decimal(&db.opening_balance, "opening_balance"),
            balance: parse_stored_decimal(&db.balance, "balance"),
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<NewAccount> for AccountDB {
    fn from(domain: NewAccount) -> Self {
        let now = chrono::Utc::now().naive_utc();
        let opening = domain.opening_balance.unwrap_or(Decimal::ZERO);
        Self {
            id: domain.id.unwrap_or_default(),
            account_number: domain.account_number,
            name: domain.name,
            account_type: domain.account_type.as_str().to_string(),
            account_subtype: domain.account_subtype.as_str().to_string(),
            description: domain.description,
            parent_account_id: domain.parent_account_id,
            opening_balance: opening.to_string(),
            balance: opening.to_string(),
            is_active: domain.is_active,
            created_at: now,
            updated_at: now,
        }
    }
}
