use super::accounts_model::{AccountSubtype, AccountType};

/// Allowed subtype refinements per account type.
///
/// A subtype is valid under exactly the types listed here; `create_account`
/// and subtype updates are checked against this table.
pub const ASSET_SUBTYPES: &[AccountSubtype] = &[
    AccountSubtype::Cash,
    AccountSubtype::AccountsReceivable,
    AccountSubtype::FixedAsset,
    AccountSubtype::OtherAsset,
];

pub const LIABILITY_SUBTYPES: &[AccountSubtype] = &[
    AccountSubtype::AccountsPayable,
    AccountSubtype::CreditCard,
    AccountSubtype::SecurityDeposits,
    AccountSubtype::OtherLiability,
];

pub const EQUITY_SUBTYPES: &[AccountSubtype] = &[
    AccountSubtype::Equity,
    AccountSubtype::RetainedEarnings,
    AccountSubtype::OwnerContribution,
];

pub const REVENUE_SUBTYPES: &[AccountSubtype] = &[
    AccountSubtype::OperatingIncome,
    AccountSubtype::OtherIncome,
];

pub const EXPENSE_SUBTYPES: &[AccountSubtype] = &[
    AccountSubtype::OperatingExpense,
    AccountSubtype::OtherExpense,
];

/// Returns the allowed subtypes for an account type.
pub fn allowed_subtypes(account_type: AccountType) -> &'static [AccountSubtype] {
    match account_type {
        AccountType::Asset => ASSET_SUBTYPES,
        AccountType::Liability => LIABILITY_SUBTYPES,
        AccountType::Equity => EQUITY_SUBTYPES,
        AccountType::Revenue => REVENUE_SUBTYPES,
        AccountType::Expense => EXPENSE_SUBTYPES,
    }
}
