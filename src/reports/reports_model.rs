use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::accounts::AccountType;

/// One account's line in a trial balance. The projected balance is shown
/// in the column of its sign: a debit-normal account with a positive
/// balance lands in the debit column, a negative one in the credit column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalanceRow {
    pub account_id: String,
    pub account_number: String,
    pub name: String,
    pub account_type: AccountType,
    pub debit_balance: Decimal,
    pub credit_balance: Decimal,
}

/// Trial balance as of a date, reconstructed from posted movements.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialBalance {
    pub as_of: NaiveDate,
    pub rows: Vec<TrialBalanceRow>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
}

impl TrialBalance {
    /// The fundamental accounting identity.
    pub fn is_balanced(&self) -> bool {
        self.total_debit == self.total_credit
    }
}

/// Revenue minus expense movements over a date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetIncomeReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total_revenue: Decimal,
    pub total_expense: Decimal,
    pub net_income: Decimal,
}

/// A materialized balance that disagrees with its reconstruction from the
/// movement log. An empty mismatch list is the expected outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceMismatch {
    pub account_id: String,
    pub account_number: String,
    pub materialized: Decimal,
    pub reconstructed: Decimal,
}
