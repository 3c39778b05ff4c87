use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::reports_model::{BalanceMismatch, NetIncomeReport, TrialBalance};
use crate::errors::Result;

/// Trait defining the contract for read-side reporting operations.
pub trait ReportServiceTrait: Send + Sync {
    fn account_balance_as_of(&self, account_id: &str, as_of: NaiveDate) -> Result<Decimal>;
    fn trial_balance(&self, as_of: NaiveDate) -> Result<TrialBalance>;
    fn net_income(&self, from: NaiveDate, to: NaiveDate) -> Result<NetIncomeReport>;
    fn verify_balances(&self) -> Result<Vec<BalanceMismatch>>;
}
