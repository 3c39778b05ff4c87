use chrono::NaiveDate;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::warn;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use super::reports_model::{BalanceMismatch, NetIncomeReport, TrialBalance, TrialBalanceRow};
use super::reports_repository::{Movement, ReportRepository};
use super::reports_traits::ReportServiceTrait;
use crate::accounts::{AccountFilter, AccountRepository, AccountRepositoryTrait, AccountType};
use crate::errors::Result;

/// Read-side projector. Reconstructs balances from the movement log
/// instead of reading the materialized `balance` column, so its output
/// doubles as a consistency check on the posting path.
pub struct ReportService {
    account_repository: AccountRepository,
    repository: ReportRepository,
}

impl ReportService {
    /// Creates a new ReportService instance
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self {
            account_repository: AccountRepository::new(pool.clone()),
            repository: ReportRepository::new(pool),
        }
    }

    /// Net debit/credit totals per account id.
    fn totals_by_account(movements: &[Movement]) -> HashMap<String, (Decimal, Decimal)> {
        let mut totals: HashMap<String, (Decimal, Decimal)> = HashMap::new();
        for movement in movements {
            let entry = totals
                .entry(movement.account_id.clone())
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            entry.0 += movement.debit_amount;
            entry.1 += movement.credit_amount;
        }
        totals
    }
}

impl ReportServiceTrait for ReportService {
    /// Opening balance plus the signed sum of booked movements dated on
    /// or before `as_of`. Voided entries count alongside their reversals,
    /// so the result matches the account's live `balance` when `as_of` is
    /// today or later.
    fn account_balance_as_of(&self, account_id: &str, as_of: NaiveDate) -> Result<Decimal> {
        let account = self.account_repository.get_by_id(account_id)?;
        let movements = self.repository.movements_for_account(account_id, as_of)?;
        let moved: Decimal = movements
            .iter()
            .map(|m| {
                account
                    .account_type
                    .signed_delta(m.debit_amount, m.credit_amount)
            })
            .sum();
        Ok(account.opening_balance + moved)
    }

    /// Projected balance of every active account as of a date, split into
    /// debit and credit columns by each account's normal side.
    fn trial_balance(&self, as_of: NaiveDate) -> Result<TrialBalance> {
        let filter = AccountFilter {
            active_only: true,
            ..Default::default()
        };
        let accounts = self.account_repository.list(&filter)?;
        let movements = self.repository.movements_as_of(as_of)?;
        let totals = Self::totals_by_account(&movements);

        let mut rows = Vec::with_capacity(accounts.len());
        let mut total_debit = Decimal::ZERO;
        let mut total_credit = Decimal::ZERO;

        for account in accounts {
            let (debit, credit) = totals
                .get(&account.id)
                .copied()
                .unwrap_or((Decimal::ZERO, Decimal::ZERO));
            let projected =
                account.opening_balance + account.account_type.signed_delta(debit, credit);

            // A negative balance flips to the opposite column so the
            // column totals stay comparable.
            let (debit_balance, credit_balance) =
                match (account.account_type.is_debit_normal(), projected.is_sign_negative()) {
                    (true, false) => (projected, Decimal::ZERO),
                    (true, true) => (Decimal::ZERO, -projected),
                    (false, false) => (Decimal::ZERO, projected),
                    (false, true) => (-projected, Decimal::ZERO),
                };

            total_debit += debit_balance;
            total_credit += credit_balance;
            rows.push(TrialBalanceRow {
                account_id: account.id,
                account_number: account.account_number,
                name: account.name,
                account_type: account.account_type,
                debit_balance,
                credit_balance,
            });
        }

        let report = TrialBalance {
            as_of,
            rows,
            total_debit,
            total_credit,
        };
        if !report.is_balanced() {
            warn!(
                "Trial balance as of {} does not balance: debit {} vs credit {}",
                as_of, report.total_debit, report.total_credit
            );
        }
        Ok(report)
    }

    /// Revenue movements minus expense movements over `from..=to`.
    /// A range with no posted entries yields zero totals.
    fn net_income(&self, from: NaiveDate, to: NaiveDate) -> Result<NetIncomeReport> {
        let movements = self.repository.typed_movements_in_range(from, to)?;

        let mut total_revenue = Decimal::ZERO;
        let mut total_expense = Decimal::ZERO;
        for movement in movements {
            match AccountType::from_str(&movement.account_type) {
                Some(AccountType::Revenue) => {
                    total_revenue += AccountType::Revenue
                        .signed_delta(movement.debit_amount, movement.credit_amount);
                }
                Some(AccountType::Expense) => {
                    total_expense += AccountType::Expense
                        .signed_delta(movement.debit_amount, movement.credit_amount);
                }
                _ => {}
            }
        }

        Ok(NetIncomeReport {
            from,
            to,
            total_revenue,
            total_expense,
            net_income: total_revenue - total_expense,
        })
    }

    /// Cross-checks every account's materialized balance against a full
    /// reconstruction from the movement log. Inactive accounts are
    /// included; their history still has to reconcile.
    fn verify_balances(&self) -> Result<Vec<BalanceMismatch>> {
        let accounts = self.account_repository.list(&AccountFilter::default())?;
        let movements = self.repository.all_movements()?;
        let totals = Self::totals_by_account(&movements);

        let mut mismatches = Vec::new();
        for account in accounts {
            let (debit, credit) = totals
                .get(&account.id)
                .copied()
                .unwrap_or((Decimal::ZERO, Decimal::ZERO));
            let reconstructed =
                account.opening_balance + account.account_type.signed_delta(debit, credit);
            if reconstructed != account.balance {
                warn!(
                    "Balance mismatch on account {}: stored {} vs reconstructed {}",
                    account.account_number, account.balance, reconstructed
                );
                mismatches.push(BalanceMismatch {
                    account_id: account.id,
                    account_number: account.account_number,
                    materialized: account.balance,
                    reconstructed,
                });
            }
        }
        Ok(mismatches)
    }
}
