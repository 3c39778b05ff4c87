use rust_decimal::Decimal;

use super::journal_errors::{JournalError, Result};
use super::journal_model::NewJournalLine;
use crate::accounts::Account;

/// Totals computed by a successful validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedTotals {
    pub total_debit: Decimal,
    pub total_credit: Decimal,
}

/// Side-effect-free verification of a candidate entry's lines.
///
/// `find_account` resolves an account id against the registry; it returns
/// `Ok(None)` for unknown ids so the validator can distinguish a missing
/// account from a storage failure. Runs once when a draft is created and
/// again inside the posting transaction, which defends against accounts
/// being deactivated (or lines edited) between drafting and posting.
///
/// Comparisons are exact decimal equality; amounts are never rounded or
/// coerced to make an entry balance.
pub fn validate_lines<F>(lines: &[NewJournalLine], mut find_account: F) -> Result<ValidatedTotals>
where
    F: FnMut(&str) -> Result<Option<Account>>,
{
    if lines.is_empty() {
        return Err(JournalError::EmptyEntry);
    }

    for (line_index, line) in lines.iter().enumerate() {
        if line.debit_amount < Decimal::ZERO || line.credit_amount < Decimal::ZERO {
            return Err(JournalError::UnbalancedLine {
                line_index,
                reason: format!(
                    "amounts must not be negative (debit {}, credit {})",
                    line.debit_amount, line.credit_amount
                ),
            });
        }
        let has_debit = line.debit_amount != Decimal::ZERO;
        let has_credit = line.credit_amount != Decimal::ZERO;
        if has_debit && has_credit {
            return Err(JournalError::UnbalancedLine {
                line_index,
                reason: format!(
                    "a line may carry a debit or a credit, not both (debit {}, credit {})",
                    line.debit_amount, line.credit_amount
                ),
            });
        }
        if !has_debit && !has_credit {
            return Err(JournalError::UnbalancedLine {
                line_index,
                reason: "a line must carry a nonzero debit or credit".to_string(),
            });
        }
    }

    for line in lines {
        match find_account(&line.account_id)? {
            None => return Err(JournalError::UnknownAccount(line.account_id.clone())),
            Some(account) if !account.is_active => {
                return Err(JournalError::InactiveAccount(account.account_number));
            }
            Some(_) => {}
        }
    }

    let total_debit: Decimal = lines.iter().map(|l| l.debit_amount).sum();
    let total_credit: Decimal = lines.iter().map(|l| l.credit_amount).sum();

    if total_debit != total_credit {
        return Err(JournalError::Imbalance {
            total_debit,
            total_credit,
        });
    }

    Ok(ValidatedTotals {
        total_debit,
        total_credit,
    })
}
