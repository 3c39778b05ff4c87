//! Tests for the pure entry validator, including the balance-law property.

#[cfg(test)]
mod tests {
    use crate::accounts::{Account, AccountSubtype, AccountType};
    use crate::journal::{validate_lines, JournalError, NewJournalLine};
    use chrono::NaiveDateTime;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn test_account(id: &str, account_type: AccountType, is_active: bool) -> Account {
        Account {
            id: id.to_string(),
            account_number: format!("n-{}", id),
            name: format!("Account {}", id),
            account_type,
            account_subtype: match account_type {
                AccountType::Asset => AccountSubtype::Cash,
                AccountType::Liability => AccountSubtype::AccountsPayable,
                AccountType::Equity => AccountSubtype::Equity,
                AccountType::Revenue => AccountSubtype::OperatingIncome,
                AccountType::Expense => AccountSubtype::OperatingExpense,
            },
            description: None,
            parent_account_id: None,
            opening_balance: Decimal::ZERO,
            balance: Decimal::ZERO,
            is_active,
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }

    fn registry(accounts: Vec<Account>) -> HashMap<String, Account> {
        accounts.into_iter().map(|a| (a.id.clone(), a)).collect()
    }

    fn lookup(
        registry: &HashMap<String, Account>,
    ) -> impl FnMut(&str) -> crate::journal::Result<Option<Account>> + '_ {
        move |id| Ok(registry.get(id).cloned())
    }

    fn debit(account_id: &str, amount: Decimal) -> NewJournalLine {
        NewJournalLine {
            account_id: account_id.to_string(),
            debit_amount: amount,
            credit_amount: Decimal::ZERO,
            description: None,
        }
    }

    fn credit(account_id: &str, amount: Decimal) -> NewJournalLine {
        NewJournalLine {
            account_id: account_id.to_string(),
            debit_amount: Decimal::ZERO,
            credit_amount: amount,
            description: None,
        }
    }

    // ==================== Rejection Matrix ====================

    #[test]
    fn test_empty_entry_rejected() {
        let reg = registry(vec![]);
        let result = validate_lines(&[], lookup(&reg));
        assert!(matches!(result, Err(JournalError::EmptyEntry)));
    }

    #[test]
    fn test_line_with_both_sides_rejected() {
        let reg = registry(vec![test_account("cash", AccountType::Asset, true)]);
        let line = NewJournalLine {
            account_id: "cash".to_string(),
            debit_amount: dec!(100),
            credit_amount: dec!(100),
            description: None,
        };
        let result = validate_lines(&[line], lookup(&reg));
        assert!(matches!(
            result,
            Err(JournalError::UnbalancedLine { line_index: 0, .. })
        ));
    }

    #[test]
    fn test_line_with_neither_side_rejected() {
        let reg = registry(vec![test_account("cash", AccountType::Asset, true)]);
        let lines = vec![
            debit("cash", dec!(100)),
            NewJournalLine {
                account_id: "cash".to_string(),
                debit_amount: Decimal::ZERO,
                credit_amount: Decimal::ZERO,
                description: None,
            },
        ];
        let result = validate_lines(&lines, lookup(&reg));
        assert!(matches!(
            result,
            Err(JournalError::UnbalancedLine { line_index: 1, .. })
        ));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let reg = registry(vec![test_account("cash", AccountType::Asset, true)]);
        let lines = vec![debit("cash", dec!(-100)), credit("cash", dec!(-100))];
        let result = validate_lines(&lines, lookup(&reg));
        assert!(matches!(result, Err(JournalError::UnbalancedLine { .. })));
    }

    #[test]
    fn test_unknown_account_rejected() {
        let reg = registry(vec![test_account("cash", AccountType::Asset, true)]);
        let lines = vec![debit("cash", dec!(100)), credit("ghost", dec!(100))];
        let result = validate_lines(&lines, lookup(&reg));
        assert!(matches!(result, Err(JournalError::UnknownAccount(id)) if id == "ghost"));
    }

    #[test]
    fn test_inactive_account_rejected() {
        let reg = registry(vec![
            test_account("cash", AccountType::Asset, true),
            test_account("old", AccountType::Revenue, false),
        ]);
        let lines = vec![debit("cash", dec!(100)), credit("old", dec!(100))];
        let result = validate_lines(&lines, lookup(&reg));
        assert!(matches!(result, Err(JournalError::InactiveAccount(_))));
    }

    #[test]
    fn test_imbalance_rejected_with_exact_totals() {
        let reg = registry(vec![
            test_account("cash", AccountType::Asset, true),
            test_account("rent", AccountType::Revenue, true),
        ]);
        let lines = vec![debit("cash", dec!(500.00)), credit("rent", dec!(450.00))];
        match validate_lines(&lines, lookup(&reg)) {
            Err(JournalError::Imbalance {
                total_debit,
                total_credit,
            }) => {
                assert_eq!(total_debit, dec!(500.00));
                assert_eq!(total_credit, dec!(450.00));
            }
            other => panic!("expected Imbalance, got {:?}", other),
        }
    }

    #[test]
    fn test_no_epsilon_tolerance() {
        let reg = registry(vec![
            test_account("cash", AccountType::Asset, true),
            test_account("rent", AccountType::Revenue, true),
        ]);
        // one hundredth of a cent off must still be rejected
        let lines = vec![debit("cash", dec!(100.0001)), credit("rent", dec!(100.00))];
        assert!(matches!(
            validate_lines(&lines, lookup(&reg)),
            Err(JournalError::Imbalance { .. })
        ));
    }

    #[test]
    fn test_balanced_entry_accepted_with_totals() {
        let reg = registry(vec![
            test_account("cash", AccountType::Asset, true),
            test_account("rent", AccountType::Revenue, true),
            test_account("fees", AccountType::Revenue, true),
        ]);
        let lines = vec![
            debit("cash", dec!(1200.00)),
            credit("rent", dec!(1100.00)),
            credit("fees", dec!(100.00)),
        ];
        let totals = validate_lines(&lines, lookup(&reg)).unwrap();
        assert_eq!(totals.total_debit, dec!(1200.00));
        assert_eq!(totals.total_credit, dec!(1200.00));
    }

    // ==================== Balance Law Property ====================

    proptest! {
        /// Entries built from matched debit/credit pairs always validate.
        #[test]
        fn prop_balanced_entries_validate(amounts in prop::collection::vec(1i64..1_000_000, 1..20)) {
            let reg = registry(vec![
                test_account("cash", AccountType::Asset, true),
                test_account("rent", AccountType::Revenue, true),
            ]);
            let mut lines = Vec::new();
            for cents in &amounts {
                let amount = Decimal::new(*cents, 2);
                lines.push(debit("cash", amount));
                lines.push(credit("rent", amount));
            }
            let totals = validate_lines(&lines, lookup(&reg)).unwrap();
            prop_assert_eq!(totals.total_debit, totals.total_credit);
        }

        /// Shifting any single line's amount breaks the entry.
        #[test]
        fn prop_skewed_entries_rejected(
            amounts in prop::collection::vec(1i64..1_000_000, 1..20),
            skew in 1i64..10_000,
        ) {
            let reg = registry(vec![
                test_account("cash", AccountType::Asset, true),
                test_account("rent", AccountType::Revenue, true),
            ]);
            let mut lines = Vec::new();
            for cents in &amounts {
                let amount = Decimal::new(*cents, 2);
                lines.push(debit("cash", amount));
                lines.push(credit("rent", amount));
            }
            lines.push(debit("cash", Decimal::new(skew, 2)));
            let result = validate_lines(&lines, lookup(&reg));
            let rejected = matches!(&result, Err(JournalError::Imbalance { .. }));
            prop_assert!(rejected, "expected Imbalance, got {:?}", result);
        }
    }
}
