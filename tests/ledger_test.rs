use std::thread;

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use ledger_core::accounts::{
    AccountError, AccountService, AccountServiceTrait, AccountSubtype, AccountType, AccountUpdate,
};
use ledger_core::journal::{
    EntryStatus, JournalEntryUpdate, JournalError, JournalService, JournalServiceTrait,
};
use ledger_core::posting::{PostingService, PostingServiceTrait};
use ledger_core::reports::{ReportService, ReportServiceTrait};

mod common;

const ACTOR: &str = "test-operator";

/// Creates the two-account fixture used by most scenarios: Cash (asset)
/// and Rent Revenue (revenue).
fn cash_and_rent(db: &common::TestDb) -> (String, String) {
    let accounts = AccountService::new(db.pool.clone());
    let cash = accounts
        .create_account(
            common::new_account("1000", "Cash", AccountType::Asset, AccountSubtype::Cash),
            ACTOR,
        )
        .unwrap();
    let rent = accounts
        .create_account(
            common::new_account(
                "4000",
                "Rent Revenue",
                AccountType::Revenue,
                AccountSubtype::OperatingIncome,
            ),
            ACTOR,
        )
        .unwrap();
    (cash.id, rent.id)
}

#[test]
fn test_post_applies_balances_to_both_sides() {
    let db = common::setup_db();
    let (cash_id, rent_id) = cash_and_rent(&db);
    let journal = JournalService::new(db.pool.clone());
    let posting = PostingService::new(db.pool.clone());
    let accounts = AccountService::new(db.pool.clone());

    let draft = journal
        .create_draft(
            common::draft_entry(
                "JE-001",
                common::entry_date(),
                vec![
                    common::debit_line(&cash_id, dec!(1200.00)),
                    common::credit_line(&rent_id, dec!(1200.00)),
                ],
            ),
            ACTOR,
        )
        .unwrap();
    assert_eq!(draft.status, EntryStatus::Draft);

    let posted = posting.post(&draft.id, ACTOR).unwrap();
    assert_eq!(posted.status, EntryStatus::Posted);
    assert_eq!(posted.total_debit, dec!(1200.00));
    assert_eq!(posted.total_credit, dec!(1200.00));
    assert!(posted.posted_at.is_some());

    assert_eq!(accounts.get_account(&cash_id).unwrap().balance, dec!(1200.00));
    assert_eq!(accounts.get_account(&rent_id).unwrap().balance, dec!(1200.00));
}

#[test]
fn test_imbalanced_draft_rejected_without_mutation() {
    let db = common::setup_db();
    let (cash_id, rent_id) = cash_and_rent(&db);
    let journal = JournalService::new(db.pool.clone());
    let accounts = AccountService::new(db.pool.clone());

    let result = journal.create_draft(
        common::draft_entry(
            "JE-BAD",
            common::entry_date(),
            vec![
                common::debit_line(&cash_id, dec!(500.00)),
                common::credit_line(&rent_id, dec!(450.00)),
            ],
        ),
        ACTOR,
    );
    match result {
        Err(JournalError::Imbalance {
            total_debit,
            total_credit,
        }) => {
            assert_eq!(total_debit, dec!(500.00));
            assert_eq!(total_credit, dec!(450.00));
        }
        other => panic!("expected Imbalance, got {:?}", other),
    }

    // Nothing was persisted and no balance moved
    assert!(matches!(
        journal.get_entry_by_number("JE-BAD"),
        Err(JournalError::NotFound(_))
    ));
    assert_eq!(accounts.get_account(&cash_id).unwrap().balance, Decimal::ZERO);
    assert_eq!(accounts.get_account(&rent_id).unwrap().balance, Decimal::ZERO);
}

#[test]
fn test_void_reverses_posted_entry() {
    let db = common::setup_db();
    let (cash_id, rent_id) = cash_and_rent(&db);
    let journal = JournalService::new(db.pool.clone());
    let posting = PostingService::new(db.pool.clone());
    let accounts = AccountService::new(db.pool.clone());

    let draft = journal
        .create_draft(
            common::draft_entry(
                "JE-001",
                common::entry_date(),
                vec![
                    common::debit_line(&cash_id, dec!(1200.00)),
                    common::credit_line(&rent_id, dec!(1200.00)),
                ],
            ),
            ACTOR,
        )
        .unwrap();
    posting.post(&draft.id, ACTOR).unwrap();

    let outcome = posting.void(&draft.id, ACTOR).unwrap();

    assert_eq!(outcome.original.status, EntryStatus::Voided);
    assert!(outcome.original.voided_at.is_some());
    assert_eq!(
        outcome.original.reversed_by_entry_id.as_deref(),
        Some(outcome.reversal.id.as_str())
    );

    assert_eq!(outcome.reversal.status, EntryStatus::Posted);
    assert_eq!(outcome.reversal.entry_number, "JE-001-VOID");
    assert_eq!(
        outcome.reversal.reversal_of_entry_id.as_deref(),
        Some(draft.id.as_str())
    );

    // Reversal lines carry the swapped amounts
    let reversal_cash = outcome
        .reversal
        .lines
        .iter()
        .find(|l| l.account_id == cash_id)
        .unwrap();
    assert_eq!(reversal_cash.debit_amount, Decimal::ZERO);
    assert_eq!(reversal_cash.credit_amount, dec!(1200.00));

    // Net effect on every account is zero
    assert_eq!(accounts.get_account(&cash_id).unwrap().balance, Decimal::ZERO);
    assert_eq!(accounts.get_account(&rent_id).unwrap().balance, Decimal::ZERO);
}

#[test]
fn test_void_rejects_non_posted_entries() {
    let db = common::setup_db();
    let (cash_id, rent_id) = cash_and_rent(&db);
    let journal = JournalService::new(db.pool.clone());
    let posting = PostingService::new(db.pool.clone());

    let draft = journal
        .create_draft(
            common::draft_entry(
                "JE-001",
                common::entry_date(),
                vec![
                    common::debit_line(&cash_id, dec!(10.00)),
                    common::credit_line(&rent_id, dec!(10.00)),
                ],
            ),
            ACTOR,
        )
        .unwrap();

    // A draft has never touched balances, so there is nothing to reverse
    assert!(matches!(
        posting.void(&draft.id, ACTOR),
        Err(JournalError::InvalidState(_))
    ));

    posting.post(&draft.id, ACTOR).unwrap();
    posting.void(&draft.id, ACTOR).unwrap();

    // Voiding twice is rejected
    assert!(matches!(
        posting.void(&draft.id, ACTOR),
        Err(JournalError::InvalidState(_))
    ));
}

#[test]
fn test_concurrent_posts_on_shared_account_lose_no_update() {
    let db = common::setup_db();
    let accounts = AccountService::new(db.pool.clone());
    let journal = JournalService::new(db.pool.clone());

    let cash = accounts
        .create_account(
            common::new_account("1000", "Cash", AccountType::Asset, AccountSubtype::Cash),
            ACTOR,
        )
        .unwrap();
    let rent = accounts
        .create_account(
            common::new_account(
                "4000",
                "Rent Revenue",
                AccountType::Revenue,
                AccountSubtype::OperatingIncome,
            ),
            ACTOR,
        )
        .unwrap();
    let fees = accounts
        .create_account(
            common::new_account(
                "4100",
                "Late Fees",
                AccountType::Revenue,
                AccountSubtype::OtherIncome,
            ),
            ACTOR,
        )
        .unwrap();

    let first = journal
        .create_draft(
            common::draft_entry(
                "JE-A",
                common::entry_date(),
                vec![
                    common::debit_line(&cash.id, dec!(100.00)),
                    common::credit_line(&rent.id, dec!(100.00)),
                ],
            ),
            ACTOR,
        )
        .unwrap();
    let second = journal
        .create_draft(
            common::draft_entry(
                "JE-B",
                common::entry_date(),
                vec![
                    common::debit_line(&cash.id, dec!(100.00)),
                    common::credit_line(&fees.id, dec!(100.00)),
                ],
            ),
            ACTOR,
        )
        .unwrap();

    let handles: Vec<_> = [first.id.clone(), second.id.clone()]
        .into_iter()
        .map(|entry_id| {
            let pool = db.pool.clone();
            thread::spawn(move || PostingService::new(pool).post(&entry_id, ACTOR))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    // Both deltas applied exactly once each
    assert_eq!(accounts.get_account(&cash.id).unwrap().balance, dec!(200.00));
    assert_eq!(accounts.get_account(&rent.id).unwrap().balance, dec!(100.00));
    assert_eq!(accounts.get_account(&fees.id).unwrap().balance, dec!(100.00));

    let reports = ReportService::new(db.pool.clone());
    assert!(reports.verify_balances().unwrap().is_empty());
}

#[test]
fn test_posting_against_deactivated_account_fails() {
    let db = common::setup_db();
    let (cash_id, rent_id) = cash_and_rent(&db);
    let journal = JournalService::new(db.pool.clone());
    let posting = PostingService::new(db.pool.clone());
    let accounts = AccountService::new(db.pool.clone());

    let draft = journal
        .create_draft(
            common::draft_entry(
                "JE-001",
                common::entry_date(),
                vec![
                    common::debit_line(&cash_id, dec!(75.00)),
                    common::credit_line(&rent_id, dec!(75.00)),
                ],
            ),
            ACTOR,
        )
        .unwrap();

    // The account goes inactive between drafting and posting
    accounts.deactivate_account(&rent_id, ACTOR).unwrap();

    assert!(matches!(
        posting.post(&draft.id, ACTOR),
        Err(JournalError::InactiveAccount(_))
    ));
    assert_eq!(accounts.get_account(&cash_id).unwrap().balance, Decimal::ZERO);
    assert_eq!(accounts.get_account(&rent_id).unwrap().balance, Decimal::ZERO);

    let reloaded = journal.get_entry(&draft.id).unwrap();
    assert_eq!(reloaded.status, EntryStatus::Draft);
}

#[test]
fn test_post_is_idempotent_for_retries() {
    let db = common::setup_db();
    let (cash_id, rent_id) = cash_and_rent(&db);
    let journal = JournalService::new(db.pool.clone());
    let posting = PostingService::new(db.pool.clone());
    let accounts = AccountService::new(db.pool.clone());

    let draft = journal
        .create_draft(
            common::draft_entry(
                "JE-001",
                common::entry_date(),
                vec![
                    common::debit_line(&cash_id, dec!(300.00)),
                    common::credit_line(&rent_id, dec!(300.00)),
                ],
            ),
            ACTOR,
        )
        .unwrap();

    posting.post(&draft.id, ACTOR).unwrap();
    let second = posting.post(&draft.id, ACTOR).unwrap();
    assert_eq!(second.status, EntryStatus::Posted);

    // One balance application, not two
    assert_eq!(accounts.get_account(&cash_id).unwrap().balance, dec!(300.00));
}

#[test]
fn test_posted_entry_is_immutable() {
    let db = common::setup_db();
    let (cash_id, rent_id) = cash_and_rent(&db);
    let journal = JournalService::new(db.pool.clone());
    let posting = PostingService::new(db.pool.clone());

    let draft = journal
        .create_draft(
            common::draft_entry(
                "JE-001",
                common::entry_date(),
                vec![
                    common::debit_line(&cash_id, dec!(50.00)),
                    common::credit_line(&rent_id, dec!(50.00)),
                ],
            ),
            ACTOR,
        )
        .unwrap();
    posting.post(&draft.id, ACTOR).unwrap();

    let update = JournalEntryUpdate {
        id: Some(draft.id.clone()),
        entry_date: common::entry_date(),
        description: "Edited".to_string(),
        property_id: None,
        lines: vec![
            common::debit_line(&cash_id, dec!(60.00)),
            common::credit_line(&rent_id, dec!(60.00)),
        ],
    };
    assert!(matches!(
        journal.update_draft(update, ACTOR),
        Err(JournalError::InvalidState(_))
    ));
    assert!(matches!(
        journal.delete_draft(&draft.id, ACTOR),
        Err(JournalError::InvalidState(_))
    ));

    // Posting a voided entry is also rejected
    posting.void(&draft.id, ACTOR).unwrap();
    assert!(matches!(
        posting.post(&draft.id, ACTOR),
        Err(JournalError::InvalidState(_))
    ));
}

#[test]
fn test_reclassifying_referenced_account_conflicts() {
    let db = common::setup_db();
    let (cash_id, rent_id) = cash_and_rent(&db);
    let journal = JournalService::new(db.pool.clone());
    let accounts = AccountService::new(db.pool.clone());

    journal
        .create_draft(
            common::draft_entry(
                "JE-001",
                common::entry_date(),
                vec![
                    common::debit_line(&cash_id, dec!(20.00)),
                    common::credit_line(&rent_id, dec!(20.00)),
                ],
            ),
            ACTOR,
        )
        .unwrap();

    let update = AccountUpdate {
        id: Some(rent_id.clone()),
        name: "Rent Revenue".to_string(),
        account_type: Some(AccountType::Liability),
        account_subtype: AccountSubtype::OtherLiability,
        description: None,
        parent_account_id: None,
        is_active: true,
    };
    assert!(matches!(
        accounts.update_account(update, ACTOR),
        Err(AccountError::Conflict(_))
    ));
}

#[test]
fn test_projection_nets_to_zero_after_void() {
    let db = common::setup_db();
    let (cash_id, rent_id) = cash_and_rent(&db);
    let journal = JournalService::new(db.pool.clone());
    let posting = PostingService::new(db.pool.clone());
    let reports = ReportService::new(db.pool.clone());

    let draft = journal
        .create_draft(
            common::draft_entry(
                "JE-001",
                common::entry_date(),
                vec![
                    common::debit_line(&cash_id, dec!(1200.00)),
                    common::credit_line(&rent_id, dec!(1200.00)),
                ],
            ),
            ACTOR,
        )
        .unwrap();
    posting.post(&draft.id, ACTOR).unwrap();
    posting.void(&draft.id, ACTOR).unwrap();

    // As of the original entry date the reversal (dated today) is not yet
    // in scope, so the voided entry's movement must still be counted
    assert_eq!(
        reports
            .account_balance_as_of(&cash_id, common::entry_date())
            .unwrap(),
        dec!(1200.00)
    );

    // As of today the pair cancels out and matches the live balance
    let today = chrono::Utc::now().date_naive();
    assert_eq!(
        reports.account_balance_as_of(&cash_id, today).unwrap(),
        Decimal::ZERO
    );
    assert_eq!(
        reports.account_balance_as_of(&rent_id, today).unwrap(),
        Decimal::ZERO
    );
    assert!(reports.verify_balances().unwrap().is_empty());
}

#[test]
fn test_resolve_parent_chain_orders_nearest_first() {
    let db = common::setup_db();
    let accounts = AccountService::new(db.pool.clone());

    let root = accounts
        .create_account(
            common::new_account(
                "1000",
                "Assets",
                AccountType::Asset,
                AccountSubtype::OtherAsset,
            ),
            ACTOR,
        )
        .unwrap();

    let mut current_input = common::new_account(
        "1100",
        "Current Assets",
        AccountType::Asset,
        AccountSubtype::OtherAsset,
    );
    current_input.parent_account_id = Some(root.id.clone());
    let current = accounts.create_account(current_input, ACTOR).unwrap();

    let mut cash_input =
        common::new_account("1110", "Cash", AccountType::Asset, AccountSubtype::Cash);
    cash_input.parent_account_id = Some(current.id.clone());
    let cash = accounts.create_account(cash_input, ACTOR).unwrap();

    let chain = accounts.resolve_parent_chain(&cash.id).unwrap();
    assert_eq!(chain.len(), 2);
    assert_eq!(chain[0].id, current.id);
    assert_eq!(chain[1].id, root.id);

    // A root account has no ancestors
    assert!(accounts.resolve_parent_chain(&root.id).unwrap().is_empty());
}

#[test]
fn test_parent_cycle_rejected() {
    let db = common::setup_db();
    let accounts = AccountService::new(db.pool.clone());

    let root = accounts
        .create_account(
            common::new_account(
                "1000",
                "Assets",
                AccountType::Asset,
                AccountSubtype::OtherAsset,
            ),
            ACTOR,
        )
        .unwrap();

    let mut cash_input =
        common::new_account("1110", "Cash", AccountType::Asset, AccountSubtype::Cash);
    cash_input.parent_account_id = Some(root.id.clone());
    let cash = accounts.create_account(cash_input, ACTOR).unwrap();

    // An account cannot be its own parent
    let self_parent = AccountUpdate {
        id: Some(root.id.clone()),
        name: "Assets".to_string(),
        account_type: None,
        account_subtype: AccountSubtype::OtherAsset,
        description: None,
        parent_account_id: Some(root.id.clone()),
        is_active: true,
    };
    assert!(matches!(
        accounts.update_account(self_parent, ACTOR),
        Err(AccountError::Cycle(_))
    ));

    // Parenting the root under its own descendant would close a loop
    let closes_loop = AccountUpdate {
        id: Some(root.id.clone()),
        name: "Assets".to_string(),
        account_type: None,
        account_subtype: AccountSubtype::OtherAsset,
        description: None,
        parent_account_id: Some(cash.id.clone()),
        is_active: true,
    };
    assert!(matches!(
        accounts.update_account(closes_loop, ACTOR),
        Err(AccountError::Cycle(_))
    ));

    // Reassigning to a legitimate ancestor still works
    let reparent = AccountUpdate {
        id: Some(cash.id.clone()),
        name: "Cash".to_string(),
        account_type: None,
        account_subtype: AccountSubtype::Cash,
        description: None,
        parent_account_id: Some(root.id.clone()),
        is_active: true,
    };
    let updated = accounts.update_account(reparent, ACTOR).unwrap();
    assert_eq!(updated.parent_account_id.as_deref(), Some(root.id.as_str()));
}

#[test]
fn test_projector_matches_live_balances() {
    let db = common::setup_db();
    let (cash_id, rent_id) = cash_and_rent(&db);
    let journal = JournalService::new(db.pool.clone());
    let posting = PostingService::new(db.pool.clone());
    let accounts = AccountService::new(db.pool.clone());
    let reports = ReportService::new(db.pool.clone());

    for (number, amount) in [("JE-001", dec!(1200.00)), ("JE-002", dec!(350.50))] {
        let draft = journal
            .create_draft(
                common::draft_entry(
                    number,
                    common::entry_date(),
                    vec![
                        common::debit_line(&cash_id, amount),
                        common::credit_line(&rent_id, amount),
                    ],
                ),
                ACTOR,
            )
            .unwrap();
        posting.post(&draft.id, ACTOR).unwrap();
    }

    let today = chrono::Utc::now().date_naive();
    let projected = reports.account_balance_as_of(&cash_id, today).unwrap();
    assert_eq!(projected, dec!(1550.50));
    assert_eq!(projected, accounts.get_account(&cash_id).unwrap().balance);

    // Before the entries' date nothing has happened yet
    let earlier = common::entry_date().pred_opt().unwrap();
    assert_eq!(
        reports.account_balance_as_of(&cash_id, earlier).unwrap(),
        Decimal::ZERO
    );
}

#[test]
fn test_trial_balance_identity_holds() {
    let db = common::setup_db();
    let (cash_id, rent_id) = cash_and_rent(&db);
    let journal = JournalService::new(db.pool.clone());
    let posting = PostingService::new(db.pool.clone());
    let reports = ReportService::new(db.pool.clone());

    let draft = journal
        .create_draft(
            common::draft_entry(
                "JE-001",
                common::entry_date(),
                vec![
                    common::debit_line(&cash_id, dec!(1200.00)),
                    common::credit_line(&rent_id, dec!(1200.00)),
                ],
            ),
            ACTOR,
        )
        .unwrap();
    posting.post(&draft.id, ACTOR).unwrap();

    let today = chrono::Utc::now().date_naive();
    let trial = reports.trial_balance(today).unwrap();
    assert!(trial.is_balanced());
    assert_eq!(trial.total_debit, dec!(1200.00));
    assert_eq!(trial.total_credit, dec!(1200.00));

    let cash_row = trial.rows.iter().find(|r| r.account_id == cash_id).unwrap();
    assert_eq!(cash_row.debit_balance, dec!(1200.00));
    assert_eq!(cash_row.credit_balance, Decimal::ZERO);

    // Voiding keeps the identity and returns every row to zero
    posting.void(&draft.id, ACTOR).unwrap();
    let trial = reports.trial_balance(today).unwrap();
    assert!(trial.is_balanced());
    assert_eq!(trial.total_debit, Decimal::ZERO);
}

#[test]
fn test_net_income_over_range() {
    let db = common::setup_db();
    let accounts = AccountService::new(db.pool.clone());
    let journal = JournalService::new(db.pool.clone());
    let posting = PostingService::new(db.pool.clone());
    let reports = ReportService::new(db.pool.clone());

    let cash = accounts
        .create_account(
            common::new_account("1000", "Cash", AccountType::Asset, AccountSubtype::Cash),
            ACTOR,
        )
        .unwrap();
    let rent = accounts
        .create_account(
            common::new_account(
                "4000",
                "Rent Revenue",
                AccountType::Revenue,
                AccountSubtype::OperatingIncome,
            ),
            ACTOR,
        )
        .unwrap();
    let repairs = accounts
        .create_account(
            common::new_account(
                "5000",
                "Repairs",
                AccountType::Expense,
                AccountSubtype::OperatingExpense,
            ),
            ACTOR,
        )
        .unwrap();

    for (number, lines) in [
        (
            "JE-001",
            vec![
                common::debit_line(&cash.id, dec!(1000.00)),
                common::credit_line(&rent.id, dec!(1000.00)),
            ],
        ),
        (
            "JE-002",
            vec![
                common::debit_line(&repairs.id, dec!(250.00)),
                common::credit_line(&cash.id, dec!(250.00)),
            ],
        ),
    ] {
        let draft = journal
            .create_draft(common::draft_entry(number, common::entry_date(), lines), ACTOR)
            .unwrap();
        posting.post(&draft.id, ACTOR).unwrap();
    }

    let from = chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let to = chrono::NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
    let report = reports.net_income(from, to).unwrap();
    assert_eq!(report.total_revenue, dec!(1000.00));
    assert_eq!(report.total_expense, dec!(250.00));
    assert_eq!(report.net_income, dec!(750.00));

    // Ranges with no posted entries report zero, not an error
    let empty_from = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let empty_to = chrono::NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
    let empty = reports.net_income(empty_from, empty_to).unwrap();
    assert_eq!(empty.net_income, Decimal::ZERO);
}

#[test]
fn test_verify_balances_reconciles_after_lifecycle() {
    let db = common::setup_db();
    let (cash_id, rent_id) = cash_and_rent(&db);
    let journal = JournalService::new(db.pool.clone());
    let posting = PostingService::new(db.pool.clone());
    let reports = ReportService::new(db.pool.clone());

    // Clean slate reconciles trivially
    assert!(reports.verify_balances().unwrap().is_empty());

    let draft = journal
        .create_draft(
            common::draft_entry(
                "JE-001",
                common::entry_date(),
                vec![
                    common::debit_line(&cash_id, dec!(999.99)),
                    common::credit_line(&rent_id, dec!(999.99)),
                ],
            ),
            ACTOR,
        )
        .unwrap();
    posting.post(&draft.id, ACTOR).unwrap();
    assert!(reports.verify_balances().unwrap().is_empty());

    posting.void(&draft.id, ACTOR).unwrap();
    assert!(reports.verify_balances().unwrap().is_empty());
}

#[test]
fn test_duplicate_entry_number_rejected() {
    let db = common::setup_db();
    let (cash_id, rent_id) = cash_and_rent(&db);
    let journal = JournalService::new(db.pool.clone());

    let entry = common::draft_entry(
        "JE-001",
        common::entry_date(),
        vec![
            common::debit_line(&cash_id, dec!(10.00)),
            common::credit_line(&rent_id, dec!(10.00)),
        ],
    );
    journal.create_draft(entry.clone(), ACTOR).unwrap();
    assert!(matches!(
        journal.create_draft(entry, ACTOR),
        Err(JournalError::Validation(_))
    ));
}

#[test]
fn test_unknown_account_rejected_at_draft_time() {
    let db = common::setup_db();
    let (cash_id, _) = cash_and_rent(&db);
    let journal = JournalService::new(db.pool.clone());

    let result = journal.create_draft(
        common::draft_entry(
            "JE-GHOST",
            common::entry_date(),
            vec![
                common::debit_line(&cash_id, dec!(10.00)),
                common::credit_line("no-such-account", dec!(10.00)),
            ],
        ),
        ACTOR,
    );
    assert!(
        matches!(result, Err(JournalError::UnknownAccount(ref id)) if id == "no-such-account")
    );
}

proptest! {
    // Each case builds a fresh database, so keep the case count small
    #![proptest_config(ProptestConfig::with_cases(8))]

    /// Posting any sequence of balanced entries preserves the trial
    /// balance identity and leaves nothing for verify_balances to flag.
    #[test]
    fn prop_posting_sequences_keep_the_identity(
        amounts in prop::collection::vec(1i64..1_000_000, 1..8)
    ) {
        let db = common::setup_db();
        let accounts = AccountService::new(db.pool.clone());
        let journal = JournalService::new(db.pool.clone());
        let posting = PostingService::new(db.pool.clone());
        let reports = ReportService::new(db.pool.clone());

        let cash = accounts
            .create_account(
                common::new_account("1000", "Cash", AccountType::Asset, AccountSubtype::Cash),
                ACTOR,
            )
            .unwrap();
        let rent = accounts
            .create_account(
                common::new_account(
                    "4000",
                    "Rent Revenue",
                    AccountType::Revenue,
                    AccountSubtype::OperatingIncome,
                ),
                ACTOR,
            )
            .unwrap();
        let fees = accounts
            .create_account(
                common::new_account(
                    "4100",
                    "Late Fees",
                    AccountType::Revenue,
                    AccountSubtype::OtherIncome,
                ),
                ACTOR,
            )
            .unwrap();

        for (i, cents) in amounts.iter().enumerate() {
            let amount = Decimal::new(*cents, 2);
            let revenue_id = if i % 2 == 0 { &rent.id } else { &fees.id };
            let draft = journal
                .create_draft(
                    common::draft_entry(
                        &format!("JE-{:03}", i),
                        common::entry_date(),
                        vec![
                            common::debit_line(&cash.id, amount),
                            common::credit_line(revenue_id, amount),
                        ],
                    ),
                    ACTOR,
                )
                .unwrap();
            posting.post(&draft.id, ACTOR).unwrap();
        }

        let today = chrono::Utc::now().date_naive();
        let trial = reports.trial_balance(today).unwrap();
        prop_assert!(trial.is_balanced());
        prop_assert!(reports.verify_balances().unwrap().is_empty());
    }
}

#[test]
fn test_opening_balance_counts_in_projection() {
    let db = common::setup_db();
    let accounts = AccountService::new(db.pool.clone());
    let reports = ReportService::new(db.pool.clone());

    let mut new_account =
        common::new_account("1000", "Cash", AccountType::Asset, AccountSubtype::Cash);
    new_account.opening_balance = Some(dec!(5000.00));
    let cash = accounts.create_account(new_account, ACTOR).unwrap();

    assert_eq!(cash.balance, dec!(5000.00));
    let today = chrono::Utc::now().date_naive();
    assert_eq!(
        reports.account_balance_as_of(&cash.id, today).unwrap(),
        dec!(5000.00)
    );
    assert!(reports.verify_balances().unwrap().is_empty());
}
