use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::{debug, info};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::posting_traits::{PostingServiceTrait, VoidOutcome};
use crate::accounts::{AccountError, AccountRepository};
use crate::audit::{AuditRepository, NewAuditRecord};
use crate::db::{is_lock_contention, DbTransactionExecutor};
use crate::errors::Error;
use crate::journal::{
    validate_lines, EntryStatus, JournalEntry, JournalEntryDB, JournalError, JournalLineDB,
    JournalRepository, NewJournalEntry, NewJournalLine, Result, ValidatedTotals,
};

/// The posting state machine: the only writer of account balances.
///
/// `post` and `void` each run as one immediate (write-locking) SQLite
/// transaction, so either every balance delta and the status stamp commit
/// together or none do. Concurrent calls touching the same accounts
/// serialize on the database write lock; an aborted call leaves the entry
/// in its prior state with no balance changes applied.
pub struct PostingService {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl PostingService {
    /// Creates a new PostingService instance
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    /// Re-runs the validator against live account state on the posting
    /// transaction's connection.
    fn revalidate_in_transaction(
        conn: &mut SqliteConnection,
        entry: &JournalEntry,
    ) -> Result<ValidatedTotals> {
        let lines: Vec<NewJournalLine> = entry
            .lines
            .iter()
            .map(|line| NewJournalLine {
                account_id: line.account_id.clone(),
                debit_amount: line.debit_amount,
                credit_amount: line.credit_amount,
                description: line.description.clone(),
            })
            .collect();

        validate_lines(&lines, |account_id| {
            match AccountRepository::get_by_id_in_transaction(conn, account_id) {
                Ok(account) => Ok(Some(account)),
                Err(AccountError::NotFound(_)) => Ok(None),
                Err(e) => Err(JournalError::from(e)),
            }
        })
    }

    /// Applies the entry's net movement to every referenced account.
    ///
    /// Accounts are processed in ascending id order so overlapping entries
    /// always lock rows in the same sequence. The read-modify-write of
    /// each balance happens entirely inside the surrounding transaction.
    fn apply_deltas_in_transaction(
        conn: &mut SqliteConnection,
        entry: &JournalEntry,
    ) -> Result<()> {
        let mut per_account: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
        for line in &entry.lines {
            let totals = per_account
                .entry(line.account_id.clone())
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            totals.0 += line.debit_amount;
            totals.1 += line.credit_amount;
        }

        for (account_id, (debit, credit)) in per_account {
            let account = AccountRepository::get_by_id_in_transaction(conn, &account_id)?;
            let delta = account.account_type.signed_delta(debit, credit);
            let new_balance = account.balance + delta;
            debug!(
                "Applying delta {} to account {} (balance {} -> {})",
                delta, account.account_number, account.balance, new_balance
            );
            AccountRepository::update_balance_in_transaction(conn, &account_id, &new_balance)?;
        }

        Ok(())
    }

    /// Posts an already-loaded draft entry on the transaction connection.
    /// Shared by `post` and the reversal half of `void`.
    fn post_in_transaction(
        conn: &mut SqliteConnection,
        entry: &JournalEntry,
        actor: &str,
    ) -> Result<JournalEntry> {
        entry.status.transition(EntryStatus::Posted)?;

        let totals = Self::revalidate_in_transaction(conn, entry)?;
        Self::apply_deltas_in_transaction(conn, entry)?;
        JournalRepository::mark_posted_in_transaction(conn, &entry.id, &totals)?;

        AuditRepository::append_in_transaction(
            conn,
            NewAuditRecord::journal_entry(&entry.id, "posted", actor, None),
        )
        .map_err(|e| JournalError::DatabaseError(e.to_string()))?;

        JournalRepository::get_by_id_in_transaction(conn, &entry.id)
    }

    /// Maps the executor's root error back into the journal error space,
    /// converting exhausted lock retries into a retriable conflict.
    fn unwrap_ledger_error(err: Error) -> JournalError {
        if is_lock_contention(&err) {
            return JournalError::Conflict(
                "The ledger is busy with a conflicting posting; retry the operation".to_string(),
            );
        }
        match err {
            Error::Journal(journal_err) => journal_err,
            Error::Account(account_err) => account_err.into(),
            other => JournalError::DatabaseError(other.to_string()),
        }
    }
}

impl PostingServiceTrait for PostingService {
    /// Transitions a draft entry to posted, applying its balance deltas.
    ///
    /// Idempotent on retry: posting an already-posted entry is a no-op
    /// success. Posting a voided entry is an error.
    fn post(&self, entry_id: &str, actor: &str) -> Result<JournalEntry> {
        let result = self.pool.execute_immediate(|conn| {
            let entry = JournalRepository::get_by_id_in_transaction(conn, entry_id)?;

            match entry.status {
                // Safe retry semantics for network timeouts: same id, same outcome
                EntryStatus::Posted => return Ok(entry),
                EntryStatus::Voided => {
                    return Err(Error::Journal(JournalError::InvalidState(format!(
                        "Journal entry {} was voided and cannot be posted",
                        entry.entry_number
                    ))));
                }
                EntryStatus::Draft => {}
            }

            let posted = Self::post_in_transaction(conn, &entry, actor)?;
            info!(
                "Posted journal entry {} ({} = {})",
                posted.entry_number, posted.total_debit, posted.total_credit
            );
            Ok(posted)
        });

        result.map_err(Self::unwrap_ledger_error)
    }

    /// Voids a posted entry by posting a compensating reversal.
    ///
    /// The original's lines are never touched: a new entry with debit and
    /// credit amounts swapped is created and posted in the same
    /// transaction that marks the original voided, so the pair commits or
    /// rolls back as one.
    fn void(&self, entry_id: &str, actor: &str) -> Result<VoidOutcome> {
        let result = self.pool.execute_immediate(|conn| {
            let original = JournalRepository::get_by_id_in_transaction(conn, entry_id)?;
            original
                .status
                .transition(EntryStatus::Voided)
                .map_err(Error::Journal)?;

            let reversal_input = NewJournalEntry {
                id: None,
                entry_number: format!("{}-VOID", original.entry_number),
                entry_date: chrono::Utc::now().date_naive(),
                description: format!("Reversal of entry {}", original.entry_number),
                property_id: original.property_id.clone(),
                lines: original
                    .lines
                    .iter()
                    .map(|line| NewJournalLine {
                        account_id: line.account_id.clone(),
                        debit_amount: line.credit_amount,
                        credit_amount: line.debit_amount,
                        description: line.description.clone(),
                    })
                    .collect(),
            };

            let lines_input = reversal_input.lines.clone();
            let mut header: JournalEntryDB = reversal_input.into();
            header.id = uuid::Uuid::new_v4().to_string();
            header.reversal_of_entry_id = Some(original.id.clone());

            let lines_db: Vec<JournalLineDB> = lines_input
                .into_iter()
                .enumerate()
                .map(|(i, line)| line.into_db(&header.id, i as i32))
                .collect();

            JournalRepository::insert_in_transaction(conn, &header, &lines_db)?;
            let reversal_draft = JournalRepository::get_by_id_in_transaction(conn, &header.id)?;
            let reversal = Self::post_in_transaction(conn, &reversal_draft, actor)?;

            JournalRepository::mark_voided_in_transaction(conn, &original.id, &reversal.id)?;
            AuditRepository::append_in_transaction(
                conn,
                NewAuditRecord::journal_entry(
                    &original.id,
                    "voided",
                    actor,
                    Some(format!("reversed by entry {}", reversal.entry_number)),
                ),
            )
            .map_err(|e| Error::Journal(JournalError::DatabaseError(e.to_string())))?;

            let voided = JournalRepository::get_by_id_in_transaction(conn, &original.id)?;
            info!(
                "Voided journal entry {} via reversal {}",
                voided.entry_number, reversal.entry_number
            );
            Ok(VoidOutcome {
                original: voided,
                reversal,
            })
        });

        result.map_err(Self::unwrap_ledger_error)
    }
}
