use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use crate::db::get_connection;
use crate::errors::Result;
use crate::schema::ledger_audit;

use super::audit_model::{AuditRecord, AuditRecordDB, NewAuditRecord};

/// Repository for the append-only audit log
pub struct AuditRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
}

impl AuditRepository {
    /// Creates a new AuditRepository instance
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>) -> Self {
        Self { pool }
    }

    /// Appends an audit record
    pub fn append(&self, record: NewAuditRecord) -> Result<AuditRecord> {
        let mut conn = get_connection(&self.pool)?;
        Self::append_in_transaction(&mut conn, record)
    }

    /// Appends an audit record on an existing connection, so status
    /// transitions commit atomically with the record that describes them.
    pub fn append_in_transaction(
        conn: &mut SqliteConnection,
        record: NewAuditRecord,
    ) -> Result<AuditRecord> {
        let record_db: AuditRecordDB = record.into();

        diesel::insert_into(ledger_audit::table)
            .values(&record_db)
            .execute(conn)?;

        Ok(record_db.into())
    }

    /// Lists audit records for one entity, oldest first
    pub fn list_for_entity(&self, entity_type: &str, entity_id: &str) -> Result<Vec<AuditRecord>> {
        let mut conn = get_connection(&self.pool)?;

        ledger_audit::table
            .filter(ledger_audit::entity_type.eq(entity_type))
            .filter(ledger_audit::entity_id.eq(entity_id))
            .order(ledger_audit::created_at.asc())
            .load::<AuditRecordDB>(&mut conn)
            .map(|records| records.into_iter().map(AuditRecord::from).collect())
            .map_err(Into::into)
    }
}
