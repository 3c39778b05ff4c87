use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A single append-only audit record for a ledger mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub actor: String,
    pub detail: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Input model for appending an audit record
#[derive(Debug, Clone)]
pub struct NewAuditRecord {
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub actor: String,
    pub detail: Option<String>,
}

impl NewAuditRecord {
    pub fn account(entity_id: &str, action: &str, actor: &str, detail: Option<String>) -> Self {
        Self {
            entity_type: "account".to_string(),
            entity_id: entity_id.to_string(),
            action: action.to_string(),
            actor: actor.to_string(),
            detail,
        }
    }

    pub fn journal_entry(
        entity_id: &str,
        action: &str,
        actor: &str,
        detail: Option<String>,
    ) -> Self {
        Self {
            entity_type: "journal_entry".to_string(),
            entity_id: entity_id.to_string(),
            action: action.to_string(),
            actor: actor.to_string(),
            detail,
        }
    }
}

/// Database model for audit records
#[derive(Queryable, Identifiable, Insertable, Selectable, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::ledger_audit)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AuditRecordDB {
    pub id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub actor: String,
    pub detail: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<AuditRecordDB> for AuditRecord {
    fn from(db: AuditRecordDB) -> Self {
        Self {
            id: db.id,
            entity_type: db.entity_type,
            entity_id: db.entity_id,
            action: db.action,
            actor: db.actor,
            detail: db.detail,
            created_at: db.created_at,
        }
    }
}

impl From<NewAuditRecord> for AuditRecordDB {
    fn from(domain: NewAuditRecord) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            entity_type: domain.entity_type,
            entity_id: domain.entity_id,
            action: domain.action,
            actor: domain.actor,
            detail: domain.detail,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
