// Module declarations
pub(crate) mod audit_model;
pub(crate) mod audit_repository;

// Re-export the public interface
pub use audit_model::{AuditRecord, AuditRecordDB, NewAuditRecord};
pub use audit_repository::AuditRepository;
