//! Audit module - field-level audit entries built from structural diffs.

mod audit_model;
mod audit_traits;

pub use audit_model::AuditEntry;
pub use audit_traits::AuditRepositoryTrait;
