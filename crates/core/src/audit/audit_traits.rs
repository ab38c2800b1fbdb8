use async_trait::async_trait;

use super::audit_model::AuditEntry;
use crate::errors::Result;

/// Trait defining the contract for audit-log storage.
///
/// Storage mechanics (indexes, retention, export) live behind this seam;
/// the core only appends and reads back per entity.
#[async_trait]
pub trait AuditRepositoryTrait: Send + Sync {
    async fn append(&self, entry: AuditEntry) -> Result<()>;

    fn list_for_entity(&self, entity_type: &str, entity_id: &str) -> Result<Vec<AuditEntry>>;
}
