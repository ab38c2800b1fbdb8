use async_trait::async_trait;
use dashmap::DashMap;

use finvoice_core::audit::{AuditEntry, AuditRepositoryTrait};
use finvoice_core::errors::Result;

/// Append-only audit storage keyed by `(entity_type, entity_id)`.
#[derive(Default)]
pub struct InMemoryAuditRepository {
    entries: DashMap<(String, String), Vec<AuditEntry>>,
}

impl InMemoryAuditRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditRepositoryTrait for InMemoryAuditRepository {
    async fn append(&self, entry: AuditEntry) -> Result<()> {
        let key = (entry.entity_type.clone(), entry.entity_id.clone());
        self.entries.entry(key).or_default().push(entry);
        Ok(())
    }

    fn list_for_entity(&self, entity_type: &str, entity_id: &str) -> Result<Vec<AuditEntry>> {
        let key = (entity_type.to_string(), entity_id.to_string());
        Ok(self
            .entries
            .get(&key)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }
}
