use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;

use finvoice_core::errors::{DatabaseError, Result};
use finvoice_core::snapshots::{PortfolioSnapshot, SnapshotMetadata, SnapshotRepositoryTrait};

/// Snapshot storage keyed by customer id.
///
/// Each customer's list is kept sorted newest-first, so reads never scan
/// or re-sort. Full records live in the per-customer lists; lookups by
/// snapshot id go through a secondary id-to-customer index.
#[derive(Default)]
pub struct InMemorySnapshotRepository {
    by_customer: DashMap<String, Vec<PortfolioSnapshot>>,
    customer_of: DashMap<String, String>,
}

impl InMemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotRepositoryTrait for InMemorySnapshotRepository {
    fn get_latest_metadata(&self, customer_id: &str) -> Result<Option<SnapshotMetadata>> {
        Ok(self
            .by_customer
            .get(customer_id)
            .and_then(|snapshots| snapshots.first().map(|s| s.metadata.clone())))
    }

    fn list_metadata(
        &self,
        customer_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SnapshotMetadata>> {
        Ok(self
            .by_customer
            .get(customer_id)
            .map(|snapshots| {
                snapshots
                    .iter()
                    .skip(offset.max(0) as usize)
                    .take(limit.max(0) as usize)
                    .map(|s| s.metadata.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_by_id(&self, snapshot_id: &str) -> Result<PortfolioSnapshot> {
        let customer_id = self
            .customer_of
            .get(snapshot_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                DatabaseError::NotFound(format!("Snapshot {} not found", snapshot_id))
            })?;
        self.by_customer
            .get(&customer_id)
            .and_then(|snapshots| {
                snapshots
                    .iter()
                    .find(|s| s.metadata.id == snapshot_id)
                    .cloned()
            })
            .ok_or_else(|| {
                DatabaseError::NotFound(format!("Snapshot {} not found", snapshot_id)).into()
            })
    }

    async fn save(&self, snapshot: PortfolioSnapshot) -> Result<SnapshotMetadata> {
        let metadata = snapshot.metadata.clone();
        self.customer_of
            .insert(metadata.id.clone(), metadata.customer_id.clone());
        let mut snapshots = self
            .by_customer
            .entry(metadata.customer_id.clone())
            .or_default();
        let position = snapshots
            .partition_point(|s| s.metadata.timestamp > metadata.timestamp);
        snapshots.insert(position, snapshot);
        Ok(metadata)
    }

    async fn prune_oldest(&self, customer_id: &str, keep: usize) -> Result<usize> {
        let Some(mut snapshots) = self.by_customer.get_mut(customer_id) else {
            return Ok(0);
        };
        if snapshots.len() <= keep {
            return Ok(0);
        }
        let removed: Vec<PortfolioSnapshot> = snapshots.split_off(keep);
        for snapshot in &removed {
            self.customer_of.remove(&snapshot.metadata.id);
        }
        debug!(
            "Pruned {} snapshots for customer {}, {} kept",
            removed.len(),
            customer_id,
            snapshots.len()
        );
        Ok(removed.len())
    }
}
