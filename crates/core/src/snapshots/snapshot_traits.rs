use async_trait::async_trait;

use super::snapshot_model::{PortfolioSnapshot, SnapshotMetadata};
use crate::errors::Result;

/// Trait defining the contract for snapshot storage.
///
/// Snapshots are append-only: there is no update operation, only insert,
/// read, and oldest-first pruning.
#[async_trait]
pub trait SnapshotRepositoryTrait: Send + Sync {
    /// The customer's most recent snapshot header, if any.
    fn get_latest_metadata(&self, customer_id: &str) -> Result<Option<SnapshotMetadata>>;

    /// Snapshot headers newest-first; the blob is never loaded.
    fn list_metadata(
        &self,
        customer_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SnapshotMetadata>>;

    /// The full record including the blob, for playback.
    fn get_by_id(&self, snapshot_id: &str) -> Result<PortfolioSnapshot>;

    async fn save(&self, snapshot: PortfolioSnapshot) -> Result<SnapshotMetadata>;

    /// Deletes the customer's oldest snapshots beyond `keep`, returning
    /// the number removed.
    async fn prune_oldest(&self, customer_id: &str, keep: usize) -> Result<usize>;
}
