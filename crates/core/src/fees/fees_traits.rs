use async_trait::async_trait;

use super::fees_model::FeeConfig;
use crate::errors::Result;

/// Trait defining the contract for fee-template storage.
#[async_trait]
pub trait FeeConfigRepositoryTrait: Send + Sync {
    fn get_by_id(&self, config_id: &str) -> Result<FeeConfig>;

    fn list(&self) -> Result<Vec<FeeConfig>>;

    /// Persists a template after [`FeeConfig::validate`] has passed.
    async fn save(&self, config: FeeConfig) -> Result<FeeConfig>;
}
