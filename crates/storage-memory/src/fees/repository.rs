use async_trait::async_trait;
use dashmap::DashMap;

use finvoice_core::errors::{DatabaseError, Result};
use finvoice_core::fees::{FeeConfig, FeeConfigRepositoryTrait};

/// Fee-template storage keyed by config id.
#[derive(Default)]
pub struct InMemoryFeeConfigRepository {
    configs: DashMap<String, FeeConfig>,
}

impl InMemoryFeeConfigRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeeConfigRepositoryTrait for InMemoryFeeConfigRepository {
    fn get_by_id(&self, config_id: &str) -> Result<FeeConfig> {
        self.configs
            .get(config_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                DatabaseError::NotFound(format!("Fee config {} not found", config_id)).into()
            })
    }

    fn list(&self) -> Result<Vec<FeeConfig>> {
        let mut configs: Vec<FeeConfig> = self
            .configs
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        configs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(configs)
    }

    async fn save(&self, config: FeeConfig) -> Result<FeeConfig> {
        config.validate()?;
        self.configs.insert(config.id.clone(), config.clone());
        Ok(config)
    }
}
