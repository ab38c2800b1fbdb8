use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use uuid::Uuid;

use finvoice_core::errors::{DatabaseError, Result};
use finvoice_core::fx::{ExchangeRate, FxRepositoryTrait, NewExchangeRate};

/// Exchange-rate storage keyed by pair, each pair holding its dated rows.
#[derive(Default)]
pub struct InMemoryFxRepository {
    rates: DashMap<String, Vec<ExchangeRate>>,
}

impl InMemoryFxRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FxRepositoryTrait for InMemoryFxRepository {
    fn get_rate_on_or_before(
        &self,
        from_currency: &str,
        to_currency: &str,
        as_of: NaiveDate,
    ) -> Result<Option<ExchangeRate>> {
        let key = ExchangeRate::pair_key(from_currency, to_currency);
        Ok(self.rates.get(&key).and_then(|rows| {
            rows.iter()
                .filter(|r| r.effective_date <= as_of)
                .max_by_key(|r| r.effective_date)
                .cloned()
        }))
    }

    fn list_rates(&self) -> Result<Vec<ExchangeRate>> {
        let mut all: Vec<ExchangeRate> = self
            .rates
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect();
        all.sort_by(|a, b| {
            ExchangeRate::pair_key(&a.from_currency, &a.to_currency)
                .cmp(&ExchangeRate::pair_key(&b.from_currency, &b.to_currency))
                .then(a.effective_date.cmp(&b.effective_date))
        });
        Ok(all)
    }

    async fn save_rate(&self, new_rate: NewExchangeRate) -> Result<ExchangeRate> {
        let rate = ExchangeRate {
            id: Uuid::new_v4().to_string(),
            from_currency: new_rate.from_currency,
            to_currency: new_rate.to_currency,
            rate: new_rate.rate,
            effective_date: new_rate.effective_date,
        };
        let key = ExchangeRate::pair_key(&rate.from_currency, &rate.to_currency);
        // A second rate for the same pair and date replaces the first.
        let mut rows = self.rates.entry(key).or_default();
        rows.retain(|r| r.effective_date != rate.effective_date);
        rows.push(rate.clone());
        Ok(rate)
    }

    async fn delete_rate(&self, rate_id: &str) -> Result<()> {
        for mut entry in self.rates.iter_mut() {
            let before = entry.value().len();
            entry.value_mut().retain(|r| r.id != rate_id);
            if entry.value().len() < before {
                return Ok(());
            }
        }
        Err(DatabaseError::NotFound(format!("Exchange rate {} not found", rate_id)).into())
    }
}
