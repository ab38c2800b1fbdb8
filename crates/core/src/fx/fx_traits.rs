use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::fx_model::{ExchangeRate, NewExchangeRate};
use crate::errors::Result;

/// Trait defining the contract for FX repository operations.
#[async_trait]
pub trait FxRepositoryTrait: Send + Sync {
    /// Most recent rate row for the exact pair with `effective_date <= as_of`.
    fn get_rate_on_or_before(
        &self,
        from_currency: &str,
        to_currency: &str,
        as_of: NaiveDate,
    ) -> Result<Option<ExchangeRate>>;

    fn list_rates(&self) -> Result<Vec<ExchangeRate>>;

    async fn save_rate(&self, new_rate: NewExchangeRate) -> Result<ExchangeRate>;

    async fn delete_rate(&self, rate_id: &str) -> Result<()>;
}

/// Trait defining the contract for rate resolution during recalculation.
pub trait FxResolverTrait: Send + Sync {
    /// Conversion factor from one currency to another as of a date.
    ///
    /// Never fails for a missing pair; see [`crate::fx::FxResolver`].
    fn rate(&self, from_currency: &str, to_currency: &str, as_of: NaiveDate) -> Result<Decimal>;

    /// Converts an amount between currencies as of a date.
    fn convert(
        &self,
        amount: Decimal,
        from_currency: &str,
        to_currency: &str,
        as_of: NaiveDate,
    ) -> Result<Decimal>;
}
