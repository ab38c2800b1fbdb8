use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::fx_errors::FxError;
use super::fx_traits::{FxRepositoryTrait, FxResolverTrait};
use crate::errors::Result;

/// Resolves currency-pair conversion factors as of a date.
///
/// Resolution order: identity pair, direct rate, inverse rate, then a
/// degraded 1:1 factor. The degraded path is logged rather than raised so
/// that a loan recalculation never fails solely because market data is
/// missing for one invoice currency.
#[derive(Clone)]
pub struct FxResolver {
    repository: Arc<dyn FxRepositoryTrait>,
}

impl FxResolver {
    pub fn new(repository: Arc<dyn FxRepositoryTrait>) -> Self {
        Self { repository }
    }

    fn validate_code(code: &str) -> Result<()> {
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(FxError::InvalidCurrencyCode(code.to_string()).into());
        }
        Ok(())
    }
}

impl FxResolverTrait for FxResolver {
    fn rate(&self, from_currency: &str, to_currency: &str, as_of: NaiveDate) -> Result<Decimal> {
        Self::validate_code(from_currency)?;
        Self::validate_code(to_currency)?;

        if from_currency == to_currency {
            return Ok(Decimal::ONE);
        }

        if let Some(direct) = self
            .repository
            .get_rate_on_or_before(from_currency, to_currency, as_of)?
        {
            return Ok(direct.rate);
        }

        if let Some(inverse) = self
            .repository
            .get_rate_on_or_before(to_currency, from_currency, as_of)?
        {
            if !inverse.rate.is_zero() {
                return Ok(Decimal::ONE / inverse.rate);
            }
        }

        log::warn!(
            "No exchange rate found for {}/{} on {}. Falling back to 1:1 conversion",
            from_currency,
            to_currency,
            as_of
        );
        Ok(Decimal::ONE)
    }

    fn convert(
        &self,
        amount: Decimal,
        from_currency: &str,
        to_currency: &str,
        as_of: NaiveDate,
    ) -> Result<Decimal> {
        if from_currency == to_currency {
            return Ok(amount);
        }
        let rate = self.rate(from_currency, to_currency, as_of)?;
        Ok(amount * rate)
    }
}
