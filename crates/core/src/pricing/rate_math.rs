//! Pure rate and interest arithmetic.
//!
//! Everything here operates on `Decimal` and is side-effect free. Rounding
//! is half-up on the positive magnitude: currency amounts to 2 decimals,
//! rates to 4.

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::constants::{AMOUNT_SCALE, RATE_SCALE};

/// Rule for converting a calendar span into a year-fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DayCountConvention {
    /// 30/360: months count as 30 days, years as 360.
    #[default]
    #[serde(rename = "30/360")]
    Thirty360,
    /// Actual days elapsed over a 360-day year.
    #[serde(rename = "actual/360")]
    Actual360,
    /// Actual days elapsed over a 365-day year.
    #[serde(rename = "actual/365")]
    Actual365,
}

/// Simple or compound application of the effective rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccrualMethod {
    #[default]
    Simple,
    Compound,
}

/// Rounds a currency amount to 2 decimals, half-up.
pub fn round_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a rate to 4 decimals, half-up.
pub fn round_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// All-in rate: base rate plus spread, rounded to rate precision.
pub fn effective_rate(base_rate: Decimal, spread: Decimal) -> Decimal {
    round_rate(base_rate + spread)
}

/// Year-fraction between two dates under the given convention.
///
/// Negative spans (end before start) yield a zero fraction rather than a
/// negative accrual.
pub fn day_count_fraction(start: NaiveDate, end: NaiveDate, convention: DayCountConvention) -> Decimal {
    if end <= start {
        return Decimal::ZERO;
    }
    match convention {
        DayCountConvention::Thirty360 => {
            // 31st clamps to the 30th on both ends.
            let d1 = start.day().min(30) as i64;
            let d2 = end.day().min(30) as i64;
            let days = (end.year() as i64 - start.year() as i64) * 360
                + (end.month() as i64 - start.month() as i64) * 30
                + (d2 - d1);
            Decimal::from(days) / Decimal::from(360)
        }
        DayCountConvention::Actual360 => {
            Decimal::from((end - start).num_days()) / Decimal::from(360)
        }
        DayCountConvention::Actual365 => {
            Decimal::from((end - start).num_days()) / Decimal::from(365)
        }
    }
}

/// Simple interest: `principal * rate * fraction`, rounded to an amount.
pub fn simple_interest(principal: Decimal, rate: Decimal, fraction: Decimal) -> Decimal {
    round_amount(principal * rate * fraction)
}

/// Compound interest over a portion of one compounding year:
/// `principal * ((1 + rate)^fraction - 1)`, rounded to an amount.
///
/// The fractional exponent has no exact decimal representation, so the
/// power is taken through `f64` and the product rounded back to amount
/// precision. Well within tolerance for rates and horizons seen here.
pub fn compound_interest(principal: Decimal, rate: Decimal, fraction: Decimal) -> Decimal {
    if fraction.is_zero() || rate.is_zero() {
        return Decimal::ZERO;
    }
    let base = Decimal::ONE + rate;
    let grown = match base.checked_powd(fraction) {
        Some(v) => v,
        None => {
            // powd can overflow for extreme inputs; fall back through f64.
            let approx = base.to_f64().unwrap_or(1.0).powf(fraction.to_f64().unwrap_or(0.0));
            Decimal::from_f64_retain(approx).unwrap_or(Decimal::ONE)
        }
    };
    round_amount(principal * (grown - Decimal::ONE))
}

/// Interest for a principal over a date span, dispatching on accrual method.
pub fn accrued_interest(
    principal: Decimal,
    rate: Decimal,
    start: NaiveDate,
    end: NaiveDate,
    convention: DayCountConvention,
    method: AccrualMethod,
) -> Decimal {
    let fraction = day_count_fraction(start, end, convention);
    match method {
        AccrualMethod::Simple => simple_interest(principal, rate, fraction),
        AccrualMethod::Compound => compound_interest(principal, rate, fraction),
    }
}
