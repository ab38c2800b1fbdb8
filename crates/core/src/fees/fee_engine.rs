//! Fee amount calculation.

use rust_decimal::Decimal;

use super::fees_model::{Fee, FeeCalculationType};
use crate::pricing::round_amount;

/// Computes a fee's monetary amount from its configuration and a resolved
/// basis amount.
///
/// A waived fee is always zero, regardless of type; its configuration is
/// left untouched so un-waiving restores the prior amount on the next
/// recalculation.
pub fn calculate_fee(fee: &Fee, basis_amount: Decimal) -> Decimal {
    if fee.is_waived {
        return Decimal::ZERO;
    }
    match fee.calculation_type {
        FeeCalculationType::Flat => fee.flat_amount,
        FeeCalculationType::Percentage => round_amount(basis_amount * fee.rate),
        FeeCalculationType::Tiered => tiered_amount(fee, basis_amount),
    }
}

/// Walks the tiers ascending by `min_amount`, consuming the basis amount
/// progressively. Tier coverage is validated at config-save time, not here.
fn tiered_amount(fee: &Fee, basis_amount: Decimal) -> Decimal {
    let mut tiers = fee.tiers.clone();
    tiers.sort_by(|a, b| a.min_amount.cmp(&b.min_amount));

    let mut remaining = basis_amount;
    let mut total = Decimal::ZERO;
    for tier in &tiers {
        if remaining <= Decimal::ZERO {
            break;
        }
        let band_width = match tier.max_amount {
            Some(max) => max - tier.min_amount,
            None => remaining,
        };
        let amount_in_tier = remaining.min(band_width);
        if amount_in_tier > Decimal::ZERO {
            total += amount_in_tier * tier.rate;
            remaining -= amount_in_tier;
        }
    }
    round_amount(total)
}
