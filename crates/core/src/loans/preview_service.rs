//! Pricing and fee previews against hypothetical inputs.
//!
//! Runs the same derivation as the mutation path against a clone of the
//! loan, so the UI can show projected figures without touching persisted
//! state.

use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::loans_model::{Loan, PricingPatch};
use super::recalculator::LoanRecalculator;
use crate::errors::Result;
use crate::fees::{FeeUpdateItem, NewFee};

/// Hypothetical fee changes applied during a full preview.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeeChangeset {
    #[serde(default)]
    pub adds: Vec<NewFee>,
    #[serde(default)]
    pub updates: Vec<FeeUpdateItem>,
    #[serde(default)]
    pub deletes: Vec<String>,
}

/// Projected pricing figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingPreview {
    pub effective_rate: Decimal,
    pub interest_amount: Decimal,
    pub net_proceeds: Decimal,
    pub total_fees: Decimal,
}

/// Projected figures alongside the stored originals, for UI diffing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullPreview {
    pub effective_rate: Decimal,
    pub interest_amount: Decimal,
    pub total_fees: Decimal,
    pub original_total_fees: Decimal,
    pub net_proceeds: Decimal,
    pub original_net_proceeds: Decimal,
}

/// Computes previews without mutating persisted state.
#[derive(Clone)]
pub struct PreviewEngine {
    recalculator: LoanRecalculator,
}

impl PreviewEngine {
    pub fn new(recalculator: LoanRecalculator) -> Self {
        Self { recalculator }
    }

    /// Projects the effect of a pricing patch.
    pub fn preview_pricing(&self, loan: &Loan, patch: &PricingPatch) -> Result<PricingPreview> {
        let working = self.project(loan, Some(patch), None)?;
        Ok(PricingPreview {
            effective_rate: working.pricing.effective_rate,
            interest_amount: working.interest_amount,
            net_proceeds: working.net_proceeds,
            total_fees: working.total_fees,
        })
    }

    /// Projects the combined effect of a pricing patch and a fee changeset.
    pub fn preview_full(
        &self,
        loan: &Loan,
        pricing_patch: Option<&PricingPatch>,
        fee_changeset: Option<&FeeChangeset>,
    ) -> Result<FullPreview> {
        let working = self.project(loan, pricing_patch, fee_changeset)?;
        Ok(FullPreview {
            effective_rate: working.pricing.effective_rate,
            interest_amount: working.interest_amount,
            total_fees: working.total_fees,
            original_total_fees: loan.total_fees,
            net_proceeds: working.net_proceeds,
            original_net_proceeds: loan.net_proceeds,
        })
    }

    fn project(
        &self,
        loan: &Loan,
        pricing_patch: Option<&PricingPatch>,
        fee_changeset: Option<&FeeChangeset>,
    ) -> Result<Loan> {
        let mut working = loan.clone();
        let mut dates_valid = true;

        if let Some(patch) = pricing_patch {
            if let Some(base_rate) = patch.base_rate {
                working.pricing.base_rate = base_rate;
            }
            if let Some(spread) = patch.spread {
                working.pricing.spread = spread;
            }
            if let Some(convention) = patch.day_count_convention {
                working.pricing.day_count_convention = convention;
            }
            if let Some(method) = patch.accrual_method {
                working.pricing.accrual_method = method;
            }
            if let Some(start) = &patch.start_date {
                match chrono::NaiveDate::parse_from_str(start, "%Y-%m-%d") {
                    Ok(date) => working.start_date = date,
                    Err(e) => {
                        warn!("Preview received invalid start date '{}': {}", start, e);
                        dates_valid = false;
                    }
                }
            }
            if let Some(maturity) = &patch.maturity_date {
                match chrono::NaiveDate::parse_from_str(maturity, "%Y-%m-%d") {
                    Ok(date) => working.maturity_date = date,
                    Err(e) => {
                        warn!("Preview received invalid maturity date '{}': {}", maturity, e);
                        dates_valid = false;
                    }
                }
            }
        }

        if let Some(changeset) = fee_changeset {
            working.fees.retain(|f| !changeset.deletes.contains(&f.id));
            for item in &changeset.updates {
                if let Some(fee) = working.fee_mut(&item.fee_id) {
                    item.patch.apply_to(fee);
                }
            }
            for new_fee in &changeset.adds {
                working.fees.push(new_fee.clone().into_fee());
            }
        }

        self.recalculator.recalculate(&mut working)?;

        if !dates_valid {
            // Fall back to the stored figure rather than accruing over a
            // span the caller never meant.
            working.interest_amount = loan.interest_amount;
            working.net_proceeds =
                working.total_amount - working.interest_amount - working.total_fees;
        }
        Ok(working)
    }
}
