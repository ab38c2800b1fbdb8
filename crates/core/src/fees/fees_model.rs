//! Fee domain models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Error, Result, ValidationError};

/// How a fee's monetary amount is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeeCalculationType {
    /// Fixed configured amount; ignores any basis.
    #[default]
    Flat,
    /// `basis * rate`.
    Percentage,
    /// Progressive rate bands applied across the basis.
    Tiered,
}

/// Which monetary figure a percentage or tiered rate applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeeBasis {
    #[default]
    Principal,
    Outstanding,
    TotalInvoices,
}

/// One band of a tiered fee schedule. `max_amount = None` means unbounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeTier {
    pub min_amount: Decimal,
    pub max_amount: Option<Decimal>,
    pub rate: Decimal,
}

/// A fee attached to a loan.
///
/// `calculated_amount` is derived and always current after recalculation.
/// Waiving forces the amount to zero but preserves the configuration so
/// un-waiving restores prior numbers without reconfiguration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Fee {
    pub id: String,
    pub name: String,
    /// Template this fee was instantiated from, if any.
    pub fee_config_id: Option<String>,
    pub calculation_type: FeeCalculationType,
    pub basis: FeeBasis,
    #[serde(default)]
    pub flat_amount: Decimal,
    #[serde(default)]
    pub rate: Decimal,
    #[serde(default)]
    pub tiers: Vec<FeeTier>,
    #[serde(default)]
    pub calculated_amount: Decimal,
    #[serde(default)]
    pub is_waived: bool,
    /// Set when the fee's value diverges from its template.
    #[serde(default)]
    pub is_overridden: bool,
    /// Paid fees are frozen against further edits.
    #[serde(default)]
    pub is_paid: bool,
}

/// Input model for attaching a fee to a loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFee {
    pub name: String,
    pub fee_config_id: Option<String>,
    pub calculation_type: FeeCalculationType,
    #[serde(default)]
    pub basis: FeeBasis,
    #[serde(default)]
    pub flat_amount: Decimal,
    #[serde(default)]
    pub rate: Decimal,
    #[serde(default)]
    pub tiers: Vec<FeeTier>,
}

impl NewFee {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Fee name cannot be empty".to_string(),
            )));
        }
        if self.rate.is_sign_negative() || self.flat_amount.is_sign_negative() {
            return Err(Error::Validation(ValidationError::OutOfRange(
                "Fee rate and flat amount must be non-negative".to_string(),
            )));
        }
        Ok(())
    }

    pub fn into_fee(self) -> Fee {
        Fee {
            id: Uuid::new_v4().to_string(),
            name: self.name,
            fee_config_id: self.fee_config_id,
            calculation_type: self.calculation_type,
            basis: self.basis,
            flat_amount: self.flat_amount,
            rate: self.rate,
            tiers: self.tiers,
            calculated_amount: Decimal::ZERO,
            is_waived: false,
            is_overridden: false,
            is_paid: false,
        }
    }
}

/// Partial update to a fee's configuration.
///
/// Applying any configuration field to a template-derived fee marks it
/// overridden. Waiving is tracked separately and never clears the
/// configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeeUpdate {
    pub name: Option<String>,
    pub calculation_type: Option<FeeCalculationType>,
    pub basis: Option<FeeBasis>,
    pub flat_amount: Option<Decimal>,
    pub rate: Option<Decimal>,
    pub tiers: Option<Vec<FeeTier>>,
    pub is_waived: Option<bool>,
}

impl FeeUpdate {
    /// True when the update changes configuration (not just the waive flag).
    pub fn touches_configuration(&self) -> bool {
        self.name.is_some()
            || self.calculation_type.is_some()
            || self.basis.is_some()
            || self.flat_amount.is_some()
            || self.rate.is_some()
            || self.tiers.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(rate) = self.rate {
            if rate.is_sign_negative() {
                return Err(Error::Validation(ValidationError::OutOfRange(
                    "Fee rate must be non-negative".to_string(),
                )));
            }
        }
        if let Some(flat) = self.flat_amount {
            if flat.is_sign_negative() {
                return Err(Error::Validation(ValidationError::OutOfRange(
                    "Fee flat amount must be non-negative".to_string(),
                )));
            }
        }
        Ok(())
    }

    /// Applies the patch to a fee in place.
    pub fn apply_to(&self, fee: &mut Fee) {
        if self.touches_configuration() && fee.fee_config_id.is_some() {
            fee.is_overridden = true;
        }
        if let Some(name) = &self.name {
            fee.name = name.clone();
        }
        if let Some(calculation_type) = self.calculation_type {
            fee.calculation_type = calculation_type;
        }
        if let Some(basis) = self.basis {
            fee.basis = basis;
        }
        if let Some(flat_amount) = self.flat_amount {
            fee.flat_amount = flat_amount;
        }
        if let Some(rate) = self.rate {
            fee.rate = rate;
        }
        if let Some(tiers) = &self.tiers {
            fee.tiers = tiers.clone();
        }
        if let Some(is_waived) = self.is_waived {
            fee.is_waived = is_waived;
        }
    }
}

/// A fee update addressed by id, as carried in preview changesets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeUpdateItem {
    pub fee_id: String,
    #[serde(flatten)]
    pub patch: FeeUpdate,
}

/// A reusable fee template, used to default fees added to loans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeConfig {
    pub id: String,
    pub name: String,
    pub calculation_type: FeeCalculationType,
    #[serde(default)]
    pub basis: FeeBasis,
    #[serde(default)]
    pub flat_amount: Decimal,
    #[serde(default)]
    pub rate: Decimal,
    #[serde(default)]
    pub tiers: Vec<FeeTier>,
}

impl FeeConfig {
    /// Validates the template, including tier coverage for tiered fees.
    ///
    /// The calculation engine itself tolerates whatever tiers it is given;
    /// gaps and overlaps are rejected here, at save time, so a template can
    /// never silently under- or over-charge.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Fee config name cannot be empty".to_string(),
            )));
        }
        if self.calculation_type != FeeCalculationType::Tiered {
            return Ok(());
        }
        if self.tiers.is_empty() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Tiered fee config requires at least one tier".to_string(),
            )));
        }

        let mut tiers = self.tiers.clone();
        tiers.sort_by(|a, b| a.min_amount.cmp(&b.min_amount));

        if !tiers[0].min_amount.is_zero() {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "First tier must start at 0".to_string(),
            )));
        }
        for pair in tiers.windows(2) {
            let upper = match pair[0].max_amount {
                Some(max) => max,
                None => {
                    return Err(Error::Validation(ValidationError::InvalidInput(
                        "Only the last tier may be unbounded".to_string(),
                    )))
                }
            };
            if upper != pair[1].min_amount {
                return Err(Error::Validation(ValidationError::InvalidInput(format!(
                    "Tiers must be contiguous: tier ending at {} is followed by tier starting at {}",
                    upper, pair[1].min_amount
                ))));
            }
        }
        if let Some(last) = tiers.last() {
            if last.max_amount.is_some() {
                return Err(Error::Validation(ValidationError::InvalidInput(
                    "Last tier must be unbounded".to_string(),
                )));
            }
        }
        Ok(())
    }

    /// Instantiates a fee from this template.
    pub fn to_fee(&self) -> Fee {
        Fee {
            id: Uuid::new_v4().to_string(),
            name: self.name.clone(),
            fee_config_id: Some(self.id.clone()),
            calculation_type: self.calculation_type,
            basis: self.basis,
            flat_amount: self.flat_amount,
            rate: self.rate,
            tiers: self.tiers.clone(),
            calculated_amount: Decimal::ZERO,
            is_waived: false,
            is_overridden: false,
            is_paid: false,
        }
    }
}
