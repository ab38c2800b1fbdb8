//! Loan splitting: partition a loan's invoices into child loans.

use std::collections::HashSet;
use std::str::FromStr;

use rust_decimal::Decimal;
use uuid::Uuid;

use super::loans_errors::LoanError;
use super::loans_model::{Loan, LoanStatus, PricingStatus, SplitPartition};
use crate::constants::SPLIT_PERCENTAGE_TOLERANCE;
use crate::errors::Result;
use crate::fees::FeeCalculationType;
use crate::pricing::round_amount;

/// Partitions a parent loan's invoices (and proportionally its flat fees)
/// into child loans.
///
/// Every parent invoice id must appear in exactly one partition, and each
/// partition must match at least one invoice. If any partition carries an
/// explicit percentage, all must, and they must sum to 1 within tolerance.
///
/// Children inherit the parent's pricing block verbatim and start as
/// pending drafts; their derived fields are rederived by the caller's
/// first recalculation.
pub fn split_loan(parent: &Loan, partitions: &[SplitPartition]) -> Result<Vec<Loan>> {
    validate_partitions(parent, partitions)?;

    let explicit = partitions.iter().any(|p| p.percentage.is_some());
    if explicit {
        validate_percentages(partitions)?;
    }

    let mut children = Vec::with_capacity(partitions.len());
    for partition in partitions {
        let ids: HashSet<&str> = partition.invoice_ids.iter().map(String::as_str).collect();
        let invoices: Vec<_> = parent
            .invoices
            .iter()
            .filter(|i| ids.contains(i.id.as_str()))
            .cloned()
            .collect();

        let child_total: Decimal = invoices.iter().map(|i| i.amount).sum();
        let ratio = match partition.percentage {
            Some(p) => p,
            None => {
                if parent.total_amount.is_zero() {
                    Decimal::ZERO
                } else {
                    child_total / parent.total_amount
                }
            }
        };

        let fees = parent
            .fees
            .iter()
            .map(|fee| {
                let mut child_fee = fee.clone();
                child_fee.id = Uuid::new_v4().to_string();
                child_fee.calculated_amount = Decimal::ZERO;
                child_fee.is_paid = false;
                if child_fee.calculation_type == FeeCalculationType::Flat {
                    // Flat amounts scale with the allocation; rate-based fees
                    // re-derive against the child's own basis.
                    child_fee.flat_amount = round_amount(fee.flat_amount * ratio);
                }
                child_fee
            })
            .collect();

        children.push(Loan {
            id: Uuid::new_v4().to_string(),
            customer_id: parent.customer_id.clone(),
            currency: parent.currency.clone(),
            total_amount: child_total,
            outstanding_amount: child_total,
            start_date: parent.start_date,
            maturity_date: parent.maturity_date,
            pricing: parent.pricing.clone(),
            invoices,
            fees,
            total_fees: Decimal::ZERO,
            total_invoice_amount: Decimal::ZERO,
            interest_amount: Decimal::ZERO,
            net_proceeds: Decimal::ZERO,
            pricing_status: PricingStatus::Pending,
            status: LoanStatus::Draft,
        });
    }
    Ok(children)
}

fn validate_partitions(parent: &Loan, partitions: &[SplitPartition]) -> Result<()> {
    if partitions.len() < 2 {
        return Err(LoanError::InvalidPartition(
            "A split requires at least two partitions".to_string(),
        )
        .into());
    }

    let parent_ids: HashSet<&str> = parent.invoices.iter().map(|i| i.id.as_str()).collect();
    let mut seen: HashSet<&str> = HashSet::new();

    for (idx, partition) in partitions.iter().enumerate() {
        if partition.invoice_ids.is_empty() {
            return Err(LoanError::InvalidPartition(format!(
                "Partition {} matches no invoices",
                idx
            ))
            .into());
        }
        for id in &partition.invoice_ids {
            if !parent_ids.contains(id.as_str()) {
                return Err(LoanError::InvalidPartition(format!(
                    "Invoice {} does not belong to loan {}",
                    id, parent.id
                ))
                .into());
            }
            if !seen.insert(id.as_str()) {
                return Err(LoanError::InvalidPartition(format!(
                    "Invoice {} appears in more than one partition",
                    id
                ))
                .into());
            }
        }
    }

    if seen.len() != parent_ids.len() {
        return Err(LoanError::InvalidPartition(
            "Every parent invoice must be assigned to a partition".to_string(),
        )
        .into());
    }
    Ok(())
}

fn validate_percentages(partitions: &[SplitPartition]) -> Result<()> {
    let mut sum = Decimal::ZERO;
    for partition in partitions {
        match partition.percentage {
            Some(p) => sum += p,
            None => {
                return Err(LoanError::InvalidPartition(
                    "Either all partitions or none must carry an explicit percentage".to_string(),
                )
                .into())
            }
        }
    }
    let tolerance = Decimal::from_str(SPLIT_PERCENTAGE_TOLERANCE)
        .unwrap_or_else(|_| Decimal::new(1, 4));
    if (sum - Decimal::ONE).abs() > tolerance {
        return Err(LoanError::InvalidPartition(format!(
            "Explicit percentages must sum to 1, got {}",
            sum
        ))
        .into());
    }
    Ok(())
}
