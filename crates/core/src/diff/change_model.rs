//! Change records emitted by the structural diff and the classified
//! change buckets consumed by snapshots.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single field-level difference between two versions of a value tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    /// Dotted path to the changed field, e.g. `pricing.baseRate`.
    pub field_path: String,
    pub old_value: Value,
    pub new_value: Value,
}

/// What happened to a child record between two versions of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Deleted,
    Modified,
    Moved,
}

/// A fee-level mutation on a loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeChange {
    pub loan_id: String,
    pub fee_id: String,
    pub fee_name: String,
    pub kind: ChangeKind,
}

/// A pricing-rate mutation, carrying the before/after effective rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateChange {
    pub loan_id: String,
    pub old_effective_rate: rust_decimal::Decimal,
    pub new_effective_rate: rust_decimal::Decimal,
}

/// An invoice-level mutation on a loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceChange {
    pub loan_id: String,
    pub invoice_id: String,
    pub kind: ChangeKind,
}

/// A status or pricing-status transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub loan_id: String,
    pub field: String,
    pub old_value: String,
    pub new_value: String,
}

/// Classified mutations between two versions of a customer's loan list,
/// bucketed the way the snapshot timeline displays them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoanChangeSet {
    #[serde(default)]
    pub fees: Vec<FeeChange>,
    #[serde(default)]
    pub rates: Vec<RateChange>,
    #[serde(default)]
    pub invoices: Vec<InvoiceChange>,
    #[serde(default)]
    pub statuses: Vec<StatusChange>,
}

impl LoanChangeSet {
    pub fn is_empty(&self) -> bool {
        self.fees.is_empty()
            && self.rates.is_empty()
            && self.invoices.is_empty()
            && self.statuses.is_empty()
    }

    /// Total number of classified mutations across all buckets.
    pub fn change_count(&self) -> usize {
        self.fees.len() + self.rates.len() + self.invoices.len() + self.statuses.len()
    }
}
