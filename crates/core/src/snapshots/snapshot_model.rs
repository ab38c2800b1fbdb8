//! Snapshot domain models.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::diff::LoanChangeSet;

/// Per-currency aggregate over a customer's loans at snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CurrencySummary {
    pub loan_count: usize,
    pub total_amount: Decimal,
    pub total_fees: Decimal,
    pub total_interest: Decimal,
    pub net_proceeds: Decimal,
    /// Amount-weighted mean effective rate; zero when the currency group's
    /// total amount is zero.
    pub avg_rate: Decimal,
}

/// Per-currency change versus the previous snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyDelta {
    pub fees_change: Decimal,
    pub interest_change: Decimal,
    pub net_proceeds_change: Decimal,
    /// Average-rate movement expressed in basis points.
    pub avg_rate_change_bps: Decimal,
}

/// Snapshot header: everything the timeline renders, without the blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotMetadata {
    pub id: String,
    pub customer_id: String,
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub user_name: String,
    pub summary: HashMap<String, CurrencySummary>,
    /// `None` for the customer's first snapshot.
    pub delta: Option<HashMap<String, CurrencyDelta>>,
    pub changes: LoanChangeSet,
    pub change_count: usize,
}

/// A full snapshot record: metadata plus the compressed loan blob.
///
/// Immutable once created; snapshots are append-only per customer and
/// ordered by timestamp. The blob never leaves the storage boundary:
/// callers see either the metadata or the decompressed loans.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSnapshot {
    pub metadata: SnapshotMetadata,
    /// Gzip-compressed JSON array of the customer's full loans.
    pub blob: Vec<u8>,
}
