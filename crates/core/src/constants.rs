//! Shared constants for the finvoice core.

/// Decimal places for currency amounts.
pub const AMOUNT_SCALE: u32 = 2;

/// Decimal places for interest rates.
pub const RATE_SCALE: u32 = 4;

/// Default number of snapshots retained per customer before pruning.
pub const SNAPSHOT_RETENTION_DEFAULT: usize = 100;

/// Default page size for snapshot timeline queries.
pub const TIMELINE_PAGE_SIZE: i64 = 20;

/// Tolerance when validating that explicit split percentages sum to 1.
pub const SPLIT_PERCENTAGE_TOLERANCE: &str = "0.0001";
