//! Snapshots module - point-in-time portfolio captures and timeline playback.

mod snapshot_blob;
mod snapshot_errors;
mod snapshot_model;
mod snapshot_service;
mod snapshot_traits;

pub use snapshot_blob::{compress_loans, decompress_loans};
pub use snapshot_errors::SnapshotError;
pub use snapshot_model::{CurrencyDelta, CurrencySummary, PortfolioSnapshot, SnapshotMetadata};
pub use snapshot_service::SnapshotService;
pub use snapshot_traits::SnapshotRepositoryTrait;
