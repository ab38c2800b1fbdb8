//! Finvoice Core - Domain entities, services, and traits.
//!
//! This crate contains the pricing, fee, and snapshot logic for the finvoice
//! loan administration system. It is database-agnostic and defines traits
//! that are implemented by storage crates such as `storage-memory`.

pub mod audit;
pub mod constants;
pub mod context;
pub mod diff;
pub mod errors;
pub mod fees;
pub mod fx;
pub mod loans;
pub mod pricing;
pub mod snapshots;
pub mod utils;

// Re-export common types from the loan and snapshot modules
pub use loans::*;
pub use snapshots::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
