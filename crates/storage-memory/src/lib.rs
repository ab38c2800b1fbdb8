//! In-memory storage implementation for finvoice.
//!
//! This crate implements the repository traits defined in `finvoice-core`
//! over concurrent maps. It backs tests and single-process deployments;
//! a durable backend implements the same traits without touching the core.
//!
//! This crate is the only place where storage mechanics exist. The core
//! is storage-agnostic and works with traits.

pub mod audit;
pub mod fees;
pub mod fx;
pub mod loans;
pub mod snapshots;

pub use audit::InMemoryAuditRepository;
pub use fees::InMemoryFeeConfigRepository;
pub use fx::InMemoryFxRepository;
pub use loans::InMemoryLoanRepository;
pub use snapshots::InMemorySnapshotRepository;

// Re-export from finvoice-core for convenience
pub use finvoice_core::errors::{DatabaseError, Error, Result};
