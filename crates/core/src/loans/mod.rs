//! Loans module - aggregate models, recalculation, previews, and splitting.

mod loans_errors;
mod loans_model;
mod loans_service;
mod loans_traits;
mod preview_service;
mod recalculator;
mod splitter;

pub use loans_errors::LoanError;
pub use loans_model::{
    BatchItemResult, Invoice, InvoiceStatus, InvoiceUpdate, Loan, LoanStatus, NewInvoice,
    NewLoan, Pricing, PricingPatch, PricingStatus, RatePatch, SplitPartition,
};
pub use loans_service::LoanService;
pub use loans_traits::{LoanRepositoryTrait, LoanServiceTrait};
pub use preview_service::{FeeChangeset, FullPreview, PreviewEngine, PricingPreview};
pub use recalculator::LoanRecalculator;
pub use splitter::split_loan;

#[cfg(test)]
mod recalculator_tests;
