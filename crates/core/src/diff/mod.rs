//! Diff module - structural change detection and loan change classification.

mod change_detector;
mod change_model;

pub use change_detector::{classify_loan_changes, diff};
pub use change_model::{
    ChangeKind, ChangeRecord, FeeChange, InvoiceChange, LoanChangeSet, RateChange, StatusChange,
};
