use thiserror::Error;

/// Errors raised by loan operations.
#[derive(Error, Debug)]
pub enum LoanError {
    #[error("Loan not found: {0}")]
    NotFound(String),

    #[error("Fee not found: {0}")]
    FeeNotFound(String),

    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    #[error("Loan {0} pricing is locked")]
    Locked(String),

    #[error("Fee {0} has been paid and can no longer be edited")]
    FeePaid(String),

    #[error("Invalid split partition: {0}")]
    InvalidPartition(String),
}
