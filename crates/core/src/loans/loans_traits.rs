use async_trait::async_trait;

use super::loans_model::{
    BatchItemResult, InvoiceUpdate, Loan, LoanStatus, NewInvoice, NewLoan, PricingPatch,
    RatePatch, SplitPartition,
};
use crate::context::RequestContext;
use crate::errors::Result;
use crate::fees::{FeeUpdate, NewFee};

/// Trait defining the contract for loan storage.
#[async_trait]
pub trait LoanRepositoryTrait: Send + Sync {
    fn get_by_id(&self, loan_id: &str) -> Result<Loan>;

    fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Loan>>;

    /// Inserts or replaces a loan by id.
    async fn save(&self, loan: Loan) -> Result<Loan>;

    async fn save_all(&self, loans: Vec<Loan>) -> Result<Vec<Loan>>;

    async fn delete(&self, loan_id: &str) -> Result<()>;
}

/// Trait defining the contract for loan mutations.
///
/// Every mutation runs the same pipeline: load, guard, mutate,
/// recalculate, persist, audit. Derived fields are therefore always
/// current after any call that returns a loan.
#[async_trait]
pub trait LoanServiceTrait: Send + Sync {
    async fn create_loan(&self, ctx: &RequestContext, new_loan: NewLoan) -> Result<Loan>;

    fn get_loan(&self, loan_id: &str) -> Result<Loan>;

    fn list_loans_for_customer(&self, customer_id: &str) -> Result<Vec<Loan>>;

    async fn update_pricing(
        &self,
        ctx: &RequestContext,
        loan_id: &str,
        patch: PricingPatch,
    ) -> Result<Loan>;

    /// Freezes pricing and fee fields; invoice statuses stay editable.
    async fn lock_pricing(&self, ctx: &RequestContext, loan_id: &str) -> Result<Loan>;

    async fn update_status(
        &self,
        ctx: &RequestContext,
        loan_id: &str,
        status: LoanStatus,
    ) -> Result<Loan>;

    /// Attaches a fee instantiated from a stored template.
    async fn add_fee_from_config(
        &self,
        ctx: &RequestContext,
        loan_id: &str,
        config_id: &str,
    ) -> Result<Loan>;

    async fn add_fee(&self, ctx: &RequestContext, loan_id: &str, new_fee: NewFee) -> Result<Loan>;

    async fn update_fee(
        &self,
        ctx: &RequestContext,
        loan_id: &str,
        fee_id: &str,
        patch: FeeUpdate,
    ) -> Result<Loan>;

    async fn remove_fee(&self, ctx: &RequestContext, loan_id: &str, fee_id: &str) -> Result<Loan>;

    /// Waives or un-waives a fee without clearing its configuration.
    async fn waive_fee(
        &self,
        ctx: &RequestContext,
        loan_id: &str,
        fee_id: &str,
        waived: bool,
    ) -> Result<Loan>;

    async fn add_invoice(
        &self,
        ctx: &RequestContext,
        loan_id: &str,
        new_invoice: NewInvoice,
    ) -> Result<Loan>;

    async fn update_invoice(
        &self,
        ctx: &RequestContext,
        loan_id: &str,
        invoice_id: &str,
        patch: InvoiceUpdate,
    ) -> Result<Loan>;

    async fn remove_invoice(
        &self,
        ctx: &RequestContext,
        loan_id: &str,
        invoice_id: &str,
    ) -> Result<Loan>;

    /// Reorders an invoice within the loan's ordered list.
    async fn move_invoice(
        &self,
        ctx: &RequestContext,
        loan_id: &str,
        invoice_id: &str,
        new_index: usize,
    ) -> Result<Loan>;

    /// Partitions a loan's invoices into child loans. The parent is
    /// cancelled; children start as drafts with the parent's pricing.
    async fn split_loan(
        &self,
        ctx: &RequestContext,
        loan_id: &str,
        partitions: Vec<SplitPartition>,
    ) -> Result<Vec<Loan>>;

    /// Applies rate patches to many loans concurrently, multi-status.
    async fn batch_update_rates(
        &self,
        ctx: &RequestContext,
        patches: Vec<RatePatch>,
    ) -> Result<Vec<BatchItemResult>>;
}
