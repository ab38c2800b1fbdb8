use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use log::{debug, error};

use super::loans_errors::LoanError;
use super::loans_model::{
    BatchItemResult, InvoiceUpdate, Loan, LoanStatus, NewInvoice, NewLoan, PricingPatch,
    PricingStatus, RatePatch, SplitPartition,
};
use super::loans_traits::{LoanRepositoryTrait, LoanServiceTrait};
use super::recalculator::LoanRecalculator;
use super::splitter::split_loan;
use crate::audit::{AuditEntry, AuditRepositoryTrait};
use crate::context::RequestContext;
use crate::diff::diff;
use crate::errors::{DatabaseError, Error, Result};
use crate::fees::{FeeConfigRepositoryTrait, FeeUpdate, NewFee};
use crate::utils::Clock;

/// Service for loan mutations.
///
/// Owns the recalculate-then-persist pipeline: no mutation reaches the
/// repository without its derived fields rederived, and every persisted
/// mutation leaves an audit entry built from the structural diff of the
/// loan before and after.
pub struct LoanService {
    repository: Arc<dyn LoanRepositoryTrait>,
    fee_configs: Arc<dyn FeeConfigRepositoryTrait>,
    audit: Arc<dyn AuditRepositoryTrait>,
    recalculator: LoanRecalculator,
    clock: Arc<dyn Clock>,
}

impl LoanService {
    pub fn new(
        repository: Arc<dyn LoanRepositoryTrait>,
        fee_configs: Arc<dyn FeeConfigRepositoryTrait>,
        audit: Arc<dyn AuditRepositoryTrait>,
        recalculator: LoanRecalculator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            fee_configs,
            audit,
            recalculator,
            clock,
        }
    }

    /// Loads a loan, surfacing a repository miss as the domain error.
    fn load(&self, loan_id: &str) -> Result<Loan> {
        match self.repository.get_by_id(loan_id) {
            Err(Error::Database(DatabaseError::NotFound(_))) => {
                Err(LoanError::NotFound(loan_id.to_string()).into())
            }
            other => other,
        }
    }

    fn guard_unlocked(loan: &Loan) -> Result<()> {
        if loan.is_locked() {
            return Err(LoanError::Locked(loan.id.clone()).into());
        }
        Ok(())
    }

    fn guard_fee_unpaid(loan: &Loan, fee_id: &str) -> Result<()> {
        let fee = loan
            .fee(fee_id)
            .ok_or_else(|| LoanError::FeeNotFound(fee_id.to_string()))?;
        if fee.is_paid {
            return Err(LoanError::FeePaid(fee_id.to_string()).into());
        }
        Ok(())
    }

    /// Recalculates, persists, and audits a mutated loan.
    async fn finish(
        &self,
        ctx: &RequestContext,
        action: &str,
        old_loan: &Loan,
        mut loan: Loan,
    ) -> Result<Loan> {
        self.recalculator.recalculate(&mut loan)?;
        let saved = self.repository.save(loan).await?;
        self.append_audit(ctx, action, old_loan, &saved).await;
        Ok(saved)
    }

    /// Audit failures are logged, never allowed to fail the mutation that
    /// already persisted.
    async fn append_audit(&self, ctx: &RequestContext, action: &str, old_loan: &Loan, new_loan: &Loan) {
        let old_value = serde_json::to_value(old_loan).unwrap_or_default();
        let new_value = serde_json::to_value(new_loan).unwrap_or_default();
        let changes = diff(&old_value, &new_value);
        if changes.is_empty() && action == "update" {
            return;
        }
        let entry = AuditEntry::new(ctx, "loan", &new_loan.id, action, changes, self.clock.now());
        if let Err(e) = self.audit.append(entry).await {
            error!("Failed to append audit entry for loan {}: {}", new_loan.id, e);
        }
    }

    fn parse_date(value: &str) -> Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(value, "%Y-%m-%d")?)
    }

    async fn apply_rate_patch(&self, ctx: &RequestContext, patch: &RatePatch) -> Result<Loan> {
        self.update_pricing(
            ctx,
            &patch.loan_id,
            PricingPatch {
                base_rate: patch.base_rate,
                spread: patch.spread,
                ..PricingPatch::default()
            },
        )
        .await
    }
}

#[async_trait::async_trait]
impl LoanServiceTrait for LoanService {
    async fn create_loan(&self, ctx: &RequestContext, new_loan: NewLoan) -> Result<Loan> {
        new_loan.validate()?;
        for invoice in &new_loan.invoices {
            invoice.validate()?;
        }
        let mut loan = new_loan.into_loan();
        debug!("Creating loan {} for customer {}", loan.id, loan.customer_id);
        self.recalculator.recalculate(&mut loan)?;
        let saved = self.repository.save(loan).await?;
        let entry = AuditEntry::new(ctx, "loan", &saved.id, "create", Vec::new(), self.clock.now());
        if let Err(e) = self.audit.append(entry).await {
            error!("Failed to append audit entry for loan {}: {}", saved.id, e);
        }
        Ok(saved)
    }

    fn get_loan(&self, loan_id: &str) -> Result<Loan> {
        self.load(loan_id)
    }

    fn list_loans_for_customer(&self, customer_id: &str) -> Result<Vec<Loan>> {
        self.repository.list_by_customer(customer_id)
    }

    async fn update_pricing(
        &self,
        ctx: &RequestContext,
        loan_id: &str,
        patch: PricingPatch,
    ) -> Result<Loan> {
        let old_loan = self.load(loan_id)?;
        Self::guard_unlocked(&old_loan)?;

        let mut loan = old_loan.clone();
        if let Some(base_rate) = patch.base_rate {
            loan.pricing.base_rate = base_rate;
        }
        if let Some(spread) = patch.spread {
            loan.pricing.spread = spread;
        }
        if let Some(convention) = patch.day_count_convention {
            loan.pricing.day_count_convention = convention;
        }
        if let Some(method) = patch.accrual_method {
            loan.pricing.accrual_method = method;
        }
        if let Some(start) = &patch.start_date {
            loan.start_date = Self::parse_date(start)?;
        }
        if let Some(maturity) = &patch.maturity_date {
            loan.maturity_date = Self::parse_date(maturity)?;
        }
        if loan.pricing_status == PricingStatus::Pending {
            loan.pricing_status = PricingStatus::Priced;
        }
        self.finish(ctx, "update", &old_loan, loan).await
    }

    async fn lock_pricing(&self, ctx: &RequestContext, loan_id: &str) -> Result<Loan> {
        let old_loan = self.load(loan_id)?;
        Self::guard_unlocked(&old_loan)?;
        let mut loan = old_loan.clone();
        loan.pricing_status = PricingStatus::Locked;
        self.finish(ctx, "lock_pricing", &old_loan, loan).await
    }

    async fn update_status(
        &self,
        ctx: &RequestContext,
        loan_id: &str,
        status: LoanStatus,
    ) -> Result<Loan> {
        let old_loan = self.load(loan_id)?;
        let mut loan = old_loan.clone();
        loan.status = status;
        self.finish(ctx, "update_status", &old_loan, loan).await
    }

    async fn add_fee_from_config(
        &self,
        ctx: &RequestContext,
        loan_id: &str,
        config_id: &str,
    ) -> Result<Loan> {
        let old_loan = self.load(loan_id)?;
        Self::guard_unlocked(&old_loan)?;
        let config = self.fee_configs.get_by_id(config_id)?;
        let mut loan = old_loan.clone();
        loan.fees.push(config.to_fee());
        self.finish(ctx, "add_fee", &old_loan, loan).await
    }

    async fn add_fee(&self, ctx: &RequestContext, loan_id: &str, new_fee: NewFee) -> Result<Loan> {
        new_fee.validate()?;
        let old_loan = self.load(loan_id)?;
        Self::guard_unlocked(&old_loan)?;
        let mut loan = old_loan.clone();
        loan.fees.push(new_fee.into_fee());
        self.finish(ctx, "add_fee", &old_loan, loan).await
    }

    async fn update_fee(
        &self,
        ctx: &RequestContext,
        loan_id: &str,
        fee_id: &str,
        patch: FeeUpdate,
    ) -> Result<Loan> {
        patch.validate()?;
        let old_loan = self.load(loan_id)?;
        Self::guard_unlocked(&old_loan)?;
        Self::guard_fee_unpaid(&old_loan, fee_id)?;
        let mut loan = old_loan.clone();
        let fee = loan
            .fee_mut(fee_id)
            .ok_or_else(|| LoanError::FeeNotFound(fee_id.to_string()))?;
        patch.apply_to(fee);
        self.finish(ctx, "update_fee", &old_loan, loan).await
    }

    async fn remove_fee(&self, ctx: &RequestContext, loan_id: &str, fee_id: &str) -> Result<Loan> {
        let old_loan = self.load(loan_id)?;
        Self::guard_unlocked(&old_loan)?;
        Self::guard_fee_unpaid(&old_loan, fee_id)?;
        let mut loan = old_loan.clone();
        let before = loan.fees.len();
        loan.fees.retain(|f| f.id != fee_id);
        if loan.fees.len() == before {
            return Err(LoanError::FeeNotFound(fee_id.to_string()).into());
        }
        self.finish(ctx, "remove_fee", &old_loan, loan).await
    }

    async fn waive_fee(
        &self,
        ctx: &RequestContext,
        loan_id: &str,
        fee_id: &str,
        waived: bool,
    ) -> Result<Loan> {
        let old_loan = self.load(loan_id)?;
        Self::guard_unlocked(&old_loan)?;
        Self::guard_fee_unpaid(&old_loan, fee_id)?;
        let mut loan = old_loan.clone();
        let fee = loan
            .fee_mut(fee_id)
            .ok_or_else(|| LoanError::FeeNotFound(fee_id.to_string()))?;
        fee.is_waived = waived;
        self.finish(ctx, "waive_fee", &old_loan, loan).await
    }

    async fn add_invoice(
        &self,
        ctx: &RequestContext,
        loan_id: &str,
        new_invoice: NewInvoice,
    ) -> Result<Loan> {
        new_invoice.validate()?;
        let old_loan = self.load(loan_id)?;
        Self::guard_unlocked(&old_loan)?;
        let mut loan = old_loan.clone();
        loan.invoices.push(new_invoice.into_invoice());
        self.finish(ctx, "add_invoice", &old_loan, loan).await
    }

    async fn update_invoice(
        &self,
        ctx: &RequestContext,
        loan_id: &str,
        invoice_id: &str,
        patch: InvoiceUpdate,
    ) -> Result<Loan> {
        let old_loan = self.load(loan_id)?;
        // Status-only edits stay open after lock; amount-bearing ones do not.
        if patch.touches_amount_fields() {
            Self::guard_unlocked(&old_loan)?;
        }
        let mut loan = old_loan.clone();
        let invoice = loan
            .invoice_mut(invoice_id)
            .ok_or_else(|| LoanError::InvoiceNotFound(invoice_id.to_string()))?;
        if let Some(amount) = patch.amount {
            invoice.amount = amount;
        }
        if let Some(currency) = &patch.currency {
            invoice.currency = currency.clone();
        }
        if let Some(issue_date) = patch.issue_date {
            invoice.issue_date = issue_date;
        }
        if let Some(due_date) = patch.due_date {
            invoice.due_date = due_date;
        }
        if let Some(status) = patch.status {
            invoice.status = status;
        }
        self.finish(ctx, "update_invoice", &old_loan, loan).await
    }

    async fn remove_invoice(
        &self,
        ctx: &RequestContext,
        loan_id: &str,
        invoice_id: &str,
    ) -> Result<Loan> {
        let old_loan = self.load(loan_id)?;
        Self::guard_unlocked(&old_loan)?;
        let mut loan = old_loan.clone();
        let before = loan.invoices.len();
        loan.invoices.retain(|i| i.id != invoice_id);
        if loan.invoices.len() == before {
            return Err(LoanError::InvoiceNotFound(invoice_id.to_string()).into());
        }
        self.finish(ctx, "remove_invoice", &old_loan, loan).await
    }

    async fn move_invoice(
        &self,
        ctx: &RequestContext,
        loan_id: &str,
        invoice_id: &str,
        new_index: usize,
    ) -> Result<Loan> {
        let old_loan = self.load(loan_id)?;
        let mut loan = old_loan.clone();
        let current = loan
            .invoices
            .iter()
            .position(|i| i.id == invoice_id)
            .ok_or_else(|| LoanError::InvoiceNotFound(invoice_id.to_string()))?;
        let invoice = loan.invoices.remove(current);
        let target = new_index.min(loan.invoices.len());
        loan.invoices.insert(target, invoice);
        self.finish(ctx, "move_invoice", &old_loan, loan).await
    }

    async fn split_loan(
        &self,
        ctx: &RequestContext,
        loan_id: &str,
        partitions: Vec<SplitPartition>,
    ) -> Result<Vec<Loan>> {
        let old_loan = self.load(loan_id)?;
        Self::guard_unlocked(&old_loan)?;

        let mut children = split_loan(&old_loan, &partitions)?;
        for child in &mut children {
            self.recalculator.recalculate(child)?;
        }

        let mut parent = old_loan.clone();
        parent.status = LoanStatus::Cancelled;
        self.recalculator.recalculate(&mut parent)?;

        let mut to_save = children.clone();
        to_save.push(parent.clone());
        self.repository.save_all(to_save).await?;
        self.append_audit(ctx, "split", &old_loan, &parent).await;
        Ok(children)
    }

    async fn batch_update_rates(
        &self,
        ctx: &RequestContext,
        patches: Vec<RatePatch>,
    ) -> Result<Vec<BatchItemResult>> {
        let futures = patches
            .iter()
            .map(|patch| self.apply_rate_patch(ctx, patch));
        let outcomes = join_all(futures).await;

        let results = patches
            .iter()
            .zip(outcomes)
            .map(|(patch, outcome)| match outcome {
                Ok(_) => BatchItemResult {
                    loan_id: patch.loan_id.clone(),
                    success: true,
                    error: None,
                },
                Err(e) => {
                    error!("Batch rate update failed for loan {}: {}", patch.loan_id, e);
                    BatchItemResult {
                        loan_id: patch.loan_id.clone(),
                        success: false,
                        error: Some(e.to_string()),
                    }
                }
            })
            .collect();
        Ok(results)
    }
}
