//! The single derivation point for a loan's computed fields.

use std::sync::Arc;

use rust_decimal::Decimal;

use super::loans_model::Loan;
use crate::errors::Result;
use crate::fees::{calculate_fee, FeeBasis};
use crate::fx::FxResolverTrait;
use crate::pricing::{accrued_interest, effective_rate, round_amount};
use crate::utils::Clock;

/// Rederives every computed field on a loan.
///
/// Invoked after *any* mutation (pricing edit, fee or invoice change,
/// split) before persistence. Invariants after a call:
/// `net_proceeds == total_amount - interest_amount - total_fees` and
/// `effective_rate == round4(base_rate + spread)`. Calling it twice on an
/// unchanged loan is a no-op.
#[derive(Clone)]
pub struct LoanRecalculator {
    fx: Arc<dyn FxResolverTrait>,
    clock: Arc<dyn Clock>,
}

impl LoanRecalculator {
    pub fn new(fx: Arc<dyn FxResolverTrait>, clock: Arc<dyn Clock>) -> Self {
        Self { fx, clock }
    }

    pub fn recalculate(&self, loan: &mut Loan) -> Result<()> {
        loan.pricing.effective_rate =
            effective_rate(loan.pricing.base_rate, loan.pricing.spread);

        let today = self.clock.today();
        let mut invoice_total = Decimal::ZERO;
        for invoice in &loan.invoices {
            invoice_total +=
                self.fx
                    .convert(invoice.amount, &invoice.currency, &loan.currency, today)?;
        }
        loan.total_invoice_amount = round_amount(invoice_total);

        let principal = loan.total_amount;
        let outstanding = loan.outstanding_amount;
        let invoice_basis = loan.total_invoice_amount;
        let mut total_fees = Decimal::ZERO;
        for fee in &mut loan.fees {
            let basis = match fee.basis {
                FeeBasis::Principal => principal,
                FeeBasis::Outstanding => outstanding,
                FeeBasis::TotalInvoices => invoice_basis,
            };
            fee.calculated_amount = calculate_fee(fee, basis);
            total_fees += fee.calculated_amount;
        }
        loan.total_fees = round_amount(total_fees);

        loan.interest_amount = accrued_interest(
            loan.total_amount,
            loan.pricing.effective_rate,
            loan.start_date,
            loan.maturity_date,
            loan.pricing.day_count_convention,
            loan.pricing.accrual_method,
        );

        loan.net_proceeds = loan.total_amount - loan.interest_amount - loan.total_fees;
        Ok(())
    }
}
