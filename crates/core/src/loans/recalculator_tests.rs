use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::loans_model::{Invoice, InvoiceStatus, Loan, Pricing};
use super::recalculator::LoanRecalculator;
use crate::errors::Result;
use crate::fees::{Fee, FeeBasis, FeeCalculationType, FeeTier};
use crate::fx::FxResolverTrait;
use crate::pricing::{AccrualMethod, DayCountConvention};
use crate::utils::{Clock, FixedClock};

/// Resolver over a fixed rate table; unknown pairs fall back to 1:1 like
/// the real resolver.
struct StubFx {
    rates: HashMap<(String, String), Decimal>,
}

impl StubFx {
    fn identity() -> Self {
        Self {
            rates: HashMap::new(),
        }
    }

    fn with_rate(from: &str, to: &str, rate: Decimal) -> Self {
        let mut rates = HashMap::new();
        rates.insert((from.to_string(), to.to_string()), rate);
        Self { rates }
    }
}

impl FxResolverTrait for StubFx {
    fn rate(&self, from: &str, to: &str, _as_of: NaiveDate) -> Result<Decimal> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        Ok(self
            .rates
            .get(&(from.to_string(), to.to_string()))
            .copied()
            .unwrap_or(Decimal::ONE))
    }

    fn convert(&self, amount: Decimal, from: &str, to: &str, as_of: NaiveDate) -> Result<Decimal> {
        Ok(amount * self.rate(from, to, as_of)?)
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn recalculator(fx: StubFx) -> LoanRecalculator {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::on_date(date(2025, 3, 1)));
    LoanRecalculator::new(Arc::new(fx), clock)
}

fn invoice(id: &str, amount: Decimal, currency: &str) -> Invoice {
    Invoice {
        id: id.to_string(),
        invoice_number: None,
        amount,
        currency: currency.to_string(),
        issue_date: date(2025, 1, 1),
        due_date: date(2025, 6, 1),
        status: InvoiceStatus::Pending,
    }
}

fn base_loan() -> Loan {
    Loan {
        id: "loan-1".to_string(),
        customer_id: "cust-1".to_string(),
        currency: "USD".to_string(),
        total_amount: dec!(100000),
        outstanding_amount: dec!(100000),
        start_date: date(2025, 1, 1),
        maturity_date: date(2026, 1, 1),
        pricing: Pricing {
            base_rate: dec!(0.05),
            spread: dec!(0.02),
            effective_rate: Decimal::ZERO,
            day_count_convention: DayCountConvention::Thirty360,
            accrual_method: AccrualMethod::Simple,
        },
        invoices: vec![
            invoice("inv-1", dec!(60000), "USD"),
            invoice("inv-2", dec!(40000), "USD"),
        ],
        ..Loan::default()
    }
}

#[test]
fn derives_effective_rate_and_interest() {
    let recalc = recalculator(StubFx::identity());
    let mut loan = base_loan();
    recalc.recalculate(&mut loan).unwrap();

    assert_eq!(loan.pricing.effective_rate, dec!(0.07));
    // One 30/360 year of simple interest at 7% on 100000.
    assert_eq!(loan.interest_amount, dec!(7000.00));
    assert_eq!(loan.total_invoice_amount, dec!(100000.00));
    assert_eq!(loan.net_proceeds, dec!(93000.00));
}

#[test]
fn net_proceeds_invariant_holds() {
    let recalc = recalculator(StubFx::identity());
    let mut loan = base_loan();
    loan.fees.push(Fee {
        id: "fee-1".to_string(),
        name: "Service fee".to_string(),
        calculation_type: FeeCalculationType::Percentage,
        basis: FeeBasis::Principal,
        rate: dec!(0.01),
        ..Fee::default()
    });
    recalc.recalculate(&mut loan).unwrap();

    assert_eq!(loan.total_fees, dec!(1000.00));
    assert_eq!(
        loan.net_proceeds,
        loan.total_amount - loan.interest_amount - loan.total_fees
    );
}

#[test]
fn recalculate_is_idempotent() {
    let recalc = recalculator(StubFx::with_rate("EUR", "USD", dec!(1.1)));
    let mut loan = base_loan();
    loan.invoices.push(invoice("inv-3", dec!(10000), "EUR"));
    loan.fees.push(Fee {
        id: "fee-1".to_string(),
        name: "Arrangement fee".to_string(),
        calculation_type: FeeCalculationType::Tiered,
        basis: FeeBasis::TotalInvoices,
        tiers: vec![
            FeeTier {
                min_amount: dec!(0),
                max_amount: Some(dec!(100000)),
                rate: dec!(0.015),
            },
            FeeTier {
                min_amount: dec!(100000),
                max_amount: None,
                rate: dec!(0.01),
            },
        ],
        ..Fee::default()
    });

    recalc.recalculate(&mut loan).unwrap();
    let first_pass = loan.clone();
    recalc.recalculate(&mut loan).unwrap();
    assert_eq!(loan, first_pass);
}

#[test]
fn foreign_invoices_convert_at_resolved_rate() {
    let recalc = recalculator(StubFx::with_rate("EUR", "USD", dec!(1.25)));
    let mut loan = base_loan();
    loan.invoices = vec![invoice("inv-1", dec!(1000), "EUR")];
    recalc.recalculate(&mut loan).unwrap();
    assert_eq!(loan.total_invoice_amount, dec!(1250.00));
}

#[test]
fn fee_basis_selects_the_right_figure() {
    let recalc = recalculator(StubFx::identity());
    let mut loan = base_loan();
    loan.outstanding_amount = dec!(50000);
    loan.fees = vec![
        Fee {
            id: "fee-principal".to_string(),
            name: "On principal".to_string(),
            calculation_type: FeeCalculationType::Percentage,
            basis: FeeBasis::Principal,
            rate: dec!(0.01),
            ..Fee::default()
        },
        Fee {
            id: "fee-outstanding".to_string(),
            name: "On outstanding".to_string(),
            calculation_type: FeeCalculationType::Percentage,
            basis: FeeBasis::Outstanding,
            rate: dec!(0.01),
            ..Fee::default()
        },
        Fee {
            id: "fee-invoices".to_string(),
            name: "On invoices".to_string(),
            calculation_type: FeeCalculationType::Percentage,
            basis: FeeBasis::TotalInvoices,
            rate: dec!(0.01),
            ..Fee::default()
        },
    ];
    recalc.recalculate(&mut loan).unwrap();

    assert_eq!(loan.fees[0].calculated_amount, dec!(1000.00));
    assert_eq!(loan.fees[1].calculated_amount, dec!(500.00));
    assert_eq!(loan.fees[2].calculated_amount, dec!(1000.00));
    assert_eq!(loan.total_fees, dec!(2500.00));
}

#[test]
fn waived_fee_contributes_zero() {
    let recalc = recalculator(StubFx::identity());
    let mut loan = base_loan();
    loan.fees = vec![Fee {
        id: "fee-1".to_string(),
        name: "Service fee".to_string(),
        calculation_type: FeeCalculationType::Percentage,
        basis: FeeBasis::Principal,
        rate: dec!(0.01),
        is_waived: true,
        ..Fee::default()
    }];
    recalc.recalculate(&mut loan).unwrap();
    assert_eq!(loan.total_fees, dec!(0));
    assert_eq!(loan.fees[0].rate, dec!(0.01));
}
