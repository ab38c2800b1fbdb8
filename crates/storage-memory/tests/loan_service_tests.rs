//! End-to-end loan workflow tests over the in-memory repositories.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use finvoice_core::audit::AuditRepositoryTrait;
use finvoice_core::context::RequestContext;
use finvoice_core::errors::Error;
use finvoice_core::fees::{FeeBasis, FeeCalculationType, FeeConfig, FeeConfigRepositoryTrait, NewFee};
use finvoice_core::fx::{FxRepositoryTrait, FxResolver, NewExchangeRate};
use finvoice_core::loans::{
    InvoiceUpdate, LoanError, LoanRecalculator, LoanService, LoanServiceTrait, LoanStatus,
    NewInvoice, NewLoan, PricingPatch, RatePatch, SplitPartition,
};
use finvoice_core::utils::FixedClock;
use finvoice_core::InvoiceStatus;
use finvoice_storage_memory::{
    InMemoryAuditRepository, InMemoryFeeConfigRepository, InMemoryFxRepository,
    InMemoryLoanRepository, InMemorySnapshotRepository,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct TestEnv {
    service: LoanService,
    fee_configs: Arc<InMemoryFeeConfigRepository>,
    fx: Arc<InMemoryFxRepository>,
    audit: Arc<InMemoryAuditRepository>,
}

fn env() -> TestEnv {
    let loans = Arc::new(InMemoryLoanRepository::new());
    let fee_configs = Arc::new(InMemoryFeeConfigRepository::new());
    let fx = Arc::new(InMemoryFxRepository::new());
    let audit = Arc::new(InMemoryAuditRepository::new());
    let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()));
    let resolver = Arc::new(FxResolver::new(fx.clone()));
    let recalculator = LoanRecalculator::new(resolver, clock.clone());
    let service = LoanService::new(
        loans,
        fee_configs.clone(),
        audit.clone(),
        recalculator,
        clock,
    );
    TestEnv {
        service,
        fee_configs,
        fx,
        audit,
    }
}

fn ctx() -> RequestContext {
    RequestContext::new("user-1", "Test User")
}

fn new_loan(amount: Decimal) -> NewLoan {
    NewLoan {
        customer_id: "cust-1".to_string(),
        currency: "USD".to_string(),
        total_amount: amount,
        start_date: date(2025, 1, 1),
        maturity_date: date(2026, 1, 1),
        base_rate: dec!(0.04),
        spread: dec!(0.01),
        day_count_convention: Default::default(),
        accrual_method: Default::default(),
        invoices: vec![NewInvoice {
            invoice_number: Some("INV-001".to_string()),
            amount,
            currency: "USD".to_string(),
            issue_date: date(2025, 1, 1),
            due_date: date(2025, 6, 1),
        }],
    }
}

#[tokio::test]
async fn create_loan_derives_pricing_figures() {
    let env = env();
    let loan = env.service.create_loan(&ctx(), new_loan(dec!(100000))).await.unwrap();

    assert_eq!(loan.pricing.effective_rate, dec!(0.05));
    // 100000 * 5% * one 30/360 year
    assert_eq!(loan.interest_amount, dec!(5000.00));
    assert_eq!(loan.total_invoice_amount, dec!(100000.00));
    assert_eq!(loan.net_proceeds, dec!(95000.00));
    assert_eq!(env.service.get_loan(&loan.id).unwrap(), loan);
}

#[tokio::test]
async fn unknown_loan_id_is_a_loan_not_found() {
    let env = env();

    match env.service.get_loan("loan-nope") {
        Err(Error::Loan(LoanError::NotFound(id))) => assert_eq!(id, "loan-nope"),
        other => panic!("expected LoanError::NotFound, got {:?}", other),
    }

    let refused = env
        .service
        .update_pricing(
            &ctx(),
            "loan-nope",
            PricingPatch {
                spread: Some(dec!(0.02)),
                ..PricingPatch::default()
            },
        )
        .await;
    assert!(matches!(refused, Err(Error::Loan(LoanError::NotFound(_)))));
}

#[tokio::test]
async fn update_pricing_promotes_pending_to_priced() {
    let env = env();
    let loan = env.service.create_loan(&ctx(), new_loan(dec!(100000))).await.unwrap();

    let updated = env
        .service
        .update_pricing(
            &ctx(),
            &loan.id,
            PricingPatch {
                spread: Some(dec!(0.02)),
                ..PricingPatch::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.pricing.effective_rate, dec!(0.06));
    assert_eq!(updated.pricing_status, finvoice_core::PricingStatus::Priced);
}

#[tokio::test]
async fn locked_loan_refuses_pricing_but_allows_invoice_status() {
    let env = env();
    let loan = env.service.create_loan(&ctx(), new_loan(dec!(100000))).await.unwrap();
    let locked = env.service.lock_pricing(&ctx(), &loan.id).await.unwrap();
    assert!(locked.is_locked());

    let refused = env
        .service
        .update_pricing(
            &ctx(),
            &loan.id,
            PricingPatch {
                base_rate: Some(dec!(0.09)),
                ..PricingPatch::default()
            },
        )
        .await;
    assert!(matches!(refused, Err(Error::Loan(LoanError::Locked(_)))));

    let invoice_id = locked.invoices[0].id.clone();
    let amount_edit = env
        .service
        .update_invoice(
            &ctx(),
            &loan.id,
            &invoice_id,
            InvoiceUpdate {
                amount: Some(dec!(1)),
                ..InvoiceUpdate::default()
            },
        )
        .await;
    assert!(matches!(amount_edit, Err(Error::Loan(LoanError::Locked(_)))));

    let status_edit = env
        .service
        .update_invoice(
            &ctx(),
            &loan.id,
            &invoice_id,
            InvoiceUpdate {
                status: Some(InvoiceStatus::Funded),
                ..InvoiceUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(status_edit.invoices[0].status, InvoiceStatus::Funded);
}

#[tokio::test]
async fn fee_from_config_is_calculated_against_its_basis() {
    let env = env();
    env.fee_configs
        .save(FeeConfig {
            id: "cfg-1".to_string(),
            name: "Arrangement".to_string(),
            calculation_type: FeeCalculationType::Percentage,
            basis: FeeBasis::Principal,
            flat_amount: Decimal::ZERO,
            rate: dec!(0.01),
            tiers: Vec::new(),
        })
        .await
        .unwrap();

    let loan = env.service.create_loan(&ctx(), new_loan(dec!(100000))).await.unwrap();
    let with_fee = env
        .service
        .add_fee_from_config(&ctx(), &loan.id, "cfg-1")
        .await
        .unwrap();

    assert_eq!(with_fee.fees.len(), 1);
    assert_eq!(with_fee.fees[0].calculated_amount, dec!(1000.00));
    assert_eq!(with_fee.total_fees, dec!(1000.00));
    assert_eq!(with_fee.net_proceeds, dec!(94000.00));
}

#[tokio::test]
async fn waived_fee_drops_out_of_totals() {
    let env = env();
    let loan = env.service.create_loan(&ctx(), new_loan(dec!(100000))).await.unwrap();
    let with_fee = env
        .service
        .add_fee(
            &ctx(),
            &loan.id,
            NewFee {
                name: "Handling".to_string(),
                fee_config_id: None,
                calculation_type: FeeCalculationType::Flat,
                basis: FeeBasis::Principal,
                flat_amount: dec!(500),
                rate: Decimal::ZERO,
                tiers: Vec::new(),
            },
        )
        .await
        .unwrap();
    assert_eq!(with_fee.total_fees, dec!(500.00));

    let fee_id = with_fee.fees[0].id.clone();
    let waived = env.service.waive_fee(&ctx(), &loan.id, &fee_id, true).await.unwrap();
    assert_eq!(waived.total_fees, dec!(0.00));
    assert_eq!(waived.fees[0].calculated_amount, dec!(0.00));
}

#[tokio::test]
async fn foreign_invoice_converts_at_stored_rate() {
    let env = env();
    env.fx
        .save_rate(NewExchangeRate {
            from_currency: "EUR".to_string(),
            to_currency: "USD".to_string(),
            rate: dec!(1.10),
            effective_date: date(2025, 1, 1),
        })
        .await
        .unwrap();

    let mut request = new_loan(dec!(100000));
    request.invoices[0].currency = "EUR".to_string();
    request.invoices[0].amount = dec!(1000);
    let loan = env.service.create_loan(&ctx(), request).await.unwrap();

    assert_eq!(loan.total_invoice_amount, dec!(1100.00));
}

#[tokio::test]
async fn split_cancels_parent_and_creates_draft_children() {
    let env = env();
    let mut request = new_loan(dec!(100000));
    request.invoices.push(NewInvoice {
        invoice_number: Some("INV-002".to_string()),
        amount: dec!(40000),
        currency: "USD".to_string(),
        issue_date: date(2025, 2, 1),
        due_date: date(2025, 7, 1),
    });
    let loan = env.service.create_loan(&ctx(), request).await.unwrap();

    let partitions = vec![
        SplitPartition {
            invoice_ids: vec![loan.invoices[0].id.clone()],
            percentage: None,
        },
        SplitPartition {
            invoice_ids: vec![loan.invoices[1].id.clone()],
            percentage: None,
        },
    ];
    let children = env.service.split_loan(&ctx(), &loan.id, partitions).await.unwrap();

    assert_eq!(children.len(), 2);
    for child in &children {
        assert_eq!(child.status, LoanStatus::Draft);
        assert_eq!(child.customer_id, "cust-1");
        assert!(env.service.get_loan(&child.id).is_ok());
    }
    let parent = env.service.get_loan(&loan.id).unwrap();
    assert_eq!(parent.status, LoanStatus::Cancelled);
}

#[tokio::test]
async fn batch_rate_update_is_multi_status() {
    let env = env();
    let loan_a = env.service.create_loan(&ctx(), new_loan(dec!(100000))).await.unwrap();
    let loan_b = env.service.create_loan(&ctx(), new_loan(dec!(50000))).await.unwrap();
    env.service.lock_pricing(&ctx(), &loan_b.id).await.unwrap();

    let results = env
        .service
        .batch_update_rates(
            &ctx(),
            vec![
                RatePatch {
                    loan_id: loan_a.id.clone(),
                    base_rate: Some(dec!(0.06)),
                    spread: None,
                },
                RatePatch {
                    loan_id: loan_b.id.clone(),
                    base_rate: Some(dec!(0.06)),
                    spread: None,
                },
                RatePatch {
                    loan_id: "missing".to_string(),
                    base_rate: Some(dec!(0.06)),
                    spread: None,
                },
            ],
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert!(results[0].success);
    assert!(!results[1].success);
    assert!(!results[2].success);
    assert!(results[2].error.is_some());

    // The successful patch landed; the locked loan kept its rate.
    assert_eq!(env.service.get_loan(&loan_a.id).unwrap().pricing.base_rate, dec!(0.06));
    assert_eq!(env.service.get_loan(&loan_b.id).unwrap().pricing.base_rate, dec!(0.04));
}

#[tokio::test]
async fn mutations_leave_field_level_audit_entries() {
    let env = env();
    let loan = env.service.create_loan(&ctx(), new_loan(dec!(100000))).await.unwrap();
    env.service
        .update_pricing(
            &ctx(),
            &loan.id,
            PricingPatch {
                spread: Some(dec!(0.02)),
                ..PricingPatch::default()
            },
        )
        .await
        .unwrap();

    let trail = env.audit.list_for_entity("loan", &loan.id).unwrap();
    assert_eq!(trail.len(), 2);
    assert_eq!(trail[0].action, "create");
    assert_eq!(trail[1].action, "update");
    assert_eq!(trail[1].user_id, "user-1");
    assert!(trail[1]
        .changes
        .iter()
        .any(|c| c.field_path == "pricing.spread"));
}

// Snapshot repository is exercised in snapshot_flow_tests.rs; re-export
// sanity check only.
#[test]
fn snapshot_repository_is_exported() {
    let _ = InMemorySnapshotRepository::new();
}
