//! End-to-end snapshot timeline tests: mutate loans through the service,
//! classify the changes, and capture snapshots into in-memory storage.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use finvoice_core::context::RequestContext;
use finvoice_core::diff::classify_loan_changes;
use finvoice_core::fx::FxResolver;
use finvoice_core::loans::{
    LoanRecalculator, LoanService, LoanServiceTrait, NewInvoice, NewLoan, PricingPatch,
};
use finvoice_core::snapshots::SnapshotService;
use finvoice_core::utils::FixedClock;
use finvoice_storage_memory::{
    InMemoryAuditRepository, InMemoryFeeConfigRepository, InMemoryFxRepository,
    InMemoryLoanRepository, InMemorySnapshotRepository,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn ctx() -> RequestContext {
    RequestContext::new("user-1", "Test User")
}

struct TestEnv {
    service: LoanService,
    snapshots: SnapshotService,
}

fn env_at(secs: i64) -> TestEnv {
    let loans = Arc::new(InMemoryLoanRepository::new());
    let fx = Arc::new(InMemoryFxRepository::new());
    let clock = Arc::new(FixedClock(Utc.timestamp_opt(secs, 0).unwrap()));
    let recalculator = LoanRecalculator::new(Arc::new(FxResolver::new(fx)), clock.clone());
    let service = LoanService::new(
        loans,
        Arc::new(InMemoryFeeConfigRepository::new()),
        Arc::new(InMemoryAuditRepository::new()),
        recalculator,
        clock.clone(),
    );
    let snapshots = SnapshotService::new(Arc::new(InMemorySnapshotRepository::new()), clock);
    TestEnv { service, snapshots }
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
            invoice_number: None,
            amount,
            currency: "USD".to_string(),
            issue_date: date(2025, 1, 1),
            due_date: date(2025, 6, 1),
        }],
    }
}

#[tokio::test]
async fn timeline_captures_deltas_and_replays_history() {
    let env = env_at(1_700_000_000);

    // Baseline portfolio and first snapshot.
    let loan = env.service.create_loan(&ctx(), new_loan(dec!(100000))).await.unwrap();
    let baseline = env.service.list_loans_for_customer("cust-1").unwrap();
    let first = env
        .snapshots
        .create_snapshot(&ctx(), "cust-1", &baseline, Default::default(), 0)
        .await
        .unwrap();
    assert!(first.delta.is_none());
    assert_eq!(first.summary["USD"].avg_rate, dec!(0.0500));
    assert_eq!(first.summary["USD"].total_interest, dec!(5000.00));

    // Reprice and snapshot again.
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
    let repriced = env.service.list_loans_for_customer("cust-1").unwrap();
    let changes = classify_loan_changes(&baseline, &repriced);
    assert_eq!(changes.rates.len(), 1);
    let change_count = changes.change_count();

    let second = env
        .snapshots
        .create_snapshot(&ctx(), "cust-1", &repriced, changes, change_count)
        .await
        .unwrap();

    let delta = second.delta.as_ref().unwrap();
    // 5% -> 6% is 100 basis points; interest moved 5000 -> 6000.
    assert_eq!(delta["USD"].avg_rate_change_bps, dec!(100));
    assert_eq!(delta["USD"].interest_change, dec!(1000.00));
    assert_eq!(second.change_count, 1);
    assert_eq!(second.changes.rates[0].new_effective_rate, dec!(0.06));

    // The timeline lists newest-first.
    let timeline = env.snapshots.list_timeline("cust-1", 20, 0).unwrap();
    assert_eq!(timeline.len(), 2);
    assert_eq!(timeline[0].id, second.id);
    assert_eq!(timeline[1].id, first.id);

    // Replaying the first snapshot shows the pre-reprice portfolio.
    let (_, replayed) = env.snapshots.get_snapshot_detail(&first.id).unwrap();
    assert_eq!(replayed, baseline);
    assert_eq!(replayed[0].pricing.effective_rate, dec!(0.05));
}

#[tokio::test]
async fn retention_prunes_oldest_snapshots() {
    let env = env_at(1_700_000_000);
    env.service.create_loan(&ctx(), new_loan(dec!(100000))).await.unwrap();
    let loans = env.service.list_loans_for_customer("cust-1").unwrap();

    let mut ids = Vec::new();
    for _ in 0..4 {
        let metadata = env
            .snapshots
            .create_snapshot(&ctx(), "cust-1", &loans, Default::default(), 0)
            .await
            .unwrap();
        ids.push(metadata.id);
    }

    let removed = env.snapshots.prune("cust-1", 2).await.unwrap();
    assert_eq!(removed, 2);
    assert_eq!(env.snapshots.list_timeline("cust-1", 20, 0).unwrap().len(), 2);
    assert!(env.snapshots.get_snapshot_detail(&ids[3]).is_ok());
}

#[tokio::test]
async fn concurrent_snapshots_for_one_customer_chain_cleanly() {
    let env = Arc::new(env_at(1_700_000_000));
    env.service.create_loan(&ctx(), new_loan(dec!(100000))).await.unwrap();
    let loans = env.service.list_loans_for_customer("cust-1").unwrap();

    let mut handles = Vec::new();
    for _ in 0..4 {
        let env = env.clone();
        let loans = loans.clone();
        handles.push(tokio::spawn(async move {
            env.snapshots
                .create_snapshot(&ctx(), "cust-1", &loans, Default::default(), 0)
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // Exactly one snapshot may be deltaless; the rest chained off a
    // predecessor even though they raced.
    let timeline = env.snapshots.list_timeline("cust-1", 20, 0).unwrap();
    assert_eq!(timeline.len(), 4);
    let without_delta = timeline.iter().filter(|m| m.delta.is_none()).count();
    assert_eq!(without_delta, 1);
}
