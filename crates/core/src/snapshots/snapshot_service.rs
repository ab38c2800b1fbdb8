use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use log::debug;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::snapshot_blob::{compress_loans, decompress_loans};
use super::snapshot_errors::SnapshotError;
use super::snapshot_model::{
    CurrencyDelta, CurrencySummary, PortfolioSnapshot, SnapshotMetadata,
};
use super::snapshot_traits::SnapshotRepositoryTrait;
use crate::context::RequestContext;
use crate::diff::LoanChangeSet;
use crate::errors::{DatabaseError, Error, Result};
use crate::loans::Loan;
use crate::pricing::round_rate;
use crate::utils::Clock;

const BPS_PER_UNIT: Decimal = Decimal::from_parts(10000, 0, 0, false, 0);

/// Builds, lists, and rehydrates point-in-time portfolio snapshots.
///
/// Creation is serialized per customer: two concurrent saves for the same
/// customer would otherwise both read the same prior summary and produce
/// duplicate deltas.
pub struct SnapshotService {
    repository: Arc<dyn SnapshotRepositoryTrait>,
    clock: Arc<dyn Clock>,
    customer_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SnapshotService {
    pub fn new(repository: Arc<dyn SnapshotRepositoryTrait>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            clock,
            customer_locks: DashMap::new(),
        }
    }

    fn lock_for(&self, customer_id: &str) -> Arc<Mutex<()>> {
        self.customer_locks
            .entry(customer_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Captures the customer's current portfolio as an immutable snapshot.
    ///
    /// The lock is held across read-latest, delta computation, and insert,
    /// so consecutive snapshots always chain off each other.
    pub async fn create_snapshot(
        &self,
        ctx: &RequestContext,
        customer_id: &str,
        loans: &[Loan],
        changes: LoanChangeSet,
        change_count: usize,
    ) -> Result<SnapshotMetadata> {
        let lock = self.lock_for(customer_id);
        let _guard = lock.lock().await;

        let previous = self.repository.get_latest_metadata(customer_id)?;
        let summary = build_summary(loans);
        let delta = previous
            .as_ref()
            .map(|prev| build_delta(&summary, &prev.summary));

        let blob = compress_loans(loans)?;
        debug!(
            "Creating snapshot for customer {}: {} loans, {} changes, blob {} bytes",
            customer_id,
            loans.len(),
            change_count,
            blob.len()
        );

        let snapshot = PortfolioSnapshot {
            metadata: SnapshotMetadata {
                id: Uuid::new_v4().to_string(),
                customer_id: customer_id.to_string(),
                timestamp: self.clock.now(),
                user_id: ctx.user_id.clone(),
                user_name: ctx.user_name.clone(),
                summary,
                delta,
                changes,
                change_count,
            },
            blob,
        };
        self.repository.save(snapshot).await
    }

    /// Snapshot headers for the timeline, newest-first, blob-free.
    pub fn list_timeline(
        &self,
        customer_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SnapshotMetadata>> {
        self.repository.list_metadata(customer_id, limit, offset)
    }

    /// Rehydrates a historical snapshot for read-only playback.
    ///
    /// A repository miss surfaces as the domain error.
    pub fn get_snapshot_detail(&self, snapshot_id: &str) -> Result<(SnapshotMetadata, Vec<Loan>)> {
        let snapshot = match self.repository.get_by_id(snapshot_id) {
            Err(Error::Database(DatabaseError::NotFound(_))) => {
                return Err(SnapshotError::NotFound(snapshot_id.to_string()).into())
            }
            other => other?,
        };
        let loans = decompress_loans(&snapshot.blob)?;
        Ok((snapshot.metadata, loans))
    }

    /// Applies the retention policy: oldest snapshots beyond `keep` are
    /// removed.
    pub async fn prune(&self, customer_id: &str, keep: usize) -> Result<usize> {
        let lock = self.lock_for(customer_id);
        let _guard = lock.lock().await;
        self.repository.prune_oldest(customer_id, keep).await
    }
}

/// Groups loans by currency and aggregates counts, sums, and the
/// amount-weighted average effective rate.
fn build_summary(loans: &[Loan]) -> HashMap<String, CurrencySummary> {
    let mut summary: HashMap<String, CurrencySummary> = HashMap::new();
    let mut weighted_rates: HashMap<String, Decimal> = HashMap::new();

    for loan in loans {
        let entry = summary.entry(loan.currency.clone()).or_default();
        entry.loan_count += 1;
        entry.total_amount += loan.total_amount;
        entry.total_fees += loan.total_fees;
        entry.total_interest += loan.interest_amount;
        entry.net_proceeds += loan.net_proceeds;
        *weighted_rates.entry(loan.currency.clone()).or_default() +=
            loan.pricing.effective_rate * loan.total_amount;
    }

    for (currency, entry) in summary.iter_mut() {
        if entry.total_amount.is_zero() {
            entry.avg_rate = Decimal::ZERO;
        } else {
            let weighted = weighted_rates.get(currency).copied().unwrap_or_default();
            entry.avg_rate = round_rate(weighted / entry.total_amount);
        }
    }
    summary
}

/// Per-currency change versus the previous summary. A currency present on
/// only one side is compared against an all-zero summary, so a brand-new
/// currency shows its full values as change.
fn build_delta(
    current: &HashMap<String, CurrencySummary>,
    previous: &HashMap<String, CurrencySummary>,
) -> HashMap<String, CurrencyDelta> {
    let zero = CurrencySummary::default();
    let mut delta = HashMap::new();

    let currencies: std::collections::BTreeSet<&String> =
        current.keys().chain(previous.keys()).collect();
    for currency in currencies {
        let cur = current.get(currency).unwrap_or(&zero);
        let prev = previous.get(currency).unwrap_or(&zero);
        delta.insert(
            currency.clone(),
            CurrencyDelta {
                fees_change: cur.total_fees - prev.total_fees,
                interest_change: cur.total_interest - prev.total_interest,
                net_proceeds_change: cur.net_proceeds - prev.net_proceeds,
                avg_rate_change_bps: (cur.avg_rate - prev.avg_rate) * BPS_PER_UNIT,
            },
        );
    }
    delta
}
