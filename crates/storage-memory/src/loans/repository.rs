use async_trait::async_trait;
use dashmap::DashMap;

use finvoice_core::errors::{DatabaseError, Result};
use finvoice_core::loans::{Loan, LoanRepositoryTrait};

/// Loan storage over a concurrent map keyed by loan id.
#[derive(Default)]
pub struct InMemoryLoanRepository {
    loans: DashMap<String, Loan>,
}

impl InMemoryLoanRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LoanRepositoryTrait for InMemoryLoanRepository {
    fn get_by_id(&self, loan_id: &str) -> Result<Loan> {
        self.loans
            .get(loan_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DatabaseError::NotFound(format!("Loan {} not found", loan_id)).into())
    }

    fn list_by_customer(&self, customer_id: &str) -> Result<Vec<Loan>> {
        let mut loans: Vec<Loan> = self
            .loans
            .iter()
            .filter(|entry| entry.value().customer_id == customer_id)
            .map(|entry| entry.value().clone())
            .collect();
        // Map iteration order is arbitrary; callers expect a stable listing.
        loans.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(loans)
    }

    async fn save(&self, loan: Loan) -> Result<Loan> {
        self.loans.insert(loan.id.clone(), loan.clone());
        Ok(loan)
    }

    async fn save_all(&self, loans: Vec<Loan>) -> Result<Vec<Loan>> {
        for loan in &loans {
            self.loans.insert(loan.id.clone(), loan.clone());
        }
        Ok(loans)
    }

    async fn delete(&self, loan_id: &str) -> Result<()> {
        self.loans
            .remove(loan_id)
            .map(|_| ())
            .ok_or_else(|| DatabaseError::NotFound(format!("Loan {} not found", loan_id)).into())
    }
}
