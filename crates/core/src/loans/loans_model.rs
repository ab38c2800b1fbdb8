//! Loan domain models.
//!
//! `Loan` is an aggregate root owning ordered fee and invoice collections.
//! Child records carry stable string ids and are addressed through the
//! aggregate's lookup methods, never by index held across mutations.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Error, Result, ValidationError};
use crate::fees::Fee;
use crate::pricing::{AccrualMethod, DayCountConvention};

/// Workflow status of a loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    #[default]
    Draft,
    Active,
    Settled,
    Cancelled,
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LoanStatus::Draft => "draft",
            LoanStatus::Active => "active",
            LoanStatus::Settled => "settled",
            LoanStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Pricing workflow status. Once locked, pricing and fee fields are frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PricingStatus {
    #[default]
    Pending,
    Priced,
    Locked,
}

impl std::fmt::Display for PricingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PricingStatus::Pending => "pending",
            PricingStatus::Priced => "priced",
            PricingStatus::Locked => "locked",
        };
        write!(f, "{}", s)
    }
}

/// Pricing block of a loan. `effective_rate` is derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub base_rate: Decimal,
    pub spread: Decimal,
    #[serde(default)]
    pub effective_rate: Decimal,
    pub day_count_convention: DayCountConvention,
    pub accrual_method: AccrualMethod,
}

/// Workflow status of an invoice. Remains editable after pricing lock;
/// the invoice amount does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Approved,
    Funded,
    Settled,
}

/// An invoice backing a loan. May be denominated in a currency other than
/// its parent loan's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub invoice_number: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub status: InvoiceStatus,
}

/// A trade-finance loan: principal, pricing, invoices, fees, and the
/// derived figures maintained by the recalculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: String,
    pub customer_id: String,
    pub currency: String,
    pub total_amount: Decimal,
    #[serde(default)]
    pub outstanding_amount: Decimal,
    pub start_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub pricing: Pricing,
    #[serde(default)]
    pub invoices: Vec<Invoice>,
    #[serde(default)]
    pub fees: Vec<Fee>,
    // Derived fields, written by recalculation only.
    #[serde(default)]
    pub total_fees: Decimal,
    #[serde(default)]
    pub total_invoice_amount: Decimal,
    #[serde(default)]
    pub interest_amount: Decimal,
    #[serde(default)]
    pub net_proceeds: Decimal,
    #[serde(default)]
    pub pricing_status: PricingStatus,
    #[serde(default)]
    pub status: LoanStatus,
}

impl Default for Loan {
    fn default() -> Self {
        Loan {
            id: String::new(),
            customer_id: String::new(),
            currency: String::new(),
            total_amount: Decimal::ZERO,
            outstanding_amount: Decimal::ZERO,
            start_date: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
            maturity_date: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
            pricing: Pricing::default(),
            invoices: Vec::new(),
            fees: Vec::new(),
            total_fees: Decimal::ZERO,
            total_invoice_amount: Decimal::ZERO,
            interest_amount: Decimal::ZERO,
            net_proceeds: Decimal::ZERO,
            pricing_status: PricingStatus::default(),
            status: LoanStatus::default(),
        }
    }
}

impl Loan {
    pub fn is_locked(&self) -> bool {
        self.pricing_status == PricingStatus::Locked
    }

    pub fn fee(&self, fee_id: &str) -> Option<&Fee> {
        self.fees.iter().find(|f| f.id == fee_id)
    }

    pub fn fee_mut(&mut self, fee_id: &str) -> Option<&mut Fee> {
        self.fees.iter_mut().find(|f| f.id == fee_id)
    }

    pub fn invoice(&self, invoice_id: &str) -> Option<&Invoice> {
        self.invoices.iter().find(|i| i.id == invoice_id)
    }

    pub fn invoice_mut(&mut self, invoice_id: &str) -> Option<&mut Invoice> {
        self.invoices.iter_mut().find(|i| i.id == invoice_id)
    }
}

/// Input model for creating a loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLoan {
    pub customer_id: String,
    pub currency: String,
    pub total_amount: Decimal,
    pub start_date: NaiveDate,
    pub maturity_date: NaiveDate,
    #[serde(default)]
    pub base_rate: Decimal,
    #[serde(default)]
    pub spread: Decimal,
    #[serde(default)]
    pub day_count_convention: DayCountConvention,
    #[serde(default)]
    pub accrual_method: AccrualMethod,
    #[serde(default)]
    pub invoices: Vec<NewInvoice>,
}

impl NewLoan {
    pub fn validate(&self) -> Result<()> {
        if self.customer_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "customerId".to_string(),
            )));
        }
        if self.currency.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "currency".to_string(),
            )));
        }
        if self.total_amount <= Decimal::ZERO {
            return Err(Error::Validation(ValidationError::OutOfRange(
                "Loan total amount must be positive".to_string(),
            )));
        }
        if self.maturity_date <= self.start_date {
            return Err(Error::Validation(ValidationError::InvalidInput(
                "Maturity date must be after start date".to_string(),
            )));
        }
        Ok(())
    }

    pub fn into_loan(self) -> Loan {
        let invoices = self.invoices.into_iter().map(NewInvoice::into_invoice).collect();
        Loan {
            id: Uuid::new_v4().to_string(),
            customer_id: self.customer_id,
            currency: self.currency,
            total_amount: self.total_amount,
            outstanding_amount: self.total_amount,
            start_date: self.start_date,
            maturity_date: self.maturity_date,
            pricing: Pricing {
                base_rate: self.base_rate,
                spread: self.spread,
                effective_rate: Decimal::ZERO,
                day_count_convention: self.day_count_convention,
                accrual_method: self.accrual_method,
            },
            invoices,
            fees: Vec::new(),
            total_fees: Decimal::ZERO,
            total_invoice_amount: Decimal::ZERO,
            interest_amount: Decimal::ZERO,
            net_proceeds: Decimal::ZERO,
            pricing_status: PricingStatus::Pending,
            status: LoanStatus::Draft,
        }
    }
}

/// Input model for attaching an invoice to a loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoice {
    pub invoice_number: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
}

impl NewInvoice {
    pub fn validate(&self) -> Result<()> {
        if self.amount <= Decimal::ZERO {
            return Err(Error::Validation(ValidationError::OutOfRange(
                "Invoice amount must be positive".to_string(),
            )));
        }
        if self.currency.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "currency".to_string(),
            )));
        }
        Ok(())
    }

    pub fn into_invoice(self) -> Invoice {
        Invoice {
            id: Uuid::new_v4().to_string(),
            invoice_number: self.invoice_number,
            amount: self.amount,
            currency: self.currency,
            issue_date: self.issue_date,
            due_date: self.due_date,
            status: InvoiceStatus::Pending,
        }
    }
}

/// Partial update to a loan's pricing block.
///
/// Dates arrive as strings from the calling layer; mutation paths parse
/// them strictly, preview paths degrade on parse failure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PricingPatch {
    pub base_rate: Option<Decimal>,
    pub spread: Option<Decimal>,
    pub day_count_convention: Option<DayCountConvention>,
    pub accrual_method: Option<AccrualMethod>,
    pub start_date: Option<String>,
    pub maturity_date: Option<String>,
}

impl PricingPatch {
    pub fn is_empty(&self) -> bool {
        self.base_rate.is_none()
            && self.spread.is_none()
            && self.day_count_convention.is_none()
            && self.accrual_method.is_none()
            && self.start_date.is_none()
            && self.maturity_date.is_none()
    }
}

/// Partial update to an invoice. Amount and currency edits are refused on
/// a locked loan; status edits are always allowed.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceUpdate {
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<InvoiceStatus>,
}

impl InvoiceUpdate {
    /// True when the update touches anything beyond the invoice status.
    pub fn touches_amount_fields(&self) -> bool {
        self.amount.is_some()
            || self.currency.is_some()
            || self.issue_date.is_some()
            || self.due_date.is_some()
    }
}

/// One loan's rate patch within a batch rate change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatePatch {
    pub loan_id: String,
    pub base_rate: Option<Decimal>,
    pub spread: Option<Decimal>,
}

/// Per-item outcome of a batch operation. A failed item never rolls back
/// or blocks the others.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemResult {
    pub loan_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One child of a loan split: the parent invoice ids it takes, and an
/// optional explicit allocation percentage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitPartition {
    pub invoice_ids: Vec<String>,
    pub percentage: Option<Decimal>,
}
