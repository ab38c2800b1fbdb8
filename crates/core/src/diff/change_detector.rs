//! Structural diff over JSON value trees and loan change classification.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use super::change_model::{
    ChangeKind, ChangeRecord, FeeChange, InvoiceChange, LoanChangeSet, RateChange, StatusChange,
};
use crate::loans::{Invoice, Loan};

/// Bookkeeping fields excluded from diffs: they change on every write and
/// carry no business meaning.
const SKIP_FIELDS: &[&str] = &["updatedAt", "createdAt", "lastModifiedBy", "calculatedAt"];

/// Structural diff between two versions of a value tree.
///
/// Nested objects are walked recursively with dotted paths; arrays and
/// scalars are compared by deep value equality. `diff(x, x)` is always
/// empty.
pub fn diff(old: &Value, new: &Value) -> Vec<ChangeRecord> {
    let mut records = Vec::new();
    diff_at("", old, new, &mut records);
    records
}

fn diff_at(prefix: &str, old: &Value, new: &Value, out: &mut Vec<ChangeRecord>) {
    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            let keys: BTreeSet<&String> = old_map.keys().chain(new_map.keys()).collect();
            for key in keys {
                if SKIP_FIELDS.contains(&key.as_str()) {
                    continue;
                }
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                let old_child = old_map.get(key).unwrap_or(&Value::Null);
                let new_child = new_map.get(key).unwrap_or(&Value::Null);
                diff_at(&path, old_child, new_child, out);
            }
        }
        _ => {
            if old != new {
                out.push(ChangeRecord {
                    field_path: prefix.to_string(),
                    old_value: old.clone(),
                    new_value: new.clone(),
                });
            }
        }
    }
}

/// Classifies mutations between two versions of a customer's loan list into
/// the four buckets the snapshot timeline renders: fee changes, rate
/// changes, invoice changes, and status transitions.
pub fn classify_loan_changes(old_loans: &[Loan], new_loans: &[Loan]) -> LoanChangeSet {
    let old_by_id: HashMap<&str, &Loan> = old_loans.iter().map(|l| (l.id.as_str(), l)).collect();
    let new_by_id: HashMap<&str, &Loan> = new_loans.iter().map(|l| (l.id.as_str(), l)).collect();

    let mut changes = LoanChangeSet::default();

    for new_loan in new_loans {
        match old_by_id.get(new_loan.id.as_str()) {
            Some(old_loan) => classify_loan_pair(old_loan, new_loan, &mut changes),
            None => {
                // Brand-new loan (e.g. a split child): everything it carries
                // counts as added.
                for fee in &new_loan.fees {
                    changes.fees.push(FeeChange {
                        loan_id: new_loan.id.clone(),
                        fee_id: fee.id.clone(),
                        fee_name: fee.name.clone(),
                        kind: ChangeKind::Added,
                    });
                }
                for invoice in &new_loan.invoices {
                    changes.invoices.push(InvoiceChange {
                        loan_id: new_loan.id.clone(),
                        invoice_id: invoice.id.clone(),
                        kind: ChangeKind::Added,
                    });
                }
            }
        }
    }

    for old_loan in old_loans {
        if !new_by_id.contains_key(old_loan.id.as_str()) {
            for fee in &old_loan.fees {
                changes.fees.push(FeeChange {
                    loan_id: old_loan.id.clone(),
                    fee_id: fee.id.clone(),
                    fee_name: fee.name.clone(),
                    kind: ChangeKind::Deleted,
                });
            }
            for invoice in &old_loan.invoices {
                changes.invoices.push(InvoiceChange {
                    loan_id: old_loan.id.clone(),
                    invoice_id: invoice.id.clone(),
                    kind: ChangeKind::Deleted,
                });
            }
        }
    }

    changes
}

fn classify_loan_pair(old_loan: &Loan, new_loan: &Loan, changes: &mut LoanChangeSet) {
    if old_loan.pricing.effective_rate != new_loan.pricing.effective_rate {
        changes.rates.push(RateChange {
            loan_id: new_loan.id.clone(),
            old_effective_rate: old_loan.pricing.effective_rate,
            new_effective_rate: new_loan.pricing.effective_rate,
        });
    }

    if old_loan.status != new_loan.status {
        changes.statuses.push(StatusChange {
            loan_id: new_loan.id.clone(),
            field: "status".to_string(),
            old_value: old_loan.status.to_string(),
            new_value: new_loan.status.to_string(),
        });
    }
    if old_loan.pricing_status != new_loan.pricing_status {
        changes.statuses.push(StatusChange {
            loan_id: new_loan.id.clone(),
            field: "pricingStatus".to_string(),
            old_value: old_loan.pricing_status.to_string(),
            new_value: new_loan.pricing_status.to_string(),
        });
    }

    classify_fees(old_loan, new_loan, changes);
    classify_invoices(old_loan, new_loan, changes);
}

fn classify_fees(old_loan: &Loan, new_loan: &Loan, changes: &mut LoanChangeSet) {
    let old_pos: HashMap<&str, usize> = old_loan
        .fees
        .iter()
        .enumerate()
        .map(|(i, f)| (f.id.as_str(), i))
        .collect();
    let new_pos: HashMap<&str, usize> = new_loan
        .fees
        .iter()
        .enumerate()
        .map(|(i, f)| (f.id.as_str(), i))
        .collect();

    for (new_idx, fee) in new_loan.fees.iter().enumerate() {
        match old_pos.get(fee.id.as_str()) {
            None => changes.fees.push(FeeChange {
                loan_id: new_loan.id.clone(),
                fee_id: fee.id.clone(),
                fee_name: fee.name.clone(),
                kind: ChangeKind::Added,
            }),
            Some(&old_idx) => {
                let old_fee = &old_loan.fees[old_idx];
                if fee_config_differs(old_fee, fee) {
                    changes.fees.push(FeeChange {
                        loan_id: new_loan.id.clone(),
                        fee_id: fee.id.clone(),
                        fee_name: fee.name.clone(),
                        kind: ChangeKind::Modified,
                    });
                } else if old_idx != new_idx {
                    changes.fees.push(FeeChange {
                        loan_id: new_loan.id.clone(),
                        fee_id: fee.id.clone(),
                        fee_name: fee.name.clone(),
                        kind: ChangeKind::Moved,
                    });
                }
            }
        }
    }
    for fee in &old_loan.fees {
        if !new_pos.contains_key(fee.id.as_str()) {
            changes.fees.push(FeeChange {
                loan_id: new_loan.id.clone(),
                fee_id: fee.id.clone(),
                fee_name: fee.name.clone(),
                kind: ChangeKind::Deleted,
            });
        }
    }
}

/// Compares two versions of a fee ignoring the derived amount, which moves
/// whenever pricing or invoices move and would mislabel untouched fees.
fn fee_config_differs(old_fee: &crate::fees::Fee, new_fee: &crate::fees::Fee) -> bool {
    let strip = |fee: &crate::fees::Fee| -> Value {
        let mut value = serde_json::to_value(fee).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut value {
            map.remove("calculatedAmount");
        }
        value
    };
    !diff(&strip(old_fee), &strip(new_fee)).is_empty()
}

fn classify_invoices(old_loan: &Loan, new_loan: &Loan, changes: &mut LoanChangeSet) {
    let old_pos: HashMap<&str, usize> = old_loan
        .invoices
        .iter()
        .enumerate()
        .map(|(i, inv)| (inv.id.as_str(), i))
        .collect();
    let new_pos: HashMap<&str, usize> = new_loan
        .invoices
        .iter()
        .enumerate()
        .map(|(i, inv)| (inv.id.as_str(), i))
        .collect();

    for (new_idx, invoice) in new_loan.invoices.iter().enumerate() {
        match old_pos.get(invoice.id.as_str()) {
            None => changes.invoices.push(InvoiceChange {
                loan_id: new_loan.id.clone(),
                invoice_id: invoice.id.clone(),
                kind: ChangeKind::Added,
            }),
            Some(&old_idx) => {
                let old_invoice = &old_loan.invoices[old_idx];
                if invoice_differs(old_invoice, invoice) {
                    changes.invoices.push(InvoiceChange {
                        loan_id: new_loan.id.clone(),
                        invoice_id: invoice.id.clone(),
                        kind: ChangeKind::Modified,
                    });
                } else if old_idx != new_idx {
                    changes.invoices.push(InvoiceChange {
                        loan_id: new_loan.id.clone(),
                        invoice_id: invoice.id.clone(),
                        kind: ChangeKind::Moved,
                    });
                }
            }
        }
    }
    for invoice in &old_loan.invoices {
        if !new_pos.contains_key(invoice.id.as_str()) {
            changes.invoices.push(InvoiceChange {
                loan_id: new_loan.id.clone(),
                invoice_id: invoice.id.clone(),
                kind: ChangeKind::Deleted,
            });
        }
    }
}

fn invoice_differs(old_invoice: &Invoice, new_invoice: &Invoice) -> bool {
    let old_value = serde_json::to_value(old_invoice).unwrap_or(Value::Null);
    let new_value = serde_json::to_value(new_invoice).unwrap_or(Value::Null);
    !diff(&old_value, &new_value).is_empty()
}
