//! Business rules checked on grouped invoices.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::invoice::InvoiceAggregate;

/// A rule violation on one invoice or one of its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub invoice_number: String,

    /// 1-based line position within the invoice, for line rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    pub field: String,

    pub message: String,
}

impl ValidationIssue {
    fn invoice(invoice: &InvoiceAggregate, field: &str, message: &str) -> Self {
        Self {
            invoice_number: invoice.invoice_number().to_string(),
            line: None,
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    fn line(invoice: &InvoiceAggregate, line: usize, field: &str, message: &str) -> Self {
        Self {
            invoice_number: invoice.invoice_number().to_string(),
            line: Some(line),
            field: field.to_string(),
            message: format!("Line {}: {}", line, message),
        }
    }
}

/// Check one invoice. Never modifies it.
pub fn validate_invoice(invoice: &InvoiceAggregate) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let header = &invoice.header;

    if header.invoice_number.trim().is_empty() {
        issues.push(ValidationIssue::invoice(invoice, "invoice_number", "Invoice number is required"));
    }
    if header.company_name.trim().is_empty() {
        issues.push(ValidationIssue::invoice(invoice, "company_name", "Company name is required"));
    }
    if invoice.lines.is_empty() {
        issues.push(ValidationIssue::invoice(invoice, "lines", "Invoice must have at least one line"));
    }
    if invoice.checked_totals().is_none() {
        issues.push(ValidationIssue::invoice(invoice, "total", "Invoice totals are out of range"));
    }

    for (i, line) in invoice.lines.iter().enumerate() {
        let n = i + 1;
        if line.tka_name.trim().is_empty() {
            issues.push(ValidationIssue::line(invoice, n, "tka_name", "worker name is required"));
        }
        if line.unit_price <= Decimal::ZERO {
            issues.push(ValidationIssue::line(invoice, n, "unit_price", "unit price must be greater than zero"));
        }
        if line.quantity <= 0 {
            issues.push(ValidationIssue::line(invoice, n, "quantity", "quantity must be greater than zero"));
        }
    }

    issues
}

/// Check every invoice, in order.
pub fn validate_all(invoices: &[InvoiceAggregate]) -> Vec<ValidationIssue> {
    invoices.iter().flat_map(validate_invoice).collect()
}
