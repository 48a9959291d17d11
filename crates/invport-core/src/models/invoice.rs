//! Invoice records produced by an import.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// VAT percentage applied when a source does not carry one.
pub const DEFAULT_VAT_PERCENTAGE: Decimal = Decimal::from_parts(11, 0, 0, false, 0);

/// Company name used for the synthetic header of a single-invoice source.
pub const DEFAULT_COMPANY_NAME: &str = "Imported Company";

/// Invoice header as read from one source row or JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceHeader {
    /// Invoice number. Also the grouping key, compared exactly.
    pub invoice_number: String,

    /// Billed company name.
    pub company_name: String,

    /// Company tax identifier (NPWP).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_tax_id: Option<String>,

    /// Date the invoice was issued.
    pub invoice_date: NaiveDate,

    /// Payment due date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    /// VAT percentage (e.g. 11 for 11%).
    pub vat_percentage: Decimal,

    /// Free-form notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl InvoiceHeader {
    /// Create a header with the given number and company and default values elsewhere.
    pub fn new(
        invoice_number: impl Into<String>,
        company_name: impl Into<String>,
        invoice_date: NaiveDate,
    ) -> Self {
        Self {
            invoice_number: invoice_number.into(),
            company_name: company_name.into(),
            company_tax_id: None,
            invoice_date,
            due_date: None,
            vat_percentage: DEFAULT_VAT_PERCENTAGE,
            notes: None,
        }
    }

    /// Invoice number for an imported single-invoice file, e.g. `IMP-20241231-001`.
    pub fn synthetic_number(date: NaiveDate) -> String {
        format!("IMP-{}-001", date.format("%Y%m%d"))
    }
}

/// A single billed line: one TKA worker on one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    /// Worker name.
    pub tka_name: String,

    /// Worker passport number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tka_passport: Option<String>,

    /// Job or service description.
    pub job_name: String,

    /// Group ("baris") number separating blocks of lines within one invoice.
    pub baris: i64,

    pub quantity: i64,

    pub unit_price: Decimal,

    pub line_total: Decimal,
}

impl InvoiceLine {
    /// Create a line in group 1. The total is taken as given; see [`fill_total`](Self::fill_total).
    pub fn new(
        tka_name: impl Into<String>,
        job_name: impl Into<String>,
        quantity: i64,
        unit_price: Decimal,
        line_total: Decimal,
    ) -> Self {
        Self {
            tka_name: tka_name.into(),
            tka_passport: None,
            job_name: job_name.into(),
            baris: 1,
            quantity,
            unit_price,
            line_total,
        }
    }

    /// Set `line_total = quantity * unit_price` when the total is zero and
    /// the unit price is positive.
    ///
    /// Returns `false` if the product does not fit in a `Decimal`, leaving
    /// the total at zero.
    pub fn fill_total(&mut self) -> bool {
        if !self.line_total.is_zero() || self.unit_price <= Decimal::ZERO {
            return true;
        }
        match Decimal::from(self.quantity).checked_mul(self.unit_price) {
            Some(total) => {
                self.line_total = total;
                true
            }
            None => false,
        }
    }
}

/// One invoice after grouping: a header and its lines in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceAggregate {
    pub header: InvoiceHeader,

    pub lines: Vec<InvoiceLine>,

    /// Sum of line totals.
    pub subtotal: Decimal,

    /// `subtotal * vat_percentage / 100`, rounded to whole units.
    pub vat_amount: Decimal,

    /// `subtotal + vat_amount`.
    pub total: Decimal,
}

impl InvoiceAggregate {
    /// Create an aggregate with no lines and zero totals.
    pub fn new(header: InvoiceHeader) -> Self {
        Self {
            header,
            lines: Vec::new(),
            subtotal: Decimal::ZERO,
            vat_amount: Decimal::ZERO,
            total: Decimal::ZERO,
        }
    }

    pub fn invoice_number(&self) -> &str {
        &self.header.invoice_number
    }

    /// Recompute subtotal, VAT amount and total from the current lines.
    ///
    /// Returns `false` and zeroes all three when they overflow a `Decimal`.
    pub fn recalculate(&mut self) -> bool {
        let (subtotal, vat_amount, total, fits) = match self.checked_totals() {
            Some((subtotal, vat_amount, total)) => (subtotal, vat_amount, total, true),
            None => (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, false),
        };
        self.subtotal = subtotal;
        self.vat_amount = vat_amount;
        self.total = total;
        fits
    }

    /// Subtotal, VAT amount and total, or `None` on overflow.
    pub fn checked_totals(&self) -> Option<(Decimal, Decimal, Decimal)> {
        let subtotal = self
            .lines
            .iter()
            .try_fold(Decimal::ZERO, |sum, line| sum.checked_add(line.line_total))?;
        let vat_amount = subtotal
            .checked_mul(self.header.vat_percentage)?
            .checked_div(Decimal::ONE_HUNDRED)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        let total = subtotal.checked_add(vat_amount)?;
        Some((subtotal, vat_amount, total))
    }
}
