//! Logical invoice fields and the physical column names accepted for them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

use super::rules::{clean_string, parse_amount, parse_date, parse_integer, Coerced};
use crate::source::Row;

/// A canonical field, independent of the column name a source uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalField {
    InvoiceNumber,
    CompanyName,
    CompanyTaxId,
    InvoiceDate,
    DueDate,
    VatPercentage,
    Notes,
    TkaName,
    TkaPassport,
    JobName,
    Baris,
    Quantity,
    UnitPrice,
    LineTotal,
}

impl LogicalField {
    /// Canonical name; also the JSON key.
    pub fn name(self) -> &'static str {
        match self {
            LogicalField::TkaPassport => "tka_passport",
            other => other.aliases()[0],
        }
    }

    /// Accepted column names, most preferred first.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            LogicalField::InvoiceNumber => &["invoice_number", "invoice_no", "number"],
            LogicalField::CompanyName => &["company_name", "company", "client"],
            LogicalField::CompanyTaxId => &["company_tax_id", "tax_id", "npwp"],
            LogicalField::InvoiceDate => &["invoice_date", "date"],
            LogicalField::DueDate => &["due_date", "due"],
            LogicalField::VatPercentage => &["vat_percentage", "vat_percent", "vat", "ppn"],
            LogicalField::Notes => &["notes", "note", "remarks"],
            LogicalField::TkaName => &["tka_name", "worker_name", "worker", "name"],
            LogicalField::TkaPassport => &["passport", "tka_passport", "passport_number"],
            LogicalField::JobName => &["job_name", "job", "description", "item"],
            LogicalField::Baris => &["baris", "group", "line_group"],
            LogicalField::Quantity => &["quantity", "qty"],
            LogicalField::UnitPrice => &["unit_price", "price"],
            LogicalField::LineTotal => &["line_total", "total", "amount"],
        }
    }
}

/// Anything a header or line can be read from.
pub trait FieldSource {
    /// 1-based record number used in errors and warnings.
    fn row_number(&self) -> usize;

    /// Trimmed, non-empty text of a field.
    fn text(&self, field: LogicalField) -> Option<String>;

    fn decimal(&self, field: LogicalField) -> Coerced<Decimal> {
        Coerced::from_raw(self.text(field), parse_amount)
    }

    fn integer(&self, field: LogicalField) -> Coerced<i64> {
        Coerced::from_raw(self.text(field), parse_integer)
    }

    fn date(&self, field: LogicalField) -> Coerced<NaiveDate> {
        Coerced::from_raw(self.text(field), parse_date)
    }
}

/// Return the first non-empty value among `aliases`, matching columns
/// case-insensitively.
pub fn resolve<'a>(row: &Row<'a>, aliases: &[&str]) -> Option<&'a str> {
    aliases
        .iter()
        .filter_map(|alias| row.get(alias))
        .find(|value| !value.trim().is_empty())
}

impl FieldSource for Row<'_> {
    fn row_number(&self) -> usize {
        self.number()
    }

    fn text(&self, field: LogicalField) -> Option<String> {
        resolve(self, field.aliases()).and_then(clean_string)
    }
}

/// A JSON object read with canonical keys only.
#[derive(Debug, Clone, Copy)]
pub struct JsonFields<'a> {
    object: &'a Map<String, Value>,
    number: usize,
}

impl<'a> JsonFields<'a> {
    pub fn new(object: &'a Map<String, Value>, number: usize) -> Self {
        Self { object, number }
    }
}

impl FieldSource for JsonFields<'_> {
    fn row_number(&self) -> usize {
        self.number
    }

    fn text(&self, field: LogicalField) -> Option<String> {
        match self.object.get(field.name())? {
            Value::String(s) => clean_string(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    // JSON numbers are exact; only strings go through separator stripping.
    fn decimal(&self, field: LogicalField) -> Coerced<Decimal> {
        match self.object.get(field.name()) {
            Some(Value::Number(n)) => {
                let raw = n.to_string();
                match Decimal::from_str(&raw).or_else(|_| Decimal::from_scientific(&raw)) {
                    Ok(value) => Coerced::Value(value),
                    Err(_) => Coerced::Invalid(raw),
                }
            }
            _ => Coerced::from_raw(self.text(field), parse_amount),
        }
    }
}
