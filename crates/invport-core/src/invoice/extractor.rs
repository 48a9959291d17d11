//! Turning resolved fields into invoice headers and lines.

use std::fmt::Display;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use super::columns::{FieldSource, LogicalField};
use super::rules::Coerced;
use crate::import::result::ImportWarning;
use crate::models::config::ImportOptions;
use crate::models::invoice::{InvoiceHeader, InvoiceLine, DEFAULT_COMPANY_NAME};

/// Builds header and line candidates from any [`FieldSource`].
///
/// Unparsable values fall back to the field default and add an
/// [`ImportWarning`]; missing required values are left for the caller or
/// validation to report.
#[derive(Debug, Clone)]
pub struct RowExtractor {
    default_vat: Decimal,
    today: NaiveDate,
}

impl RowExtractor {
    pub fn new(options: &ImportOptions, today: NaiveDate) -> Self {
        Self {
            default_vat: options.default_vat_percentage,
            today,
        }
    }

    pub fn invoice_number(&self, src: &impl FieldSource) -> Option<String> {
        src.text(LogicalField::InvoiceNumber)
    }

    /// Header candidate for `number`.
    pub fn header(
        &self,
        src: &impl FieldSource,
        number: &str,
        warnings: &mut Vec<ImportWarning>,
    ) -> InvoiceHeader {
        let company = src.text(LogicalField::CompanyName).unwrap_or_default();

        let invoice_date = match src.date(LogicalField::InvoiceDate) {
            Coerced::Value(date) => date,
            Coerced::Missing => {
                warnings.push(ImportWarning::new(
                    src.row_number(),
                    LogicalField::InvoiceDate.name(),
                    format!("Invoice date missing, using {}", self.today),
                ));
                self.today
            }
            Coerced::Invalid(raw) => {
                warn_invalid(src, LogicalField::InvoiceDate, &raw, self.today, warnings);
                self.today
            }
        };

        let due_date = match src.date(LogicalField::DueDate) {
            Coerced::Value(date) => Some(date),
            Coerced::Missing => None,
            Coerced::Invalid(raw) => {
                warn_invalid(src, LogicalField::DueDate, &raw, "none", warnings);
                None
            }
        };

        let vat_percentage = or_default(
            src,
            LogicalField::VatPercentage,
            src.decimal(LogicalField::VatPercentage),
            self.default_vat,
            warnings,
        );

        let mut header = InvoiceHeader::new(number, company, invoice_date);
        header.company_tax_id = src.text(LogicalField::CompanyTaxId);
        header.due_date = due_date;
        header.vat_percentage = vat_percentage;
        header.notes = src.text(LogicalField::Notes);
        header
    }

    /// Line candidate, or `None` when the source names neither a worker nor a job.
    pub fn line(&self, src: &impl FieldSource, warnings: &mut Vec<ImportWarning>) -> Option<InvoiceLine> {
        let tka_name = src.text(LogicalField::TkaName);
        let job_name = src.text(LogicalField::JobName);
        if tka_name.is_none() && job_name.is_none() {
            debug!("Row {}: no worker or job, skipping line", src.row_number());
            return None;
        }

        let baris = or_default(src, LogicalField::Baris, src.integer(LogicalField::Baris), 1, warnings);
        let quantity = or_default(src, LogicalField::Quantity, src.integer(LogicalField::Quantity), 1, warnings);
        let unit_price = or_default(
            src,
            LogicalField::UnitPrice,
            src.decimal(LogicalField::UnitPrice),
            Decimal::ZERO,
            warnings,
        );
        let line_total = or_default(
            src,
            LogicalField::LineTotal,
            src.decimal(LogicalField::LineTotal),
            Decimal::ZERO,
            warnings,
        );

        let mut line = InvoiceLine::new(
            tka_name.unwrap_or_default(),
            job_name.unwrap_or_default(),
            quantity,
            unit_price,
            line_total,
        );
        line.tka_passport = src.text(LogicalField::TkaPassport);
        line.baris = baris;
        if !line.fill_total() {
            warnings.push(ImportWarning::new(
                src.row_number(),
                LogicalField::LineTotal.name(),
                format!("Line total {} x {} is out of range, using 0", quantity, unit_price),
            ));
        }
        Some(line)
    }

    /// Header shared by every row of a single-invoice source.
    pub fn synthetic_header(&self, options: &ImportOptions) -> InvoiceHeader {
        let number = options
            .default_invoice_number
            .clone()
            .unwrap_or_else(|| InvoiceHeader::synthetic_number(self.today));
        let company = options
            .default_company_name
            .clone()
            .unwrap_or_else(|| DEFAULT_COMPANY_NAME.to_string());

        let mut header = InvoiceHeader::new(number, company, self.today);
        header.vat_percentage = self.default_vat;
        header
    }
}

fn or_default<T: Display>(
    src: &impl FieldSource,
    field: LogicalField,
    value: Coerced<T>,
    default: T,
    warnings: &mut Vec<ImportWarning>,
) -> T {
    match value {
        Coerced::Value(v) => v,
        Coerced::Missing => default,
        Coerced::Invalid(raw) => {
            warn_invalid(src, field, &raw, &default, warnings);
            default
        }
    }
}

fn warn_invalid(
    src: &impl FieldSource,
    field: LogicalField,
    raw: &str,
    fallback: impl Display,
    warnings: &mut Vec<ImportWarning>,
) {
    warnings.push(ImportWarning::new(
        src.row_number(),
        field.name(),
        format!("Invalid value '{}', using {}", raw, fallback),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Table;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn extractor() -> RowExtractor {
        RowExtractor::new(&ImportOptions::default(), today())
    }

    fn table(csv: &str) -> Table {
        Table::from_delimited(csv, ',', true).unwrap()
    }

    #[test]
    fn test_header_fields() {
        let t = table(
            "invoice_number,company,npwp,date,due,ppn,remarks\n\
             INV-1,PT Maju,01.234,31/12/2024,2025-01-31,12,urgent\n",
        );
        let row = t.rows().next().unwrap();
        let mut warnings = Vec::new();

        let ex = extractor();
        let number = ex.invoice_number(&row).unwrap();
        let header = ex.header(&row, &number, &mut warnings);

        assert_eq!(header.invoice_number, "INV-1");
        assert_eq!(header.company_name, "PT Maju");
        assert_eq!(header.company_tax_id.as_deref(), Some("01.234"));
        assert_eq!(header.invoice_date, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        assert_eq!(header.due_date, NaiveDate::from_ymd_opt(2025, 1, 31));
        assert_eq!(header.vat_percentage, Decimal::from(12));
        assert_eq!(header.notes.as_deref(), Some("urgent"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_header_defaults_with_warnings() {
        let t = table("invoice_number,invoice_date,vat\nINV-1,not-a-date,abc\n");
        let row = t.rows().next().unwrap();
        let mut warnings = Vec::new();

        let header = extractor().header(&row, "INV-1", &mut warnings);

        assert_eq!(header.invoice_date, today());
        assert_eq!(header.vat_percentage, Decimal::from(11));
        assert_eq!(header.company_name, "");
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].field, "invoice_date");
        assert_eq!(warnings[1].field, "vat_percentage");
        assert_eq!(warnings[1].row, 1);
    }

    #[test]
    fn test_line_fields_and_total() {
        let t = table("worker,passport,job,group,qty,price\nBudi,A123,Welding,2,3,Rp 1.500\n");
        let row = t.rows().next().unwrap();
        let mut warnings = Vec::new();

        let line = extractor().line(&row, &mut warnings).unwrap();

        assert_eq!(line.tka_name, "Budi");
        assert_eq!(line.tka_passport.as_deref(), Some("A123"));
        assert_eq!(line.job_name, "Welding");
        assert_eq!(line.baris, 2);
        assert_eq!(line.quantity, 3);
        assert_eq!(line.unit_price, Decimal::from(1500));
        assert_eq!(line.line_total, Decimal::from(4500));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_line_invalid_quantity_defaults_to_one() {
        let t = table("tka_name,job_name,quantity,unit_price\nBudi,Welding,many,100\n");
        let row = t.rows().next().unwrap();
        let mut warnings = Vec::new();

        let line = extractor().line(&row, &mut warnings).unwrap();

        assert_eq!(line.quantity, 1);
        assert_eq!(line.line_total, Decimal::from(100));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "quantity");
    }

    #[test]
    fn test_line_without_worker_or_job_is_skipped() {
        let t = table("tka_name,job_name,quantity\n,,5\n");
        let row = t.rows().next().unwrap();
        assert!(extractor().line(&row, &mut Vec::new()).is_none());
    }

    #[test]
    fn test_synthetic_header() {
        let ex = extractor();
        let header = ex.synthetic_header(&ImportOptions::default());
        assert_eq!(header.invoice_number, "IMP-20250301-001");
        assert_eq!(header.company_name, "Imported Company");
        assert_eq!(header.invoice_date, today());

        let options = ImportOptions {
            default_invoice_number: Some("INV-77".into()),
            default_company_name: Some("PT Jaya".into()),
            default_vat_percentage: Decimal::from(10),
            ..Default::default()
        };
        let header = RowExtractor::new(&options, today()).synthetic_header(&options);
        assert_eq!(header.invoice_number, "INV-77");
        assert_eq!(header.company_name, "PT Jaya");
        assert_eq!(header.vat_percentage, Decimal::from(10));
    }
}
