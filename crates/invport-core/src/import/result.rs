//! Outcome of one import run.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::classifier::Structure;
use crate::invoice::validation::ValidationIssue;
use crate::models::config::ImportOptions;
use crate::models::invoice::InvoiceAggregate;
use crate::source::FileType;

/// A problem that prevented a row (or the whole file, at row 0) from being imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportError {
    /// 1-based data row number; 0 for file-level errors.
    pub row: usize,

    /// Worksheet the row came from, for workbook sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,

    pub field: String,

    pub message: String,
}

/// A recoverable problem: the row was imported with a default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportWarning {
    pub row: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,

    pub field: String,

    pub message: String,
}

impl ImportError {
    pub fn new(row: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            row,
            sheet: None,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn in_sheet(mut self, sheet: Option<&str>) -> Self {
        self.sheet = sheet.map(str::to_string);
        self
    }
}

impl ImportWarning {
    pub fn new(row: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            row,
            sheet: None,
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn in_sheet(mut self, sheet: Option<&str>) -> Self {
        self.sheet = sheet.map(str::to_string);
        self
    }
}

/// Everything an import produced. Built up during the run, read-only once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    pub file_name: String,

    /// `None` when the file could not be typed (never for a real path).
    pub file_type: Option<FileType>,

    /// Detected structure of a tabular source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<Structure>,

    /// Data rows read (header rows excluded).
    pub total_records: usize,

    /// Rows that were accepted.
    pub success_count: usize,

    /// Rows that produced an error.
    pub failed_count: usize,

    pub errors: Vec<ImportError>,

    pub warnings: Vec<ImportWarning>,

    /// Grouped invoices in order of first appearance.
    pub invoices: Vec<InvoiceAggregate>,

    /// Validation issues over `invoices`. Never removes an invoice.
    pub validation: Vec<ValidationIssue>,

    /// Stopped early by a cancel request.
    pub cancelled: bool,

    /// `failed_count == 0`.
    pub success: bool,

    pub validate_only: bool,
    pub skip_duplicates: bool,
    pub create_missing_entities: bool,
}

impl ImportResult {
    pub fn new(file_name: impl Into<String>, file_type: Option<FileType>, options: &ImportOptions) -> Self {
        Self {
            file_name: file_name.into(),
            file_type,
            structure: None,
            total_records: 0,
            success_count: 0,
            failed_count: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
            invoices: Vec::new(),
            validation: Vec::new(),
            cancelled: false,
            success: true,
            validate_only: options.validate_only,
            skip_duplicates: options.skip_duplicates,
            create_missing_entities: options.create_missing_entities,
        }
    }

    /// Mark the whole file as failed with a single row-0 error.
    pub fn file_error(&mut self, message: impl Into<String>) {
        self.total_records = 0;
        self.success_count = 0;
        self.failed_count = 1;
        self.errors.push(ImportError::new(0, "file", message));
        self.success = false;
    }

    /// Record a failed row.
    pub fn record_failure(&mut self, error: ImportError) {
        self.failed_count += 1;
        self.errors.push(error);
    }

    pub fn record_success(&mut self) {
        self.success_count += 1;
    }

    /// Finalise counters and the success flag.
    pub fn finish(&mut self, invoices: Vec<InvoiceAggregate>, validation: Vec<ValidationIssue>) {
        self.invoices = invoices;
        self.validation = validation;
        self.success = self.failed_count == 0;
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Sum of invoice totals, or `None` if it overflows.
    pub fn grand_total(&self) -> Option<Decimal> {
        self.invoices
            .iter()
            .try_fold(Decimal::ZERO, |sum, invoice| sum.checked_add(invoice.total))
    }

    /// Number of invoice lines across all invoices.
    pub fn line_count(&self) -> usize {
        self.invoices.iter().map(|i| i.lines.len()).sum()
    }
}
