//! Core library for importing invoice data from tabular sources.
//!
//! This crate provides:
//! - Format, encoding and delimiter detection for delimited text
//! - Spreadsheet workbooks (single sheet or split header/line sheets)
//! - JSON invoice documents
//! - Alias-based column resolution and regional number/date coercion
//! - Grouping of rows into invoices with VAT totals and validation
//!
//! ```no_run
//! use std::path::Path;
//! use invport_core::{Importer, ImportOptions};
//!
//! let result = Importer::new(ImportOptions::default()).import_file(Path::new("invoices.csv"));
//! println!("{} invoices, {} errors", result.invoices.len(), result.errors.len());
//! ```

pub mod error;
pub mod import;
pub mod invoice;
pub mod models;
pub mod source;

pub use error::{InvportError, Result, SourceError};
pub use import::{CancelToken, Detection, ImportError, ImportResult, ImportWarning, Importer, Structure};
pub use invoice::{LogicalField, ValidationIssue};
pub use models::config::{ImportOptions, InvportConfig, OutputConfig};
pub use models::invoice::{InvoiceAggregate, InvoiceHeader, InvoiceLine};
pub use source::{FileType, TextEncoding};
