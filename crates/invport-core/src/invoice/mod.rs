//! Invoice field resolution, extraction and validation.

pub mod columns;
pub mod extractor;
pub mod rules;
pub mod validation;

pub use columns::{resolve, FieldSource, JsonFields, LogicalField};
pub use extractor::RowExtractor;
pub use validation::{validate_all, validate_invoice, ValidationIssue};
