//! Heuristic classification of a table's structure from its column names.

use serde::{Deserialize, Serialize};

/// How rows of a table relate to invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Structure {
    /// Every row is a line of one invoice.
    SingleInvoice,
    /// Rows carry their own invoice number and are grouped.
    MultiInvoice,
}

const SINGLE_KEYWORDS: [&str; 6] = ["no", "item", "description", "quantity", "price", "total"];
const MULTI_KEYWORDS: [&str; 3] = ["invoice_number", "company_name", "date"];

/// Number of keywords found as a substring of any column name.
fn score(columns: &[String], keywords: &[&str]) -> usize {
    keywords
        .iter()
        .filter(|kw| columns.iter().any(|c| c.to_lowercase().contains(*kw)))
        .count()
}

/// `(single, multi)` keyword scores for a set of column names.
pub fn scores(columns: &[String]) -> (usize, usize) {
    (score(columns, &SINGLE_KEYWORDS), score(columns, &MULTI_KEYWORDS))
}

/// Classify a table. Ties go to [`Structure::MultiInvoice`].
pub fn classify(columns: &[String]) -> Structure {
    let (single, multi) = scores(columns);
    if single > multi {
        Structure::SingleInvoice
    } else {
        Structure::MultiInvoice
    }
}
