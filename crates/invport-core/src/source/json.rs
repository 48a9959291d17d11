//! JSON documents: a single invoice object or an array of them.

use serde_json::Value;

use super::Result;
use crate::error::SourceError;

/// Parse a JSON document into its top-level records.
///
/// An object yields one record, an array yields its elements in order.
/// Elements are returned as-is; shape checks happen per record so one bad
/// element does not abort the import.
pub fn read_records(text: &str) -> Result<Vec<Value>> {
    let trimmed = text.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Err(SourceError::Empty);
    }

    match serde_json::from_str::<Value>(trimmed)? {
        Value::Array(items) => Ok(items),
        value @ Value::Object(_) => Ok(vec![value]),
        _ => Err(SourceError::Json(
            "expected an invoice object or an array of invoice objects".to_string(),
        )),
    }
}
