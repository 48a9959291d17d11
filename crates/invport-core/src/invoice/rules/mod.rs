//! Coercion rules turning raw cell text into typed values.

pub mod amounts;
pub mod dates;
pub mod patterns;

pub use amounts::{format_amount, parse_amount};
pub use dates::parse_date;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Outcome of coercing an optional raw value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coerced<T> {
    /// Value present and parsed.
    Value(T),
    /// No value in the source.
    Missing,
    /// Value present but unparsable; carries the raw text.
    Invalid(String),
}

impl<T> Coerced<T> {
    /// Coerce an optional raw string with `parse`.
    pub fn from_raw(raw: Option<String>, parse: impl FnOnce(&str) -> Option<T>) -> Self {
        match raw {
            None => Coerced::Missing,
            Some(raw) => match parse(&raw) {
                Some(value) => Coerced::Value(value),
                None => Coerced::Invalid(raw),
            },
        }
    }

    pub fn value(self) -> Option<T> {
        match self {
            Coerced::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// Trim a string, treating empty as missing.
pub fn clean_string(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse an integer. Whole-number decimals such as `"3.0"` from worksheet
/// cells are accepted.
pub fn parse_integer(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>().ok().or_else(|| {
        s.parse::<Decimal>()
            .ok()
            .filter(|d| d.fract().is_zero())
            .and_then(|d| d.to_i64())
    })
}
