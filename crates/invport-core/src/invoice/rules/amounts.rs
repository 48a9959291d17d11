//! Decimal amounts such as `Rp 15.000.000`.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::CURRENCY_TOKENS;

/// Parse an amount written in the regional (Indonesian) style.
///
/// Currency tokens, whitespace and both `,` and `.` grouping separators are
/// removed before parsing, so `"Rp 15.000.000"` and `"1,234"` become
/// integers. If that fails the currency-stripped text is parsed as a plain
/// or scientific decimal.
///
/// Known limitation: a fractional part is not preserved, `"12.50"` parses
/// as `1250`. Sources that need fractions must not use separators.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let stripped = CURRENCY_TOKENS.replace_all(s, "");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        return None;
    }

    let regional: String = stripped
        .chars()
        .filter(|c| !matches!(c, ',' | '.') && !c.is_whitespace())
        .collect();

    Decimal::from_str(&regional)
        .ok()
        .or_else(|| parse_invariant(stripped))
}

fn parse_invariant(s: &str) -> Option<Decimal> {
    let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
    Decimal::from_str(&compact)
        .or_else(|_| Decimal::from_scientific(&compact))
        .ok()
}

/// Format an amount with `.` thousand separators (`15.000.000`).
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round();
    let digits = rounded.abs().to_string();

    let chars: Vec<char> = digits.chars().collect();
    let mut formatted = String::new();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(*c);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{}", formatted)
    } else {
        formatted
    }
}
