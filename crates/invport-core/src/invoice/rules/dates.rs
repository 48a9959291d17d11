//! Date parsing for invoice and due dates.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::patterns::LONG_DATE;

/// Exact formats tried first, in priority order. Day-first wins for
/// ambiguous values such as `01/02/2024`.
const EXACT_FORMATS: [&str; 4] = ["%d/%m/%Y", "%m/%d/%Y", "%Y-%m-%d", "%d-%m-%Y"];

/// Time-of-day suffixes accepted after any exact format.
const TIME_SUFFIXES: [&str; 2] = [" %H:%M:%S", " %H:%M"];

/// Parse a date cell.
///
/// Tries the exact formats, then the same formats with a trailing time of
/// day, then a general parse (RFC 3339, ISO date-time, `yyyy/mm/dd`,
/// `dd.mm.yyyy`, long month names in Indonesian or English).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in EXACT_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    for fmt in EXACT_FORMATS {
        for suffix in TIME_SUFFIXES {
            let pattern = format!("{}{}", fmt, suffix);
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, &pattern) {
                return Some(dt.date());
            }
        }
    }

    parse_general(s)
}

fn parse_general(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    for fmt in ["%Y/%m/%d", "%d.%m.%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    let caps = LONG_DATE.captures(s)?;
    let day: u32 = caps[1].parse().ok()?;
    let month = month_to_number(&caps[2])?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Month number from an Indonesian or English month name or abbreviation.
fn month_to_number(name: &str) -> Option<u32> {
    let month = match name.to_lowercase().as_str() {
        "januari" | "january" | "jan" => 1,
        "februari" | "february" | "feb" => 2,
        "maret" | "march" | "mar" => 3,
        "april" | "apr" => 4,
        "mei" | "may" => 5,
        "juni" | "june" | "jun" => 6,
        "juli" | "july" | "jul" => 7,
        "agustus" | "august" | "agu" | "agt" | "aug" => 8,
        "september" | "sep" | "sept" => 9,
        "oktober" | "october" | "okt" | "oct" => 10,
        "november" | "nov" => 11,
        "desember" | "december" | "des" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}
