//! Regex patterns used when cleaning raw cell values.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Currency markers stripped before numeric parsing (Rp, Rp., IDR, $)
    pub static ref CURRENCY_TOKENS: Regex = Regex::new(
        r"(?i)rp\.?|idr|\$"
    ).unwrap();

    // Indonesian and English month names in long-form dates
    pub static ref LONG_DATE: Regex = Regex::new(
        r"^(\d{1,2})\s+([[:alpha:]]+)\.?\s+(\d{4})$"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_tokens() {
        assert_eq!(CURRENCY_TOKENS.replace_all("Rp 15.000", ""), " 15.000");
        assert_eq!(CURRENCY_TOKENS.replace_all("Rp.15.000", ""), "15.000");
        assert_eq!(CURRENCY_TOKENS.replace_all("IDR 5", ""), " 5");
        assert_eq!(CURRENCY_TOKENS.replace_all("$1,234", ""), "1,234");
    }

    #[test]
    fn test_long_date() {
        let caps = LONG_DATE.captures("17 Agustus 2024").unwrap();
        assert_eq!(&caps[1], "17");
        assert_eq!(&caps[2], "Agustus");
        assert_eq!(&caps[3], "2024");
    }
}
