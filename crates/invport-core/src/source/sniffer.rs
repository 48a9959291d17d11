//! Encoding and delimiter detection for delimited text.

use tracing::{debug, warn};

use super::TextEncoding;

/// Delimiters tried during detection, in tie-break order.
pub const DELIMITER_CANDIDATES: [char; 4] = [',', ';', '\t', '|'];

/// Number of lines sampled for delimiter detection.
const SAMPLE_LINES: usize = 5;

/// Detect the encoding from a byte-order mark in the first bytes.
///
/// Returns the encoding and the BOM length in bytes; UTF-8 with length 0
/// when no BOM is present.
pub fn detect_encoding(bytes: &[u8]) -> (TextEncoding, usize) {
    let head = &bytes[..bytes.len().min(4)];

    match head {
        [0xEF, 0xBB, 0xBF, ..] => (TextEncoding::Utf8, 3),
        [0xFF, 0xFE, ..] => (TextEncoding::Utf16Le, 2),
        [0xFE, 0xFF, ..] => (TextEncoding::Utf16Be, 2),
        _ => (TextEncoding::Utf8, 0),
    }
}

/// Decode raw file bytes into text.
///
/// With no override the encoding comes from [`detect_encoding`]. A BOM
/// matching the chosen encoding is removed. Malformed sequences are replaced
/// rather than rejected.
pub fn decode_text(bytes: &[u8], encoding: Option<TextEncoding>) -> (String, TextEncoding) {
    let (detected, bom_len) = detect_encoding(bytes);
    let encoding = encoding.unwrap_or(detected);
    let body = if encoding == detected && bom_len > 0 {
        &bytes[bom_len..]
    } else {
        bytes
    };

    let (text, had_errors) = encoding
        .as_encoding()
        .decode_without_bom_handling(body);
    if had_errors {
        warn!("Input contains bytes that are not valid {}", encoding.label());
    }

    (text.into_owned(), encoding)
}

/// Detect the field delimiter from the first non-blank lines.
///
/// A candidate is consistent when every sampled line contains it the same,
/// non-zero number of times. The consistent candidate with the highest count
/// wins; `,` is returned when none is consistent.
pub fn detect_delimiter(text: &str) -> char {
    let sample: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SAMPLE_LINES)
        .collect();

    let mut best: Option<(char, usize)> = None;

    for &candidate in &DELIMITER_CANDIDATES {
        let mut counts = sample.iter().map(|line| line.matches(candidate).count());
        let Some(first) = counts.next() else {
            break;
        };
        if first == 0 || !counts.all(|c| c == first) {
            continue;
        }
        if best.is_none_or(|(_, count)| first > count) {
            best = Some((candidate, first));
        }
    }

    let delimiter = best.map(|(d, _)| d).unwrap_or(',');
    debug!("Detected delimiter {:?} from {} sample lines", delimiter, sample.len());
    delimiter
}
