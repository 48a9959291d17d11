//! Readers that turn an input file into tables or a JSON tree.

pub mod json;
pub mod sniffer;
pub mod table;
pub mod tokenizer;
pub mod workbook;

pub use sniffer::{decode_text, detect_delimiter, detect_encoding, DELIMITER_CANDIDATES};
pub use table::{clean_column_name, Row, Table};
pub use tokenizer::tokenize_line;
pub use workbook::{SheetLayout, Workbook};

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// Result type for source operations.
pub type Result<T> = std::result::Result<T, SourceError>;

/// Kind of input file, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    /// `.csv` or `.txt`.
    DelimitedText,
    /// `.xlsx`, `.xls`, and anything unrecognised.
    Spreadsheet,
    /// `.json`.
    JsonDocument,
}

impl FileType {
    /// Decide the file type from the path extension (case-insensitive).
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "csv" | "txt" => FileType::DelimitedText,
            "json" => FileType::JsonDocument,
            _ => FileType::Spreadsheet,
        }
    }
}

/// Character encoding of a delimited text file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    pub(crate) fn as_encoding(self) -> &'static encoding_rs::Encoding {
        match self {
            TextEncoding::Utf8 => encoding_rs::UTF_8,
            TextEncoding::Utf16Le => encoding_rs::UTF_16LE,
            TextEncoding::Utf16Be => encoding_rs::UTF_16BE,
        }
    }

    /// Display label, e.g. `UTF-16LE`.
    pub fn label(self) -> &'static str {
        self.as_encoding().name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_from_extension() {
        assert_eq!(FileType::from_path(Path::new("a.csv")), FileType::DelimitedText);
        assert_eq!(FileType::from_path(Path::new("a.TXT")), FileType::DelimitedText);
        assert_eq!(FileType::from_path(Path::new("a.xlsx")), FileType::Spreadsheet);
        assert_eq!(FileType::from_path(Path::new("a.xls")), FileType::Spreadsheet);
        assert_eq!(FileType::from_path(Path::new("a.Json")), FileType::JsonDocument);
    }

    #[test]
    fn test_unknown_extension_is_spreadsheet() {
        assert_eq!(FileType::from_path(Path::new("a.dat")), FileType::Spreadsheet);
        assert_eq!(FileType::from_path(Path::new("noext")), FileType::Spreadsheet);
    }

    #[test]
    fn test_encoding_labels() {
        assert_eq!(TextEncoding::Utf8.label(), "UTF-8");
        assert_eq!(TextEncoding::Utf16Le.label(), "UTF-16LE");
        assert_eq!(TextEncoding::Utf16Be.label(), "UTF-16BE");
    }
}
