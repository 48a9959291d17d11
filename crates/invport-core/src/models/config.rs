//! Configuration structures for the import pipeline.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::invoice::DEFAULT_VAT_PERCENTAGE;
use crate::error::{InvportError, Result};
use crate::source::TextEncoding;

/// Main configuration for invport.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvportConfig {
    /// Import options.
    pub import: ImportOptions,

    /// Output configuration.
    pub output: OutputConfig,
}

/// Options for a single import run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Field delimiter for delimited text. Detected when unset.
    pub delimiter: Option<char>,

    /// Text encoding for delimited text. Detected from the BOM when unset.
    pub encoding: Option<TextEncoding>,

    /// Treat the first non-blank line of delimited text as column names.
    pub has_headers: bool,

    /// Invoice number for single-invoice sources.
    pub default_invoice_number: Option<String>,

    /// Company name for single-invoice sources.
    pub default_company_name: Option<String>,

    /// VAT percentage used when a source does not carry one.
    pub default_vat_percentage: Decimal,

    /// Caller intends to review the result only, not persist it.
    pub validate_only: bool,

    /// Caller should skip invoices already present in storage.
    pub skip_duplicates: bool,

    /// Caller should create companies and workers that do not exist yet.
    pub create_missing_entities: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: None,
            has_headers: true,
            default_invoice_number: None,
            default_company_name: None,
            default_vat_percentage: DEFAULT_VAT_PERCENTAGE,
            validate_only: false,
            skip_duplicates: false,
            create_missing_entities: false,
        }
    }
}

/// Output configuration for the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON output.
    pub pretty_json: bool,

    /// Include validation issues in text output.
    pub show_validation: bool,

    /// Maximum number of row errors printed to the terminal (0 = unlimited).
    pub max_errors_shown: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty_json: true,
            show_validation: true,
            max_errors_shown: 20,
        }
    }
}

impl InvportConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| InvportError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| InvportError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
