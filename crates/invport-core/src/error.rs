//! Error types for the invport-core library.
//!
//! Only file-level failures are errors. Problems confined to a single row
//! are recorded as data on the [`ImportResult`](crate::import::ImportResult).

use thiserror::Error;

/// Main error type for the invport library.
#[derive(Error, Debug)]
pub enum InvportError {
    /// Source file could not be read or decoded.
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors that abort an import before any row is processed.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The input path does not exist.
    #[error("file not found: {0}")]
    NotFound(String),

    /// The input could not be read.
    #[error("failed to read file: {0}")]
    Read(#[from] std::io::Error),

    /// Workbook could not be opened or a worksheet could not be read.
    #[error("failed to read workbook: {0}")]
    Workbook(String),

    /// JSON document is malformed or has an unexpected shape.
    #[error("invalid JSON document: {0}")]
    Json(String),

    /// The source contains no header or data.
    #[error("source is empty")]
    Empty,
}

impl From<calamine::Error> for SourceError {
    fn from(err: calamine::Error) -> Self {
        SourceError::Workbook(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Json(err.to_string())
    }
}

/// Result type for the invport library.
pub type Result<T> = std::result::Result<T, InvportError>;
