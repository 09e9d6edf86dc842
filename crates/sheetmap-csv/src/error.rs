//! Table I/O error types

use thiserror::Error;

/// Result type for table I/O
pub type CsvResult<T> = std::result::Result<T, CsvError>;

/// Errors that can occur while reading or writing tables
#[derive(Debug, Error)]
pub enum CsvError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV library error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON input that is not an array of rows
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unsupported input file
    #[error("Unsupported table format: {0}")]
    UnsupportedFormat(String),
}
