//! Error types for sheetmap-core

use thiserror::Error;

use crate::config::TargetCollection;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading or validating import configuration.
///
/// Nothing in here is produced per row: row-level problems are reported as
/// invalid rows by the mapping engine instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Price period outside the calendar
    #[error("Invalid price period: year {year}, month {month}")]
    InvalidPeriod { year: i32, month: u32 },

    /// No configuration registered under this key
    #[error("Unknown mapping configuration: {platform}/{name}")]
    UnknownConfig { platform: String, name: String },

    /// Two rules write the same target
    #[error("Duplicate mapping target {collection}:{path}")]
    DuplicateTarget {
        collection: TargetCollection,
        path: String,
    },

    /// Structurally invalid mapping rule
    #[error("Invalid mapping rule '{header}': {message}")]
    InvalidRule { header: String, message: String },

    /// Structurally invalid computed field
    #[error("Invalid computed field '{name}': {message}")]
    InvalidComputedField { name: String, message: String },

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    pub(crate) fn invalid_rule(header: &str, message: impl Into<String>) -> Self {
        Error::InvalidRule {
            header: header.to_string(),
            message: message.into(),
        }
    }
}
