use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartDataError {
    #[error("Resource not found: {resource} (looked in {})", .path.display())]
    ResourceNotFound { resource: String, path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a raw timestamp could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("epoch seconds out of range: {raw}")]
    Overflow { raw: String },

    #[error("unrecognized timestamp: {raw}")]
    Format { raw: String },
}

/// Why a CSV row was dropped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("expected at least 5 fields, found {found}")]
    TooFewFields { found: usize },

    #[error("invalid {field} value {value:?}: {reason}")]
    InvalidNumber {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("non-finite {field} value {value:?}")]
    NonFinite { field: &'static str, value: String },

    #[error("unreadable row: {0}")]
    Malformed(String),
}
