//! Error types for the fatura library.

use std::io;
use thiserror::Error;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while reading, parsing and exporting statements.
///
/// Parsers never surface data-quality problems to their callers: the
/// record-level variants below are produced internally and the offending
/// line, block or row is skipped.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred during read or write operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error serializing a statement to JSON.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid amount format.
    #[error("Invalid amount format: {0}")]
    InvalidAmount(String),

    /// Missing required field.
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Invalid date value.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Invalid format specified.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Input exceeds the accepted size.
    #[error("File too large: {size} bytes (limit is {limit} bytes)")]
    FileTooLarge { size: u64, limit: u64 },

    /// Input contained no text to parse.
    #[error("Could not extract any content from the input")]
    EmptyContent,

    /// A parse completed but found nothing to report.
    #[error("No transactions found; check that the file is a valid card statement")]
    NoTransactions,
}
