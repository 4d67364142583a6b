//! Error types for fusion-core

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in fusion-core
#[derive(Debug, Error)]
pub enum Error {
    /// File extension or declared format is not supported
    #[error("unsupported file format '{format}' for '{file_id}'")]
    UnsupportedFormat { file_id: String, format: String },

    /// File exceeds the configured size limit
    #[error("file '{file_id}' is {size} bytes, exceeding the {limit} byte limit")]
    SizeLimit {
        file_id: String,
        size: usize,
        limit: usize,
    },

    /// Failed to parse file content
    #[error("failed to parse '{file_id}': {message}")]
    Parse { file_id: String, message: String },

    /// Join key column is absent from a table after reconciliation
    #[error("key column '{column}' not found in '{file_id}'")]
    MissingKeyColumn { column: String, file_id: String },

    /// A referenced column does not exist
    #[error("column '{0}' not found")]
    UnknownColumn(String),

    /// Expression syntax error or unresolved column reference
    #[error("expression error: {0}")]
    Expression(String),

    /// Malformed merge spec or transformation step parameters
    #[error("invalid specification: {0}")]
    InvalidSpec(String),

    /// No transformer registered under the given name
    #[error("no transformer registered under '{0}'")]
    UnknownTransformer(String),

    /// Transformer parameter validation failed
    #[error("invalid parameters for '{transformer}': {message}")]
    InvalidParams {
        transformer: String,
        message: String,
    },

    /// Failed to serialize or write an export
    #[error("export failed: {0}")]
    Export(String),

    /// CSV error from the csv crate
    #[error("CSV error in '{file_id}': {source}")]
    Csv {
        file_id: String,
        #[source]
        source: csv::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
