//! Error types for the docstore crate.

use thiserror::Error;

/// Errors raised by collections, the aggregation pipeline and the seed loader.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Seed file could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading a seed file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Seed file was not valid JSON, or not an array of objects
    #[error("Parse error in {file}: {reason}")]
    ParseError { file: String, reason: String },

    /// A document field had a value of the wrong type
    #[error("Invalid value for {field} in document {index} of {file}: {value}")]
    InvalidValue {
        file: String,
        index: usize,
        field: String,
        value: String,
    },

    /// A pipeline stage referenced a collection the store does not hold
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    /// The backing store cannot serve the request
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, StoreError>;
