use std::path::PathBuf;
use thiserror::Error;

/// Main error type for kgrelations
#[derive(Error, Debug)]
pub enum KgError {
    /// Transport-level failure talking to the search endpoint
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The search endpoint answered with a non-success status
    #[error("Knowledge Graph API error {status}: {body}")]
    Api { status: u16, body: String },

    /// Response body was not the JSON we expected
    #[error("Decode error: {0}")]
    Decode(String),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error tied to a specific file
    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON parse errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// JSON serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation the search backend cannot serve
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Convenient Result type using KgError
pub type Result<T> = std::result::Result<T, KgError>;
