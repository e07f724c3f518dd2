//! Error types for volley

use thiserror::Error;

/// Core error type for volley operations
#[derive(Error, Debug)]
pub enum VolleyError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for volley operations
pub type Result<T> = std::result::Result<T, VolleyError>;
