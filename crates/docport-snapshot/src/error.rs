//! Error types for resource fetching

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching an image resource
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server returned {status} for {url}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Local file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Resolved path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Malformed `data:` URI
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    /// Source could not be resolved to a URL or path
    #[error("Invalid resource reference: {0}")]
    InvalidReference(String),

    /// URL scheme the fetcher does not serve
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// No resource registered for the source
    #[error("Resource not found: {0}")]
    NotFound(String),
}

/// Result type for fetch operations
pub type Result<T> = std::result::Result<T, FetchError>;
