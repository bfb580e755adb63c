//! Error types for render tree operations

use thiserror::Error;

/// Errors that can occur while loading or querying a render tree
#[derive(Error, Debug)]
pub enum SurfaceError {
    /// Markup could not be tokenized
    #[error("Markup error at byte {position}: {message}")]
    Markup {
        /// Byte offset reported by the reader
        position: u64,
        /// Reader message
        message: String,
    },

    /// A start tag carried a malformed attribute
    #[error("Invalid attribute in <{element}>: {message}")]
    Attribute {
        /// Tag name of the element
        element: String,
        /// Reader message
        message: String,
    },

    /// The markup contained no element at all
    #[error("Markup contains no root element")]
    NoRootElement,

    /// The requested surface root id does not exist in the page
    #[error("Surface root not found: #{0}")]
    RootNotFound(String),
}

/// Result type for render tree operations
pub type Result<T> = std::result::Result<T, SurfaceError>;
