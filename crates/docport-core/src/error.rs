//! Error types for export operations

use std::path::PathBuf;

use docport_ooxml::OoxmlError;
use docport_pdf::PdfError;
use thiserror::Error;

/// Errors that abort an export operation
#[derive(Error, Debug)]
pub enum ExportError {
    /// Capture or PDF assembly failed
    #[error("PDF export error: {0}")]
    Pdf(#[from] PdfError),

    /// DOCX or XLSX packaging failed
    #[error("Packaging error: {0}")]
    Ooxml(#[from] OoxmlError),

    /// A packaging task panicked or was aborted
    #[error("Packaging task failed: {0}")]
    Task(String),

    /// File base name cannot be used as a file name
    #[error("Invalid file name: {0:?}")]
    InvalidFileName(String),

    /// Writing the artifact failed
    #[error("Failed to deliver {}: {source}", path.display())]
    Delivery {
        /// Target path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

/// Result type for export operations
pub type Result<T> = std::result::Result<T, ExportError>;
