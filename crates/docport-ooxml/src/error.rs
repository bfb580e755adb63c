//! Error types for OOXML package writing

use thiserror::Error;

/// Errors that can occur while building DOCX or XLSX packages
#[derive(Error, Debug)]
pub enum OoxmlError {
    /// Error reading or writing the ZIP archive
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Error reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing package XML
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The HTML input could not be read
    #[error("Markup error: {0}")]
    Markup(#[from] docport_surface::SurfaceError),

    /// Required part not found in a package
    #[error("Required part not found: {0}")]
    MissingPart(String),

    /// Invalid package or document structure
    #[error("Invalid document structure: {0}")]
    InvalidStructure(String),

    /// Invalid writer options
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

/// Result type for OOXML operations
pub type Result<T> = std::result::Result<T, OoxmlError>;
