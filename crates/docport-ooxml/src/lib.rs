//! # docport-ooxml
//!
//! Office Open XML package writers for docport.
//!
//! This crate provides functionality to:
//! - Package an HTML document as DOCX ([`HtmlDocxPackager`])
//! - Write single-sheet text workbooks as XLSX ([`Workbook`])
//! - Read packages back for inspection ([`Package`])
//!
//! Output is deterministic: the same input always yields the same bytes.

pub mod archive;
pub mod content_types;
pub mod docx;
pub mod error;
pub mod properties;
pub mod relationships;
pub mod xlsx;
mod xml;

pub use archive::Package;
pub use content_types::ContentTypes;
pub use docx::{DocumentStyles, DocxOptions, HtmlDocxPackager, PageMargins};
pub use error::{OoxmlError, Result};
pub use relationships::{Relationship, Relationships};
pub use xlsx::{Workbook, Worksheet};

/// MIME type of DOCX documents
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// MIME type of XLSX workbooks
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
