//! docport CLI - Command-line interface library
//!
//! Exports a rendered editor page to:
//! - PDF: paginated image capture
//! - DOCX: styled word-processing document
//! - XLSX: one row per line of text
//!
//! # Binary Usage
//!
//! ```bash
//! # All three formats into ./exports
//! docport all editor.html --output exports
//!
//! # DOCX only, editor surface selected by id
//! docport docx editor.html --root editor --name Report
//! ```

pub mod app;
pub mod config;

pub use app::{export_command, load_tree, run_cli, ExportArgs};
pub use config::Settings;
