//! # docport-core
//!
//! Export pipeline over a rendered editor surface.
//!
//! Three independent operations read the same [`RenderTree`]:
//!
//! - **PDF**: capture the surface as one raster and split it across A4
//!   pages ([`docport_pdf`])
//! - **DOCX**: sanitize a snapshot, wrap it in a fixed stylesheet and
//!   package it ([`semantic`])
//! - **XLSX**: one row per non-blank line of the surface text ([`tabular`])
//!
//! [`Exporter`] runs them and hands each artifact to a [`FileDelivery`].
//!
//! ## Example
//!
//! ```no_run
//! use docport_core::{DirectoryDelivery, NativeExporter};
//! use docport_snapshot::HttpFetcher;
//! use docport_surface::RenderTree;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let tree = RenderTree::from_page(&std::fs::read_to_string("editor.html")?, None)?;
//! let exporter = NativeExporter::native(HttpFetcher::new(), DirectoryDelivery::new("out"))
//!     .with_file_name("Report");
//! for outcome in exporter.export_all(&tree).await {
//!     println!("{:?}", outcome?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [`RenderTree`]: docport_surface::RenderTree

pub mod delivery;
pub mod error;
pub mod export;
pub mod semantic;
pub mod tabular;

pub use delivery::{DirectoryDelivery, ExportArtifact, FileDelivery, MemoryDelivery};
pub use error::{ExportError, Result};
pub use export::{ExportFormat, ExportOutcome, Exporter, NativeExporter, DEFAULT_FILE_NAME};
pub use semantic::{html_shell, Blob, DocumentPackager, PackagerOutput, SemanticExporter, DOCUMENT_STYLESHEET};
pub use tabular::{rows_from_text, SheetSerializer, TabularExporter, XlsxSerializer, CONTENT_FIELD, SHEET_NAME};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
