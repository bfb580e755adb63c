//! # docport-pdf
//!
//! Paginated image PDF export of a rendered editor surface.
//!
//! # Architecture
//!
//! The pipeline consists of three stages:
//!
//! 1. **Capture** - a [`Rasterizer`] turns the surface into one tall raster
//!    ([`NativeRasterizer`] lays it out as SVG and renders it with resvg)
//! 2. **Pagination** - the raster is scaled to the page width and split into
//!    page bands by offset ([`paginate`])
//! 3. **Assembly** - the raster is embedded once and drawn on every page
//!    ([`assemble`])
//!
//! # Example
//!
//! ```no_run
//! use docport_pdf::{NativeRasterizer, RasterExporter};
//! use docport_snapshot::HttpFetcher;
//! use docport_surface::RenderTree;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let tree = RenderTree::from_page(&std::fs::read_to_string("editor.html")?, None)?;
//! let exporter = RasterExporter::new(NativeRasterizer::new(HttpFetcher::new()));
//! if let Some(document) = exporter.export(&tree).await? {
//!     std::fs::write("MyDocument.pdf", &document.bytes)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod document;
pub mod error;
pub mod exporter;
pub mod layout;
pub mod native;
pub mod paginate;

pub use capture::{parse_color, CaptureOptions, Raster, Rasterizer};
pub use document::{assemble, RasterDocument};
pub use error::{PdfError, Result};
pub use exporter::RasterExporter;
pub use native::NativeRasterizer;
pub use paginate::{paginate, PageSize, Pagination};

/// MIME type of exported documents
pub const PDF_MIME: &str = "application/pdf";
