//! Export orchestration
//!
//! Each operation reads the current render tree, derives its artifact from
//! scratch and hands it to the configured delivery. Operations share no
//! state and can run concurrently.

use std::fmt;
use std::path::PathBuf;

use docport_ooxml::{DOCX_MIME, XLSX_MIME};
use docport_pdf::{NativeRasterizer, RasterExporter, Rasterizer, PDF_MIME};
use docport_snapshot::ResourceFetcher;
use docport_surface::RenderTree;

use crate::delivery::{ExportArtifact, FileDelivery};
use crate::error::{ExportError, Result};
use crate::semantic::{Blob, DocumentPackager, SemanticExporter};
use crate::tabular::{SheetSerializer, TabularExporter};

/// Base name used when none is configured
pub const DEFAULT_FILE_NAME: &str = "MyDocument";

/// Output format of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Paginated image PDF
    Pdf,
    /// Styled word-processing document
    Docx,
    /// Single-column spreadsheet
    Xlsx,
}

impl ExportFormat {
    /// Every format, in export order
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Pdf, ExportFormat::Docx, ExportFormat::Xlsx];

    /// File extension without the dot
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    /// MIME type of delivered artifacts
    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Pdf => PDF_MIME,
            ExportFormat::Docx => DOCX_MIME,
            ExportFormat::Xlsx => XLSX_MIME,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Result of one export operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// An artifact was delivered
    Delivered {
        /// Format produced
        format: ExportFormat,
        /// Where the delivery put it
        path: PathBuf,
        /// Artifact size
        bytes: usize,
    },
    /// Nothing to export (no surface mounted)
    Skipped {
        /// Format requested
        format: ExportFormat,
    },
}

impl ExportOutcome {
    /// Format this outcome refers to
    pub fn format(&self) -> ExportFormat {
        match self {
            ExportOutcome::Delivered { format, .. } | ExportOutcome::Skipped { format } => *format,
        }
    }

    /// Whether an artifact was delivered
    pub fn is_delivered(&self) -> bool {
        matches!(self, ExportOutcome::Delivered { .. })
    }
}

/// The three export operations over one delivery target
#[derive(Debug)]
pub struct Exporter<R, F, D, P, S> {
    raster: RasterExporter<R>,
    semantic: SemanticExporter<F, P>,
    tabular: TabularExporter<S>,
    delivery: D,
    file_name: String,
}

/// Exporter with the built-in rasterizer, packager and workbook writer
pub type NativeExporter<F, D> =
    Exporter<NativeRasterizer<F>, F, D, docport_ooxml::HtmlDocxPackager, crate::tabular::XlsxSerializer>;

impl<F, D> NativeExporter<F, D>
where
    F: ResourceFetcher + Clone,
    D: FileDelivery,
{
    /// Build the default pipeline; both rasterizer and snapshot share
    /// `fetcher`
    pub fn native(fetcher: F, delivery: D) -> Self {
        Exporter::new(
            RasterExporter::new(NativeRasterizer::new(fetcher.clone())),
            SemanticExporter::new(fetcher),
            TabularExporter::new(),
            delivery,
        )
    }
}

impl<R, F, D, P, S> Exporter<R, F, D, P, S>
where
    R: Rasterizer,
    F: ResourceFetcher,
    D: FileDelivery,
    P: DocumentPackager,
    S: SheetSerializer,
{
    /// Assemble an exporter from its parts
    pub fn new(
        raster: RasterExporter<R>,
        semantic: SemanticExporter<F, P>,
        tabular: TabularExporter<S>,
        delivery: D,
    ) -> Self {
        Self {
            raster,
            semantic,
            tabular,
            delivery,
            file_name: DEFAULT_FILE_NAME.to_string(),
        }
    }

    /// Set the file base name (without extension).
    ///
    /// The name is used as given. Names that are empty, `.` or `..`, that
    /// contain a path separator, or that start or end with whitespace fail
    /// at export time with [`ExportError::InvalidFileName`].
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// File base name
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Delivery target
    pub fn delivery(&self) -> &D {
        &self.delivery
    }

    /// Raster stage
    pub fn raster(&self) -> &RasterExporter<R> {
        &self.raster
    }

    /// Export a paginated image PDF
    pub async fn export_pdf(&self, tree: &RenderTree) -> Result<ExportOutcome> {
        let format = ExportFormat::Pdf;
        let file_name = self.artifact_name(format)?;
        match self.raster.export(tree).await? {
            Some(document) => {
                tracing::debug!(pages = document.page_count(), "assembled PDF");
                self.deliver(format, file_name, Blob::new(PDF_MIME, document.bytes))
                    .await
            }
            None => Ok(ExportOutcome::Skipped { format }),
        }
    }

    /// Export a styled DOCX
    pub async fn export_docx(&self, tree: &RenderTree) -> Result<ExportOutcome> {
        let format = ExportFormat::Docx;
        let file_name = self.artifact_name(format)?;
        match self.semantic.export(tree).await? {
            Some(blob) => self.deliver(format, file_name, blob).await,
            None => Ok(ExportOutcome::Skipped { format }),
        }
    }

    /// Export the surface text as a single-column XLSX
    pub async fn export_xlsx(&self, tree: &RenderTree) -> Result<ExportOutcome> {
        let format = ExportFormat::Xlsx;
        let file_name = self.artifact_name(format)?;
        let blob = self.tabular.export(tree)?;
        self.deliver(format, file_name, blob).await
    }

    /// Run the operation for `format`
    pub async fn export(&self, format: ExportFormat, tree: &RenderTree) -> Result<ExportOutcome> {
        match format {
            ExportFormat::Pdf => self.export_pdf(tree).await,
            ExportFormat::Docx => self.export_docx(tree).await,
            ExportFormat::Xlsx => self.export_xlsx(tree).await,
        }
    }

    /// Run all three operations concurrently; results follow
    /// [`ExportFormat::ALL`]
    pub async fn export_all(&self, tree: &RenderTree) -> [Result<ExportOutcome>; 3] {
        let (pdf, docx, xlsx) = tokio::join!(
            self.export_pdf(tree),
            self.export_docx(tree),
            self.export_xlsx(tree)
        );
        [pdf, docx, xlsx]
    }

    fn artifact_name(&self, format: ExportFormat) -> Result<String> {
        let name = self.file_name.as_str();
        if name.is_empty()
            || name.trim() != name
            || name == "."
            || name == ".."
            || name.contains(|c: char| matches!(c, '/' | '\\' | '\0'))
        {
            return Err(ExportError::InvalidFileName(self.file_name.clone()));
        }
        Ok(format!("{}.{}", name, format.extension()))
    }

    async fn deliver(
        &self,
        format: ExportFormat,
        file_name: String,
        blob: Blob,
    ) -> Result<ExportOutcome> {
        let bytes = blob.bytes.len();
        let artifact = ExportArtifact {
            file_name,
            mime: blob.mime,
            bytes: blob.bytes,
        };
        let path = self.delivery.deliver(artifact).await?;
        tracing::info!(%format, path = %path.display(), bytes, "exported document");
        Ok(ExportOutcome::Delivered {
            format,
            path,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::MemoryDelivery;
    use docport_snapshot::MapFetcher;

    fn exporter() -> NativeExporter<MapFetcher, MemoryDelivery> {
        NativeExporter::native(MapFetcher::new(), MemoryDelivery::new())
    }

    #[test]
    fn test_format_metadata() {
        assert_eq!(ExportFormat::Pdf.to_string(), "pdf");
        assert_eq!(ExportFormat::Docx.mime(), DOCX_MIME);
        assert_eq!(ExportFormat::Xlsx.extension(), "xlsx");
    }

    #[test]
    fn test_artifact_name() {
        let exporter = exporter();
        assert_eq!(exporter.file_name(), DEFAULT_FILE_NAME);
        assert_eq!(
            exporter.artifact_name(ExportFormat::Docx).unwrap(),
            "MyDocument.docx"
        );
        let exporter = exporter.with_file_name("My Report");
        assert_eq!(
            exporter.artifact_name(ExportFormat::Pdf).unwrap(),
            "My Report.pdf"
        );
    }

    #[test]
    fn test_rejects_unusable_names() {
        for name in ["", "  ", "..", "a/b", "a\\b", " Report ", "Report\n", "\tReport"] {
            let exporter = exporter().with_file_name(name);
            assert!(matches!(
                exporter.artifact_name(ExportFormat::Pdf),
                Err(ExportError::InvalidFileName(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_unmounted_tree() {
        let exporter = exporter();
        let tree = RenderTree::unmounted();

        let pdf = exporter.export_pdf(&tree).await.unwrap();
        let docx = exporter.export_docx(&tree).await.unwrap();
        let xlsx = exporter.export_xlsx(&tree).await.unwrap();

        assert_eq!(pdf, ExportOutcome::Skipped { format: ExportFormat::Pdf });
        assert_eq!(docx, ExportOutcome::Skipped { format: ExportFormat::Docx });
        assert!(xlsx.is_delivered());

        let delivered = exporter.delivery().take();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].file_name, "MyDocument.xlsx");
    }
}
