//! Semantic (DOCX) export
//!
//! The sanitized snapshot is wrapped in a fixed HTML shell and handed to a
//! [`DocumentPackager`]. Whatever the packager returns is normalized to a
//! [`Blob`] tagged with the DOCX MIME type.

use std::future::Future;

use docport_ooxml::{HtmlDocxPackager, DOCX_MIME};
use docport_snapshot::{ResourceFetcher, SnapshotExtractor};
use docport_surface::RenderTree;

use crate::error::{ExportError, Result};

/// Stylesheet embedded in every exported document
pub const DOCUMENT_STYLESHEET: &str = r#"
body { font-family: Inter, Arial, sans-serif; color: #222; font-size: 14px; }
h1 { font-size: 32px; font-weight: 800; margin: 0 0 12px; }
h2 { font-size: 28px; font-weight: 700; margin: 0 0 10px; }
h3 { font-size: 24px; font-weight: 700; margin: 0 0 8px; }
h4 { font-size: 20px; font-weight: 600; margin: 0 0 8px; }
h5 { font-size: 18px; font-weight: 600; margin: 0 0 8px; }
h6 { font-size: 16px; font-weight: 600; margin: 0 0 8px; }
p { margin: 0 0 8px; }
strong, b { font-weight: 700; }
em, i { font-style: italic; }
u { text-decoration: underline; }
pre, code { font-family: ui-monospace, SFMono-Regular, Menlo, Consolas, "Liberation Mono", monospace; }
pre { background: #1f1f1f; color: #eeeeee; padding: 12px; border-radius: 8px; }
code { background: #f2f2f2; padding: 2px 4px; border-radius: 4px; }
"#;

/// Wrap body markup in the document shell with [`DOCUMENT_STYLESHEET`]
pub fn html_shell(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><head><meta charset="utf-8"><style>{}</style></head><body>{}</body></html>"#,
        DOCUMENT_STYLESHEET, body
    )
}

/// Bytes tagged with a MIME type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// MIME type
    pub mime: String,
    /// Content
    pub bytes: Vec<u8>,
}

impl Blob {
    /// Create a blob
    pub fn new(mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime: mime.into(),
            bytes,
        }
    }
}

/// What a packager hands back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackagerOutput {
    /// Raw document bytes
    Buffer(Vec<u8>),
    /// Bytes already wrapped with some MIME type
    Blob(Blob),
}

impl PackagerOutput {
    /// Normalize to a DOCX blob, retagging an existing blob
    pub fn into_docx_blob(self) -> Blob {
        match self {
            PackagerOutput::Buffer(bytes) => Blob::new(DOCX_MIME, bytes),
            PackagerOutput::Blob(blob) => {
                if blob.mime != DOCX_MIME {
                    tracing::debug!(mime = %blob.mime, "retagging packager blob");
                }
                Blob::new(DOCX_MIME, blob.bytes)
            }
        }
    }
}

/// Converts a complete HTML document into a word-processing document
pub trait DocumentPackager: Send + Sync {
    /// Package `html`
    fn package(&self, html: String) -> impl Future<Output = Result<PackagerOutput>> + Send;
}

impl DocumentPackager for HtmlDocxPackager {
    async fn package(&self, html: String) -> Result<PackagerOutput> {
        let packager = self.clone();
        let bytes = tokio::task::spawn_blocking(move || packager.package(&html))
            .await
            .map_err(|e| ExportError::Task(e.to_string()))??;
        Ok(PackagerOutput::Buffer(bytes))
    }
}

/// Produces DOCX blobs from sanitized snapshots
#[derive(Debug, Clone)]
pub struct SemanticExporter<F, P = HtmlDocxPackager> {
    extractor: SnapshotExtractor<F>,
    packager: P,
}

impl<F: ResourceFetcher> SemanticExporter<F> {
    /// Create an exporter with the default HTML-to-DOCX packager
    pub fn new(fetcher: F) -> Self {
        Self::with_packager(fetcher, HtmlDocxPackager::default())
    }
}

impl<F: ResourceFetcher, P: DocumentPackager> SemanticExporter<F, P> {
    /// Create an exporter with a custom packager
    pub fn with_packager(fetcher: F, packager: P) -> Self {
        Self {
            extractor: SnapshotExtractor::new(fetcher),
            packager,
        }
    }

    /// The packager in use
    pub fn packager(&self) -> &P {
        &self.packager
    }

    /// Snapshot the surface and package it.
    ///
    /// Returns `Ok(None)` when no surface is mounted.
    pub async fn export(&self, tree: &RenderTree) -> Result<Option<Blob>> {
        let Some(snapshot) = self.extractor.extract(tree).await else {
            tracing::debug!("no surface mounted, skipping semantic export");
            return Ok(None);
        };
        tracing::debug!(
            bytes = snapshot.markup.len(),
            inlined = snapshot.inlined_images,
            retained = snapshot.retained_images,
            "packaging snapshot"
        );
        let output = self.packager.package(html_shell(&snapshot.markup)).await?;
        Ok(Some(output.into_docx_blob()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_layout() {
        let html = html_shell("<p>Hi</p>");
        assert!(html.starts_with(
            r#"<!DOCTYPE html><html><head><meta charset="utf-8"><style>"#
        ));
        assert!(html.ends_with("</style></head><body><p>Hi</p></body></html>"));
        assert!(html.contains("h6 { font-size: 16px; font-weight: 600; margin: 0 0 8px; }"));
    }

    #[test]
    fn test_buffer_is_tagged() {
        let blob = PackagerOutput::Buffer(vec![1, 2]).into_docx_blob();
        assert_eq!(blob.mime, DOCX_MIME);
        assert_eq!(blob.bytes, vec![1, 2]);
    }

    #[test]
    fn test_blob_is_retagged() {
        let blob = PackagerOutput::Blob(Blob::new("application/octet-stream", vec![7]))
            .into_docx_blob();
        assert_eq!(blob, Blob::new(DOCX_MIME, vec![7]));
    }
}
