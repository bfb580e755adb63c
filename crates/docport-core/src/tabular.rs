//! Tabular (XLSX) export
//!
//! The surface's plain-text rendering becomes one row per non-blank line
//! under a single `Content` header.

use docport_ooxml::{Workbook, Worksheet, XLSX_MIME};
use docport_surface::RenderTree;

use crate::error::Result;
use crate::semantic::Blob;

/// Name of the only sheet
pub const SHEET_NAME: &str = "Document";

/// Header of the only column
pub const CONTENT_FIELD: &str = "Content";

/// Split text into rows: one per line, blank lines dropped
pub fn rows_from_text(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Turns single-column records into spreadsheet bytes
pub trait SheetSerializer: Send + Sync {
    /// Serialize `rows` under `field` into a workbook with one sheet
    fn serialize(&self, sheet: &str, field: &str, rows: Vec<String>) -> Result<Vec<u8>>;
}

/// [`SheetSerializer`] writing XLSX workbooks
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxSerializer;

impl SheetSerializer for XlsxSerializer {
    fn serialize(&self, sheet: &str, field: &str, rows: Vec<String>) -> Result<Vec<u8>> {
        let records = rows.into_iter().map(|row| vec![row]).collect();
        let sheet = Worksheet::from_records(sheet, &[field], records);
        Ok(Workbook::new().with_sheet(sheet).to_bytes()?)
    }
}

/// Produces XLSX blobs from the surface text
#[derive(Debug, Clone, Default)]
pub struct TabularExporter<S = XlsxSerializer> {
    serializer: S,
}

impl TabularExporter {
    /// Create an exporter writing XLSX
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: SheetSerializer> TabularExporter<S> {
    /// Create an exporter with a custom serializer
    pub fn with_serializer(serializer: S) -> Self {
        Self { serializer }
    }

    /// Build the workbook. Without a surface the sheet holds only the header.
    pub fn export(&self, tree: &RenderTree) -> Result<Blob> {
        let rows = rows_from_text(&tree.inner_text());
        tracing::debug!(rows = rows.len(), "building workbook");
        let bytes = self.serializer.serialize(SHEET_NAME, CONTENT_FIELD, rows)?;
        Ok(Blob::new(XLSX_MIME, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_from_text() {
        assert_eq!(rows_from_text("A\n\nB\r\n \nC"), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_rows_keep_inner_whitespace() {
        assert_eq!(rows_from_text("  indented\r\na\tb\n"), vec!["  indented", "a\tb"]);
    }

    #[test]
    fn test_blank_text_has_no_rows() {
        assert!(rows_from_text("").is_empty());
        assert!(rows_from_text("\r\n\t\n   ").is_empty());
    }

    #[test]
    fn test_unmounted_tree_gives_header_only_workbook() {
        let blob = TabularExporter::new().export(&RenderTree::unmounted()).unwrap();
        assert_eq!(blob.mime, XLSX_MIME);
        assert_eq!(&blob.bytes[..2], b"PK");
    }
}
