//! HTML to DOCX packaging
//!
//! [`HtmlDocxPackager`] reads a complete HTML document, derives Word styles
//! from its `<style>` blocks and writes an A4 WordprocessingML package.
//!
//! # Example
//!
//! ```
//! use docport_ooxml::{DocxOptions, HtmlDocxPackager};
//!
//! let html = "<html><head><style>h1 { font-size: 32px; }</style></head>\
//!             <body><h1>Report</h1><p>Body text</p></body></html>";
//! let packager = HtmlDocxPackager::new(DocxOptions::default());
//! let bytes = packager.package(html)?;
//! assert_eq!(&bytes[..2], b"PK");
//! # Ok::<(), docport_ooxml::OoxmlError>(())
//! ```

pub mod body;
pub mod media;
pub mod numbering;
pub mod styles;

use std::collections::BTreeSet;

use docport_surface::{parse_fragment, Element, StyleSheet};

use crate::archive::Package;
use crate::content_types::{
    ContentTypes, CONTENT_TYPES_PATH, CORE_PROPERTIES_CONTENT_TYPE,
    EXTENDED_PROPERTIES_CONTENT_TYPE,
};
use crate::error::{OoxmlError, Result};
use crate::properties::{app_xml, core_xml, APP_PATH, CORE_PATH};
use crate::relationships::Relationships;
use crate::xml::DECLARATION;

pub use body::{BodyLayout, BodyOutput, BodyWriter, MediaPart};
pub use styles::DocumentStyles;

/// A4 page size in twips
pub const A4_TWIPS: (u32, u32) = (11906, 16838);

const DOCUMENT_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
const STYLES_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
const NUMBERING_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml";

const DOCUMENT_NAMESPACES: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture""#,
);

/// Page margins in twips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMargins {
    /// Top margin
    pub top: u32,
    /// Right margin
    pub right: u32,
    /// Bottom margin
    pub bottom: u32,
    /// Left margin
    pub left: u32,
}

impl PageMargins {
    /// The same margin on all four sides
    pub fn uniform(twips: u32) -> Self {
        Self {
            top: twips,
            right: twips,
            bottom: twips,
            left: twips,
        }
    }
}

impl Default for PageMargins {
    fn default() -> Self {
        Self::uniform(720)
    }
}

/// Options for DOCX packaging
#[derive(Debug, Clone, PartialEq)]
pub struct DocxOptions {
    /// Body font family list; the first concrete family is used
    pub font: String,
    /// Page margins
    pub margins: PageMargins,
    /// Keep each table row on one page
    pub cant_split_rows: bool,
    /// Honor image `width`/`height` attributes
    pub honor_image_size: bool,
    /// Document title for the core properties
    pub title: Option<String>,
}

impl Default for DocxOptions {
    fn default() -> Self {
        Self {
            font: "Inter, Arial, sans-serif".to_string(),
            margins: PageMargins::default(),
            cant_split_rows: true,
            honor_image_size: true,
            title: None,
        }
    }
}

impl DocxOptions {
    /// Set the body font
    pub fn with_font(mut self, font: impl Into<String>) -> Self {
        self.font = font.into();
        self
    }

    /// Set all four margins
    pub fn with_margins(mut self, twips: u32) -> Self {
        self.margins = PageMargins::uniform(twips);
        self
    }

    /// Set whether table rows may split across pages
    pub fn with_cant_split_rows(mut self, cant_split: bool) -> Self {
        self.cant_split_rows = cant_split;
        self
    }

    /// Set whether image dimensions from the markup are used
    pub fn with_image_size(mut self, honor: bool) -> Self {
        self.honor_image_size = honor;
        self
    }

    /// Set the document title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Width of the text area in twips
    pub fn text_width(&self) -> u32 {
        A4_TWIPS
            .0
            .saturating_sub(self.margins.left.saturating_add(self.margins.right))
    }

    /// Check that margins leave room for text
    pub fn validate(&self) -> Result<()> {
        let m = self.margins;
        let fits = |a: u32, b: u32, page: u32| a.checked_add(b).is_some_and(|sum| sum < page);
        if !fits(m.left, m.right, A4_TWIPS.0) || !fits(m.top, m.bottom, A4_TWIPS.1) {
            return Err(OoxmlError::InvalidOptions(format!(
                "margins {}/{}/{}/{} leave no text area",
                m.top, m.right, m.bottom, m.left
            )));
        }
        Ok(())
    }
}

/// Packages HTML documents as DOCX
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HtmlDocxPackager {
    options: DocxOptions,
}

impl HtmlDocxPackager {
    /// Create a packager
    pub fn new(options: DocxOptions) -> Self {
        Self { options }
    }

    /// Packaging options
    pub fn options(&self) -> &DocxOptions {
        &self.options
    }

    /// Convert an HTML document into DOCX bytes
    pub fn package(&self, html: &str) -> Result<Vec<u8>> {
        self.options.validate()?;

        let mut document = Element::new("#document");
        document.children = parse_fragment(html)?;

        let css: String = document
            .descendants_named("style")
            .iter()
            .map(|style| style.text_content())
            .collect::<Vec<_>>()
            .join("\n");
        let sheet = StyleSheet::parse(&css);
        let styles = DocumentStyles::from_stylesheet(&sheet, &self.options.font);

        let body = document.find_named("body").unwrap_or(&document);

        let mut rels = Relationships::new();
        rels.add(Relationships::TYPE_STYLES, "styles.xml");
        rels.add(Relationships::TYPE_NUMBERING, "numbering.xml");

        let layout = BodyLayout {
            text_width_twips: self.options.text_width(),
            cant_split_rows: self.options.cant_split_rows,
            honor_image_size: self.options.honor_image_size,
        };
        let output = BodyWriter::new(&mut rels, layout).write_body(body);
        tracing::debug!(
            media = output.media.len(),
            relationships = rels.len(),
            "converted document body"
        );

        let package = self.assemble(output, &styles, &rels);
        package.to_bytes()
    }

    fn assemble(&self, output: BodyOutput, styles: &DocumentStyles, rels: &Relationships) -> Package {
        let mut package = Package::new();

        let mut types = ContentTypes::new()
            .with_override("word/document.xml", DOCUMENT_CONTENT_TYPE)
            .with_override("word/styles.xml", STYLES_CONTENT_TYPE)
            .with_override("word/numbering.xml", NUMBERING_CONTENT_TYPE)
            .with_override(CORE_PATH, CORE_PROPERTIES_CONTENT_TYPE)
            .with_override(APP_PATH, EXTENDED_PROPERTIES_CONTENT_TYPE);
        let extensions: BTreeSet<(&str, &str)> = output
            .media
            .iter()
            .map(|m| (m.image.extension, m.image.content_type))
            .collect();
        for (extension, content_type) in extensions {
            types.add_default(extension, content_type);
        }
        package.set_string(CONTENT_TYPES_PATH, types.to_xml());

        let mut package_rels = Relationships::new();
        package_rels.add(Relationships::TYPE_OFFICE_DOCUMENT, "word/document.xml");
        package_rels.add(Relationships::TYPE_CORE_PROPERTIES, CORE_PATH);
        package_rels.add(Relationships::TYPE_EXTENDED_PROPERTIES, APP_PATH);
        package.set_string("_rels/.rels", package_rels.to_xml());
        package.set_string(CORE_PATH, core_xml(self.options.title.as_deref()));
        package.set_string(APP_PATH, app_xml());

        package.set_string("word/document.xml", self.document_xml(&output.xml));
        package.set_string("word/styles.xml", styles.to_xml());
        package.set_string("word/numbering.xml", output.numbering.to_xml());
        package.set_string("word/_rels/document.xml.rels", rels.to_xml());
        for part in output.media {
            package.set(part.path, part.image.bytes);
        }
        package
    }

    fn document_xml(&self, body: &str) -> String {
        let m = self.options.margins;
        format!(
            concat!(
                "{decl}\n<w:document {ns}><w:body>{body}",
                r#"<w:sectPr><w:pgSz w:w="{width}" w:h="{height}"/>"#,
                r#"<w:pgMar w:top="{top}" w:right="{right}" w:bottom="{bottom}" w:left="{left}" w:header="720" w:footer="720" w:gutter="0"/>"#,
                "</w:sectPr></w:body></w:document>",
            ),
            decl = DECLARATION,
            ns = DOCUMENT_NAMESPACES,
            body = body,
            width = A4_TWIPS.0,
            height = A4_TWIPS.1,
            top = m.top,
            right = m.right,
            bottom = m.bottom,
            left = m.left,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_width() {
        assert_eq!(DocxOptions::default().text_width(), 10466);
        assert_eq!(DocxOptions::default().with_margins(1440).text_width(), 9026);
    }

    #[test]
    fn test_margins_must_leave_text_area() {
        let packager = HtmlDocxPackager::new(DocxOptions::default().with_margins(6000));
        assert!(matches!(
            packager.package("<p>x</p>"),
            Err(OoxmlError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_huge_margins_are_rejected() {
        let options = DocxOptions::default().with_margins(3_000_000_000);
        assert_eq!(options.text_width(), 0);
        assert!(matches!(
            options.validate(),
            Err(OoxmlError::InvalidOptions(_))
        ));

        let packager = HtmlDocxPackager::new(DocxOptions::default().with_margins(u32::MAX));
        assert!(matches!(
            packager.package("<p>x</p>"),
            Err(OoxmlError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_fragment_without_body() {
        let bytes = HtmlDocxPackager::default().package("<p>loose</p>").unwrap();
        let package = Package::from_bytes(&bytes).unwrap();
        let document = package.part_string("word/document.xml").unwrap();
        assert!(document.contains(">loose</w:t>"));
    }
}
