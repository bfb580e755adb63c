//! `[Content_Types].xml` builder

use std::collections::BTreeMap;

use crate::xml::{escape_text, DECLARATION};

const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// Path of the content types part
pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";

/// Relationship part content type
pub const RELS_CONTENT_TYPE: &str = "application/vnd.openxmlformats-package.relationships+xml";
/// Core properties content type
pub const CORE_PROPERTIES_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-package.core-properties+xml";
/// Extended properties content type
pub const EXTENDED_PROPERTIES_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.extended-properties+xml";

/// Content type declarations of a package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl ContentTypes {
    /// Declarations every package needs: `.rels` and `.xml`
    pub fn new() -> Self {
        Self::default()
            .with_default("rels", RELS_CONTENT_TYPE)
            .with_default("xml", "application/xml")
    }

    /// Declare the content type of an extension
    pub fn with_default(mut self, extension: &str, content_type: &str) -> Self {
        self.add_default(extension, content_type);
        self
    }

    /// Declare the content type of an extension in place
    pub fn add_default(&mut self, extension: &str, content_type: &str) {
        self.defaults
            .insert(extension.to_ascii_lowercase(), content_type.to_string());
    }

    /// Declare the content type of one part (`part` without leading slash)
    pub fn with_override(mut self, part: &str, content_type: &str) -> Self {
        self.overrides
            .insert(format!("/{}", part.trim_start_matches('/')), content_type.to_string());
        self
    }

    /// Content type of a part, by override then extension
    pub fn content_type(&self, part: &str) -> Option<&str> {
        let key = format!("/{}", part.trim_start_matches('/'));
        if let Some(ct) = self.overrides.get(&key) {
            return Some(ct);
        }
        let extension = part.rsplit('.').next()?.to_ascii_lowercase();
        self.defaults.get(&extension).map(|s| s.as_str())
    }

    /// Serialize to `[Content_Types].xml`
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(DECLARATION);
        xml.push('\n');
        xml.push_str(&format!(r#"<Types xmlns="{}">"#, CONTENT_TYPES_NS));
        for (extension, content_type) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_text(extension),
                escape_text(content_type)
            ));
        }
        for (part, content_type) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_text(part),
                escape_text(content_type)
            ));
        }
        xml.push_str("</Types>");
        xml
    }
}
