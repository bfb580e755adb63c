//! Package relationships (`_rels/*.rels`)
//!
//! Relationship parts map IDs (`rId1`, `rId2`, ...) to targets. Documents
//! use them for styles, numbering, hyperlinks and embedded media.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{OoxmlError, Result};
use crate::xml::{escape_text, DECLARATION};

/// OOXML namespace for relationships
pub const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Common relationship type URIs
impl Relationships {
    /// Main document part
    pub const TYPE_OFFICE_DOCUMENT: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    /// Core properties part
    pub const TYPE_CORE_PROPERTIES: &'static str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    /// Extended properties part
    pub const TYPE_EXTENDED_PROPERTIES: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
    /// Hyperlink relationship type
    pub const TYPE_HYPERLINK: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
    /// Image relationship type
    pub const TYPE_IMAGE: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    /// Styles relationship type
    pub const TYPE_STYLES: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    /// Numbering relationship type
    pub const TYPE_NUMBERING: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";
    /// Worksheet relationship type
    pub const TYPE_WORKSHEET: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
    /// Shared strings relationship type
    pub const TYPE_SHARED_STRINGS: &'static str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
}

/// A single relationship
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path or URL
    pub target: String,
    /// Whether the target lives outside the package
    pub external: bool,
}

/// An ordered relationship part
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    entries: Vec<Relationship>,
}

impl Relationships {
    /// Create an empty relationship part
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a relationship part
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut entries = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    if e.local_name().as_ref() == b"Relationship" {
                        let mut id = None;
                        let mut target = None;
                        let mut rel_type = String::new();
                        let mut external = false;

                        for attr in e.attributes().filter_map(|a| a.ok()) {
                            let value = attr.unescape_value().ok().map(|s| s.to_string());
                            match attr.key.as_ref() {
                                b"Id" => id = value,
                                b"Target" => target = value,
                                b"Type" => rel_type = value.unwrap_or_default(),
                                b"TargetMode" => {
                                    external = value.as_deref() == Some("External");
                                }
                                _ => {}
                            }
                        }

                        if let (Some(id), Some(target)) = (id, target) {
                            entries.push(Relationship {
                                id,
                                rel_type,
                                target,
                                external,
                            });
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(OoxmlError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { entries })
    }

    /// Add an internal relationship and return its ID
    pub fn add(&mut self, rel_type: &str, target: impl Into<String>) -> String {
        self.push(rel_type, target.into(), false)
    }

    /// Add a relationship to a target outside the package
    pub fn add_external(&mut self, rel_type: &str, target: impl Into<String>) -> String {
        self.push(rel_type, target.into(), true)
    }

    fn push(&mut self, rel_type: &str, target: String, external: bool) -> String {
        let id = format!("rId{}", self.entries.len() + 1);
        self.entries.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target,
            external,
        });
        id
    }

    /// Look up a relationship by ID
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.entries.iter().find(|r| r.id == id)
    }

    /// Relationships of a given type, in insertion order
    pub fn of_type<'a>(&'a self, rel_type: &'a str) -> impl Iterator<Item = &'a Relationship> {
        self.entries.iter().filter(move |r| r.rel_type == rel_type)
    }

    /// Iterate in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.entries.iter()
    }

    /// Number of relationships
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the part has no relationships
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize to a `.rels` part
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(DECLARATION);
        xml.push('\n');
        xml.push_str(&format!(r#"<Relationships xmlns="{}">"#, RELATIONSHIPS_NS));
        for rel in &self.entries {
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}""#,
                escape_text(&rel.id),
                escape_text(&rel.rel_type),
                escape_text(&rel.target)
            ));
            if rel.external {
                xml.push_str(r#" TargetMode="External""#);
            }
            xml.push_str("/>");
        }
        xml.push_str("</Relationships>");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_follow_insertion_order() {
        let mut rels = Relationships::new();
        assert_eq!(rels.add(Relationships::TYPE_STYLES, "styles.xml"), "rId1");
        assert_eq!(
            rels.add_external(Relationships::TYPE_HYPERLINK, "https://example.com/?a=1&b=2"),
            "rId2"
        );
        assert_eq!(rels.len(), 2);
        assert!(rels.get("rId2").unwrap().external);
    }

    #[test]
    fn test_serialized_part_parses_back() {
        let mut rels = Relationships::new();
        rels.add(Relationships::TYPE_IMAGE, "media/image-0011.png");
        rels.add_external(Relationships::TYPE_HYPERLINK, "https://example.com/?a=1&b=2");

        let xml = rels.to_xml();
        assert!(xml.contains("&amp;b=2"));
        assert!(xml.contains(r#"TargetMode="External""#));

        let parsed = Relationships::parse(xml.as_bytes()).unwrap();
        assert_eq!(parsed, rels);
    }

    #[test]
    fn test_of_type_filters() {
        let mut rels = Relationships::new();
        rels.add(Relationships::TYPE_STYLES, "styles.xml");
        rels.add(Relationships::TYPE_IMAGE, "media/a.png");
        rels.add(Relationships::TYPE_IMAGE, "media/b.png");
        let targets: Vec<_> = rels
            .of_type(Relationships::TYPE_IMAGE)
            .map(|r| r.target.as_str())
            .collect();
        assert_eq!(targets, vec!["media/a.png", "media/b.png"]);
    }
}
