//! List numbering (`word/numbering.xml`)
//!
//! One bullet definition shared by every unordered list, one decimal
//! definition instantiated per ordered list so each list restarts at 1.

use crate::xml::DECLARATION;

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Numbering instance used by all bullet lists
pub const BULLET_NUM_ID: u32 = 1;

const LEVELS: u32 = 9;
const BULLETS: [&str; 3] = ["\u{2022}", "\u{25E6}", "\u{25AA}"];
const ORDERED_FORMATS: [&str; 3] = ["decimal", "lowerLetter", "lowerRoman"];

/// Numbering instances allocated while writing a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Numbering {
    ordered: u32,
}

impl Numbering {
    /// Create numbering with only the bullet instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh ordered list instance and return its `numId`
    pub fn new_ordered(&mut self) -> u32 {
        self.ordered += 1;
        BULLET_NUM_ID + self.ordered
    }

    /// Number of ordered list instances
    pub fn ordered_count(&self) -> u32 {
        self.ordered
    }

    /// Serialize to `word/numbering.xml`
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(DECLARATION);
        xml.push('\n');
        xml.push_str(&format!(r#"<w:numbering xmlns:w="{}">"#, WORDML_NS));

        xml.push_str(r#"<w:abstractNum w:abstractNumId="0"><w:multiLevelType w:val="hybridMultilevel"/>"#);
        for level in 0..LEVELS {
            let bullet = BULLETS[(level % 3) as usize];
            xml.push_str(&level_xml(level, "bullet", bullet));
        }
        xml.push_str("</w:abstractNum>");

        xml.push_str(r#"<w:abstractNum w:abstractNumId="1"><w:multiLevelType w:val="hybridMultilevel"/>"#);
        for level in 0..LEVELS {
            let format = ORDERED_FORMATS[(level % 3) as usize];
            xml.push_str(&level_xml(level, format, &format!("%{}.", level + 1)));
        }
        xml.push_str("</w:abstractNum>");

        xml.push_str(&format!(
            r#"<w:num w:numId="{}"><w:abstractNumId w:val="0"/></w:num>"#,
            BULLET_NUM_ID
        ));
        for i in 1..=self.ordered {
            xml.push_str(&format!(
                r#"<w:num w:numId="{}"><w:abstractNumId w:val="1"/><w:lvlOverride w:ilvl="0"><w:startOverride w:val="1"/></w:lvlOverride></w:num>"#,
                BULLET_NUM_ID + i
            ));
        }

        xml.push_str("</w:numbering>");
        xml
    }
}

fn level_xml(level: u32, format: &str, text: &str) -> String {
    format!(
        r#"<w:lvl w:ilvl="{level}"><w:start w:val="1"/><w:numFmt w:val="{format}"/><w:lvlText w:val="{text}"/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="{}" w:hanging="360"/></w:pPr></w:lvl>"#,
        indent_for(level as usize)
    )
}

/// Left indent in twips for a list nesting level
pub fn indent_for(level: usize) -> u32 {
    720 * (level as u32 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_instances_restart() {
        let mut numbering = Numbering::new();
        assert_eq!(numbering.new_ordered(), 2);
        assert_eq!(numbering.new_ordered(), 3);

        let xml = numbering.to_xml();
        assert_eq!(xml.matches("<w:num ").count(), 3);
        assert_eq!(xml.matches("<w:startOverride").count(), 2);
        assert!(xml.contains(r#"<w:lvlText w:val="%1."/>"#));
        assert!(xml.contains("\u{2022}"));
    }
}
