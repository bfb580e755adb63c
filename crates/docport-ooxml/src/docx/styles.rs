//! Word styles derived from the document stylesheet
//!
//! The HTML shell carries a small stylesheet; its type rules become the
//! `Normal`, `Heading1`..`Heading6`, `Code` and `CodeChar` styles of
//! `word/styles.xml`. Units: CSS px are converted at 96 DPI, so one px is
//! 15 twips and 1.5 half-points.

use docport_surface::{parse_px, StyleSheet};

use crate::xml::{escape_text, DECLARATION};

const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Convert CSS px to twentieths of a point
pub fn px_to_twips(px: f32) -> u32 {
    (px.max(0.0) * 15.0).round() as u32
}

/// Convert CSS px to half-points
pub fn px_to_half_points(px: f32) -> u32 {
    (px.max(0.0) * 1.5).round() as u32
}

/// Heading appearance for one level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingStyle {
    /// Font size in px
    pub size_px: f32,
    /// Whether the heading is bold
    pub bold: bool,
    /// Space after in px
    pub space_after_px: f32,
}

/// Text colour and optional shading of a code style
#[derive(Debug, Clone, PartialEq)]
pub struct CodeStyle {
    /// Font family
    pub font: String,
    /// Text colour as `RRGGBB`
    pub color: Option<String>,
    /// Background fill as `RRGGBB`
    pub shading: Option<String>,
}

/// Styles of a generated document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentStyles {
    /// Body font family
    pub font: String,
    /// Body font size in px
    pub size_px: f32,
    /// Body text colour as `RRGGBB`
    pub color: Option<String>,
    /// Space after paragraphs in px
    pub paragraph_space_px: f32,
    /// Heading levels 1 to 6
    pub headings: [HeadingStyle; 6],
    /// Code block (`pre`) style
    pub code_block: CodeStyle,
    /// Inline code style
    pub code_inline: CodeStyle,
}

const DEFAULT_HEADINGS: [HeadingStyle; 6] = [
    HeadingStyle { size_px: 32.0, bold: true, space_after_px: 12.0 },
    HeadingStyle { size_px: 24.0, bold: true, space_after_px: 10.0 },
    HeadingStyle { size_px: 18.72, bold: true, space_after_px: 8.0 },
    HeadingStyle { size_px: 16.0, bold: true, space_after_px: 8.0 },
    HeadingStyle { size_px: 13.28, bold: true, space_after_px: 8.0 },
    HeadingStyle { size_px: 10.72, bold: true, space_after_px: 8.0 },
];

impl DocumentStyles {
    /// Defaults used when the stylesheet says nothing
    pub fn with_font(font: &str) -> Self {
        let code_font = "Courier New".to_string();
        Self {
            font: primary_family(font).unwrap_or_else(|| "Calibri".to_string()),
            size_px: 16.0,
            color: None,
            paragraph_space_px: 8.0,
            headings: DEFAULT_HEADINGS,
            code_block: CodeStyle {
                font: code_font.clone(),
                color: None,
                shading: None,
            },
            code_inline: CodeStyle {
                font: code_font,
                color: None,
                shading: None,
            },
        }
    }

    /// Derive styles from a stylesheet; `font` is the configured body font
    /// and loses to a `body { font-family }` rule
    pub fn from_stylesheet(sheet: &StyleSheet, font: &str) -> Self {
        let mut styles = Self::with_font(font);

        if let Some(family) = sheet.first_value("body", "font-family").and_then(primary_family) {
            styles.font = family;
        }
        if let Some(size) = sheet.first_value("body", "font-size").and_then(parse_px) {
            styles.size_px = size;
        }
        styles.color = sheet.first_value("body", "color").and_then(hex_color);
        if let Some(space) = margin_bottom(sheet, "p") {
            styles.paragraph_space_px = space;
        }

        for (i, heading) in styles.headings.iter_mut().enumerate() {
            let tag = format!("h{}", i + 1);
            if let Some(size) = sheet.first_value(&tag, "font-size").and_then(parse_px) {
                heading.size_px = size;
            }
            if let Some(weight) = sheet.first_value(&tag, "font-weight") {
                heading.bold = is_bold_weight(weight);
            }
            if let Some(space) = margin_bottom(sheet, &tag) {
                heading.space_after_px = space;
            }
        }

        styles.code_block = code_style(sheet, "pre", &styles.code_block);
        styles.code_inline = code_style(sheet, "code", &styles.code_inline);
        styles
    }

    /// Serialize to `word/styles.xml`
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(DECLARATION);
        xml.push('\n');
        xml.push_str(&format!(r#"<w:styles xmlns:w="{}">"#, WORDML_NS));

        xml.push_str("<w:docDefaults><w:rPrDefault><w:rPr>");
        xml.push_str(&fonts(&self.font));
        if let Some(color) = &self.color {
            xml.push_str(&format!(r#"<w:color w:val="{}"/>"#, color));
        }
        xml.push_str(&size(self.size_px));
        xml.push_str("</w:rPr></w:rPrDefault><w:pPrDefault><w:pPr>");
        xml.push_str(&spacing_after(self.paragraph_space_px));
        xml.push_str("</w:pPr></w:pPrDefault></w:docDefaults>");

        xml.push_str(
            r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
        );

        for (i, heading) in self.headings.iter().enumerate() {
            let level = i + 1;
            xml.push_str(&format!(
                r#"<w:style w:type="paragraph" w:styleId="Heading{level}"><w:name w:val="heading {level}"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/>{}<w:outlineLvl w:val="{}"/></w:pPr><w:rPr>{}{}</w:rPr></w:style>"#,
                spacing_after(heading.space_after_px),
                i,
                if heading.bold { "<w:b/>" } else { "" },
                size(heading.size_px),
            ));
        }

        let block = &self.code_block;
        xml.push_str(r#"<w:style w:type="paragraph" w:styleId="Code"><w:name w:val="Code"/><w:basedOn w:val="Normal"/><w:pPr>"#);
        if let Some(fill) = &block.shading {
            xml.push_str(&shading(fill));
        }
        xml.push_str(r#"<w:spacing w:after="0" w:line="240" w:lineRule="auto"/></w:pPr><w:rPr>"#);
        xml.push_str(&fonts(&block.font));
        if let Some(color) = &block.color {
            xml.push_str(&format!(r#"<w:color w:val="{}"/>"#, color));
        }
        xml.push_str("</w:rPr></w:style>");

        let inline = &self.code_inline;
        xml.push_str(r#"<w:style w:type="character" w:styleId="CodeChar"><w:name w:val="Code Char"/><w:rPr>"#);
        xml.push_str(&fonts(&inline.font));
        if let Some(color) = &inline.color {
            xml.push_str(&format!(r#"<w:color w:val="{}"/>"#, color));
        }
        if let Some(fill) = &inline.shading {
            xml.push_str(&shading(fill));
        }
        xml.push_str("</w:rPr></w:style>");

        xml.push_str(r#"<w:style w:type="character" w:styleId="Hyperlink"><w:name w:val="Hyperlink"/><w:rPr><w:color w:val="0563C1"/><w:u w:val="single"/></w:rPr></w:style>"#);
        xml.push_str(r#"<w:style w:type="paragraph" w:styleId="ListParagraph"><w:name w:val="List Paragraph"/><w:basedOn w:val="Normal"/><w:qFormat/><w:pPr><w:spacing w:after="40"/></w:pPr></w:style>"#);
        xml.push_str(r#"<w:style w:type="paragraph" w:styleId="Quote"><w:name w:val="Quote"/><w:basedOn w:val="Normal"/><w:qFormat/><w:pPr><w:pBdr><w:left w:val="single" w:sz="18" w:space="8" w:color="BFBFBF"/></w:pBdr><w:ind w:left="360"/></w:pPr><w:rPr><w:i/></w:rPr></w:style>"#);
        xml.push_str(r#"<w:style w:type="table" w:default="1" w:styleId="TableNormal"><w:name w:val="Normal Table"/><w:tblPr><w:tblCellMar><w:top w:w="0" w:type="dxa"/><w:left w:w="108" w:type="dxa"/><w:bottom w:w="0" w:type="dxa"/><w:right w:w="108" w:type="dxa"/></w:tblCellMar></w:tblPr></w:style>"#);

        xml.push_str("</w:styles>");
        xml
    }
}

/// First concrete family of a CSS `font-family` list.
///
/// Generic and `ui-` families have no Word equivalent and are skipped.
pub fn primary_family(value: &str) -> Option<String> {
    value
        .split(',')
        .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\''))
        .find(|f| {
            !f.is_empty()
                && !f.starts_with("ui-")
                && !matches!(
                    f.to_ascii_lowercase().as_str(),
                    "serif" | "sans-serif" | "monospace" | "cursive" | "fantasy" | "system-ui"
                )
        })
        .map(str::to_string)
}

/// Parse `#rgb` or `#rrggbb` into `RRGGBB`
pub fn hex_color(value: &str) -> Option<String> {
    let hex = value.trim().strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let full = match hex.len() {
        3 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 => hex.to_string(),
        _ => return None,
    };
    Some(full.to_ascii_uppercase())
}

fn is_bold_weight(value: &str) -> bool {
    match value.trim() {
        "bold" | "bolder" => true,
        v => v.parse::<u32>().map(|w| w >= 600).unwrap_or(false),
    }
}

/// Bottom margin of a tag from `margin-bottom` or the `margin` shorthand
fn margin_bottom(sheet: &StyleSheet, tag: &str) -> Option<f32> {
    if let Some(px) = sheet.first_value(tag, "margin-bottom").and_then(parse_px) {
        return Some(px);
    }
    let values: Vec<&str> = sheet.first_value(tag, "margin")?.split_whitespace().collect();
    let bottom = match values.len() {
        1 | 2 => values[0],
        3 | 4 => values[2],
        _ => return None,
    };
    parse_px(bottom)
}

fn code_style(sheet: &StyleSheet, tag: &str, fallback: &CodeStyle) -> CodeStyle {
    CodeStyle {
        font: sheet
            .first_value(tag, "font-family")
            .and_then(primary_family)
            .unwrap_or_else(|| fallback.font.clone()),
        color: sheet.first_value(tag, "color").and_then(hex_color),
        shading: sheet
            .first_value(tag, "background")
            .or_else(|| sheet.first_value(tag, "background-color"))
            .and_then(hex_color),
    }
}

fn fonts(family: &str) -> String {
    let family = escape_text(family);
    format!(
        r#"<w:rFonts w:ascii="{0}" w:hAnsi="{0}" w:eastAsia="{0}" w:cs="{0}"/>"#,
        family
    )
}

fn size(px: f32) -> String {
    let half_points = px_to_half_points(px);
    format!(
        r#"<w:sz w:val="{0}"/><w:szCs w:val="{0}"/>"#,
        half_points
    )
}

fn spacing_after(px: f32) -> String {
    format!(r#"<w:spacing w:after="{}"/>"#, px_to_twips(px))
}

fn shading(fill: &str) -> String {
    format!(r#"<w:shd w:val="clear" w:color="auto" w:fill="{}"/>"#, fill)
}
