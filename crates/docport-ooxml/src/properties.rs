//! Document property parts (`docProps/core.xml`, `docProps/app.xml`)
//!
//! No timestamps are written, so packages stay byte-identical across runs.

use crate::xml::{escape_text, DECLARATION};

/// Path of the core properties part
pub const CORE_PATH: &str = "docProps/core.xml";
/// Path of the extended properties part
pub const APP_PATH: &str = "docProps/app.xml";

/// Application name recorded in generated packages
pub const APPLICATION: &str = "docport";

/// Core properties with an optional title
pub fn core_xml(title: Option<&str>) -> String {
    let mut xml = String::new();
    xml.push_str(DECLARATION);
    xml.push('\n');
    xml.push_str(concat!(
        r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
        r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
        r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
    ));
    if let Some(title) = title {
        xml.push_str(&format!("<dc:title>{}</dc:title>", escape_text(title)));
    }
    xml.push_str(&format!("<dc:creator>{}</dc:creator>", APPLICATION));
    xml.push_str("</cp:coreProperties>");
    xml
}

/// Extended properties naming the producing application
pub fn app_xml() -> String {
    format!(
        r#"{}
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>{}</Application></Properties>"#,
        DECLARATION, APPLICATION
    )
}
