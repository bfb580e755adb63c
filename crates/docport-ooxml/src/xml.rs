//! XML text helpers shared by the part writers

use std::borrow::Cow;

use quick_xml::escape::escape;

/// XML declaration that opens every part
pub const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Escape text for element content or attribute values.
///
/// Characters that XML 1.0 cannot carry are dropped.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        escape(text)
    } else {
        let cleaned: String = text.chars().filter(|c| is_xml_char(*c)).collect();
        Cow::Owned(escape(&cleaned).into_owned())
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}
