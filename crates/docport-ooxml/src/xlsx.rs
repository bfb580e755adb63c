//! SpreadsheetML workbook writer
//!
//! Cells are written as shared strings. Records are laid out the way a
//! JSON-to-sheet conversion lays them out: the field names form row 1 and
//! each record fills one row below it.
//!
//! # Example
//!
//! ```
//! use docport_ooxml::{Workbook, Worksheet};
//!
//! let sheet = Worksheet::from_records("Document", &["Content"], vec![vec!["Hello".to_string()]]);
//! let bytes = Workbook::new().with_sheet(sheet).to_bytes()?;
//! assert_eq!(&bytes[..2], b"PK");
//! # Ok::<(), docport_ooxml::OoxmlError>(())
//! ```

use std::collections::HashMap;

use crate::archive::Package;
use crate::content_types::{
    ContentTypes, CONTENT_TYPES_PATH, CORE_PROPERTIES_CONTENT_TYPE,
    EXTENDED_PROPERTIES_CONTENT_TYPE,
};
use crate::error::{OoxmlError, Result};
use crate::properties::{app_xml, core_xml, APP_PATH, CORE_PATH};
use crate::relationships::Relationships;
use crate::xml::{escape_text, DECLARATION};

const SPREADSHEETML_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const WORKBOOK_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const WORKSHEET_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
const SHARED_STRINGS_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";
const STYLES_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";

/// Longest sheet name Excel accepts
pub const MAX_SHEET_NAME: usize = 31;

/// One worksheet of text cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Worksheet {
    name: String,
    rows: Vec<Vec<String>>,
}

impl Worksheet {
    /// Create an empty worksheet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Header row of field names, then one row per record
    pub fn from_records(name: impl Into<String>, fields: &[&str], records: Vec<Vec<String>>) -> Self {
        let mut sheet = Self::new(name);
        sheet.push_row(fields.iter().map(|f| f.to_string()).collect());
        for record in records {
            sheet.push_row(record);
        }
        sheet
    }

    /// Append a row
    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All rows, header included
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    fn validate(&self) -> Result<()> {
        let invalid = self.name.is_empty()
            || self.name.chars().count() > MAX_SHEET_NAME
            || self
                .name
                .contains(|c: char| matches!(c, '\\' | '/' | '?' | '*' | '[' | ']' | ':'));
        if invalid {
            return Err(OoxmlError::InvalidStructure(format!(
                "invalid sheet name {:?}",
                self.name
            )));
        }
        Ok(())
    }

    fn to_xml(&self, strings: &mut SharedStrings) -> String {
        let mut xml = String::new();
        xml.push_str(DECLARATION);
        xml.push('\n');
        xml.push_str(&format!(r#"<worksheet xmlns="{}">"#, SPREADSHEETML_NS));

        let width = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        if width > 0 {
            xml.push_str(&format!(
                r#"<dimension ref="A1:{}{}"/>"#,
                column_name(width - 1),
                self.rows.len()
            ));
        } else {
            xml.push_str(r#"<dimension ref="A1"/>"#);
        }

        xml.push_str("<sheetData>");
        for (r, row) in self.rows.iter().enumerate() {
            xml.push_str(&format!(r#"<row r="{}">"#, r + 1));
            for (c, value) in row.iter().enumerate() {
                let index = strings.intern(value);
                xml.push_str(&format!(
                    r#"<c r="{}{}" t="s"><v>{}</v></c>"#,
                    column_name(c),
                    r + 1,
                    index
                ));
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");
        xml
    }
}

/// A workbook of one or more worksheets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
}

impl Workbook {
    /// Create an empty workbook
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a worksheet
    pub fn with_sheet(mut self, sheet: Worksheet) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Worksheets in order
    pub fn sheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    /// Serialize to XLSX bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.sheets.is_empty() {
            return Err(OoxmlError::InvalidStructure(
                "a workbook needs at least one sheet".to_string(),
            ));
        }
        for sheet in &self.sheets {
            sheet.validate()?;
        }
        self.to_package().to_bytes()
    }

    fn to_package(&self) -> Package {
        let mut package = Package::new();
        let mut strings = SharedStrings::default();
        let mut workbook_rels = Relationships::new();
        let mut types = ContentTypes::new()
            .with_override("xl/workbook.xml", WORKBOOK_CONTENT_TYPE)
            .with_override("xl/sharedStrings.xml", SHARED_STRINGS_CONTENT_TYPE)
            .with_override("xl/styles.xml", STYLES_CONTENT_TYPE)
            .with_override(CORE_PATH, CORE_PROPERTIES_CONTENT_TYPE)
            .with_override(APP_PATH, EXTENDED_PROPERTIES_CONTENT_TYPE);

        let mut sheet_entries = String::new();
        for (i, sheet) in self.sheets.iter().enumerate() {
            let path = format!("worksheets/sheet{}.xml", i + 1);
            let rel_id = workbook_rels.add(Relationships::TYPE_WORKSHEET, path.as_str());
            package.set_string(format!("xl/{}", path), sheet.to_xml(&mut strings));
            types = types.with_override(&format!("xl/{}", path), WORKSHEET_CONTENT_TYPE);
            sheet_entries.push_str(&format!(
                r#"<sheet name="{}" sheetId="{}" r:id="{}"/>"#,
                escape_text(&sheet.name),
                i + 1,
                rel_id
            ));
            tracing::debug!(sheet = %sheet.name, rows = sheet.rows.len(), "wrote worksheet");
        }
        workbook_rels.add(Relationships::TYPE_SHARED_STRINGS, "sharedStrings.xml");
        workbook_rels.add(Relationships::TYPE_STYLES, "styles.xml");

        package.set_string(
            "xl/workbook.xml",
            format!(
                r#"{}
<workbook xmlns="{}" xmlns:r="{}"><sheets>{}</sheets></workbook>"#,
                DECLARATION, SPREADSHEETML_NS, RELATIONSHIPS_NS, sheet_entries
            ),
        );
        package.set_string("xl/_rels/workbook.xml.rels", workbook_rels.to_xml());
        package.set_string("xl/sharedStrings.xml", strings.to_xml());
        package.set_string("xl/styles.xml", styles_xml());

        let mut package_rels = Relationships::new();
        package_rels.add(Relationships::TYPE_OFFICE_DOCUMENT, "xl/workbook.xml");
        package_rels.add(Relationships::TYPE_CORE_PROPERTIES, CORE_PATH);
        package_rels.add(Relationships::TYPE_EXTENDED_PROPERTIES, APP_PATH);
        package.set_string("_rels/.rels", package_rels.to_xml());
        package.set_string(CORE_PATH, core_xml(None));
        package.set_string(APP_PATH, app_xml());
        package.set_string(CONTENT_TYPES_PATH, types.to_xml());
        package
    }
}

/// Shared string table in first-use order
#[derive(Debug, Default)]
struct SharedStrings {
    strings: Vec<String>,
    index: HashMap<String, usize>,
    count: usize,
}

impl SharedStrings {
    fn intern(&mut self, value: &str) -> usize {
        self.count += 1;
        if let Some(i) = self.index.get(value) {
            return *i;
        }
        let i = self.strings.len();
        self.strings.push(value.to_string());
        self.index.insert(value.to_string(), i);
        i
    }

    fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(DECLARATION);
        xml.push('\n');
        xml.push_str(&format!(
            r#"<sst xmlns="{}" count="{}" uniqueCount="{}">"#,
            SPREADSHEETML_NS,
            self.count,
            self.strings.len()
        ));
        for value in &self.strings {
            xml.push_str(&format!(
                r#"<si><t xml:space="preserve">{}</t></si>"#,
                escape_text(value)
            ));
        }
        xml.push_str("</sst>");
        xml
    }
}

/// Minimal stylesheet with the single default cell format
fn styles_xml() -> String {
    format!(
        concat!(
            "{}\n",
            r#"<styleSheet xmlns="{}">"#,
            r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>"#,
            r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#,
            r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
            r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
            r#"<cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>"#,
            r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
            "</styleSheet>",
        ),
        DECLARATION, SPREADSHEETML_NS
    )
}

/// Spreadsheet column letters for a zero-based index (`0` is `A`, `26` is `AA`)
pub fn column_name(index: usize) -> String {
    let mut n = index + 1;
    let mut name = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}
