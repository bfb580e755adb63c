//! Package container for DOCX and XLSX files
//!
//! Both formats are ZIP archives of XML parts and media. Parts are kept in a
//! sorted map and written with a fixed timestamp, so the same parts always
//! produce the same archive bytes.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek, Write};

use zip::read::ZipArchive;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

use crate::error::{OoxmlError, Result};

/// An in-memory OOXML package
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Package {
    /// Part contents keyed by path
    parts: BTreeMap<String, Vec<u8>>,
}

impl Package {
    /// Create an empty package
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every part of an existing archive
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut parts = BTreeMap::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();
            if name.ends_with('/') {
                continue;
            }
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            parts.insert(name, contents);
        }

        Ok(Self { parts })
    }

    /// Read a package from archive bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Get a part's contents by path
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.parts.get(path).map(|v| v.as_slice())
    }

    /// Get a part as text, failing when it is absent
    pub fn part_string(&self, path: &str) -> Result<String> {
        self.get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .ok_or_else(|| OoxmlError::MissingPart(path.to_string()))
    }

    /// Check whether a part exists
    pub fn contains(&self, path: &str) -> bool {
        self.parts.contains_key(path)
    }

    /// Part paths in archive order
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(|s| s.as_str())
    }

    /// Number of parts
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the package has no parts
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Set or replace a part
    pub fn set(&mut self, path: impl Into<String>, contents: Vec<u8>) {
        self.parts.insert(path.into(), contents);
    }

    /// Set a part from text
    pub fn set_string(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.parts.insert(path.into(), contents.into().into_bytes());
    }

    /// Write the archive to any writer
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        // [Content_Types].xml sorts ahead of every lowercase part name
        for (path, contents) in &self.parts {
            zip.start_file(path.as_str(), options)?;
            zip.write_all(contents)?;
        }

        zip.finish()?;
        Ok(())
    }

    /// Write the archive to a byte buffer
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(&mut cursor)?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_operations() {
        let mut package = Package::new();
        package.set_string("word/document.xml", "<w:document/>");
        assert!(package.contains("word/document.xml"));
        assert_eq!(
            package.part_string("word/document.xml").unwrap(),
            "<w:document/>"
        );
        assert!(matches!(
            package.part_string("word/styles.xml"),
            Err(OoxmlError::MissingPart(_))
        ));
    }

    #[test]
    fn test_archive_is_readable_and_sorted() {
        let mut package = Package::new();
        package.set_string("word/document.xml", "<a/>");
        package.set_string("[Content_Types].xml", "<Types/>");
        package.set_string("_rels/.rels", "<Relationships/>");

        let bytes = package.to_bytes().unwrap();
        let mut archive = ZipArchive::new(Cursor::new(&bytes)).unwrap();
        assert_eq!(archive.by_index(0).unwrap().name(), "[Content_Types].xml");

        let reread = Package::from_bytes(&bytes).unwrap();
        assert_eq!(reread, package);
    }

    #[test]
    fn test_archive_bytes_are_stable() {
        let mut package = Package::new();
        package.set_string("b.xml", "<b/>");
        package.set("a.bin", vec![1, 2, 3]);
        assert_eq!(package.to_bytes().unwrap(), package.to_bytes().unwrap());
    }
}
