//! Word document packages.
//!
//! A `.docx` file is a zip archive of parts: XML markup, relationship
//! tables linking parts together, a content type registry, and binary
//! resources such as images. This module reads and writes that container;
//! [`crate::document`] gives meaning to the parts.

pub mod content_types;
pub mod relationships;
pub mod xml;

use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use zip::ZipArchive;
use zip::write::SimpleFileOptions;

pub use content_types::ContentTypes;
pub use relationships::{Relationship, Relationships};

/// Name of the content type registry part.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Fallback location of the main document part.
pub const DEFAULT_MAIN_PART: &str = "word/document.xml";

/// A package loaded into memory.
#[derive(Debug, Clone)]
pub struct DocxPackage {
    parts: Vec<(String, Vec<u8>)>,
    index: HashMap<String, usize>,
    content_types: ContentTypes,
}

impl DocxPackage {
    /// Read every part of a zip archive.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a zip archive, an entry cannot
    /// be inflated, or the content type registry is missing or malformed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).context("not a zip archive")?;
        let mut parts = Vec::with_capacity(archive.len());
        let mut index = HashMap::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .with_context(|| format!("cannot open archive entry #{i}"))?;
            if entry.is_dir() {
                continue;
            }

            let name = entry.name().trim_start_matches('/').to_string();
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut data)
                .with_context(|| format!("cannot inflate part {name}"))?;

            index.insert(name.to_ascii_lowercase(), parts.len());
            parts.push((name, data));
        }

        let mut package = Self {
            parts,
            index,
            content_types: ContentTypes::default(),
        };

        let types = package
            .part(CONTENT_TYPES_PART)
            .context("package has no [Content_Types].xml")?;
        package.content_types = ContentTypes::parse(xml::part_text(types)?)?;

        Ok(package)
    }

    /// Bytes of a part. Part names are matched case-insensitively.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        let key = name.trim_start_matches('/').to_ascii_lowercase();
        self.index.get(&key).map(|&i| self.parts[i].1.as_slice())
    }

    /// Text of an XML part.
    pub fn part_text(&self, name: &str) -> Result<&str> {
        let bytes = self
            .part(name)
            .with_context(|| format!("package has no part {name}"))?;
        xml::part_text(bytes).with_context(|| format!("part {name}"))
    }

    /// Iterate over `(name, bytes)` in archive order.
    pub fn parts(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.parts.iter().map(|(n, d)| (n.as_str(), d.as_slice()))
    }

    /// Content type of a part.
    pub fn content_type(&self, name: &str) -> Option<&str> {
        self.content_types.content_type_for(name)
    }

    /// Relationship table of a part; empty when the part has none.
    pub fn relationships_for(&self, part: &str) -> Result<Relationships> {
        let rels_part = relationships::rels_part_for(part);
        match self.part(&rels_part) {
            Some(bytes) => Relationships::parse(xml::part_text(bytes)?)
                .with_context(|| format!("relationships part {rels_part}")),
            None => Ok(Relationships::new()),
        }
    }

    /// Locate the main document part.
    ///
    /// Follows the package-level `officeDocument` relationship, falling back
    /// to `word/document.xml`. When the registry declares a content type for
    /// the part, it must be a word-processing main part.
    pub fn main_document_part(&self) -> Result<String> {
        let package_rels = self.relationships_for("")?;
        let main = package_rels
            .first_of_type(relationships::OFFICE_DOCUMENT)
            .map(|rel| relationships::resolve_target("", &rel.target))
            .unwrap_or_else(|| DEFAULT_MAIN_PART.to_string());

        if self.part(&main).is_none() {
            bail!("main document part {main} is missing");
        }

        if let Some(ct) = self.content_type(&main)
            && ct != "application/xml"
            && !content_types::is_wordprocessing_main(ct)
        {
            bail!("main part {main} has content type {ct}, not a word-processing document");
        }

        Ok(main)
    }
}

/// Collects parts and writes them out as a zip archive.
#[derive(Debug, Default)]
pub struct PackageWriter {
    parts: Vec<(String, Vec<u8>)>,
}

impl PackageWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a part. Later parts with the same name replace earlier ones.
    pub fn add_part(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        let name = name.into();
        self.parts.retain(|(n, _)| *n != name);
        self.parts.push((name, data.into()));
    }

    /// Deflate every part into an archive, content types first.
    pub fn finish(self) -> Result<Vec<u8>> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let (first, rest): (Vec<_>, Vec<_>) = self
            .parts
            .into_iter()
            .partition(|(name, _)| name == CONTENT_TYPES_PART);

        for (name, data) in first.into_iter().chain(rest) {
            zip.start_file(name.as_str(), options)
                .with_context(|| format!("cannot start entry {name}"))?;
            zip.write_all(&data)
                .with_context(|| format!("cannot write entry {name}"))?;
        }

        let cursor = zip.finish().context("cannot finish archive")?;
        Ok(cursor.into_inner())
    }
}
