//! Core document properties (`docProps/core.xml`).
//!
//! This module writes and reads the package's core properties:
//! - Title, Creator, Subject, Keywords
//! - Last modified by
//! - Creation and modification dates

use crate::config::Metadata;
use crate::package::xml::escape_text;
use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;

/// Name recorded as the producing application.
pub const PRODUCER: &str = "docxcat";

/// Manager for core document properties.
pub struct MetadataManager;

impl MetadataManager {
    /// Create a new metadata manager.
    pub fn new() -> Self {
        Self
    }

    /// Render a core properties part.
    ///
    /// Only non-empty fields are written. The creator falls back to
    /// [`PRODUCER`] when no author is set.
    ///
    /// # Examples
    ///
    /// ```
    /// # use docxcat::merge::metadata::MetadataManager;
    /// # use docxcat::config::Metadata;
    /// let metadata = Metadata::new(Some("Minutes".to_string()), None, None, None);
    /// let xml = MetadataManager::new().core_properties(&metadata, chrono::Utc::now());
    /// assert!(xml.contains("<dc:title>Minutes</dc:title>"));
    /// assert!(xml.contains("<dc:creator>docxcat</dc:creator>"));
    /// ```
    pub fn core_properties(&self, metadata: &Metadata, now: DateTime<Utc>) -> String {
        let date = now.to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(concat!(
            r#"<cp:coreProperties "#,
            r#"xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" "#,
            r#"xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:dcmitype="http://purl.org/dc/dcmitype/" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#
        ));

        if let Some(title) = &metadata.title {
            xml.push_str(&format!("<dc:title>{}</dc:title>", escape_text(title)));
        }
        if let Some(subject) = &metadata.subject {
            xml.push_str(&format!("<dc:subject>{}</dc:subject>", escape_text(subject)));
        }
        let creator = metadata.author.as_deref().unwrap_or(PRODUCER);
        xml.push_str(&format!("<dc:creator>{}</dc:creator>", escape_text(creator)));
        if let Some(keywords) = &metadata.keywords {
            xml.push_str(&format!("<cp:keywords>{}</cp:keywords>", escape_text(keywords)));
        }
        xml.push_str(&format!("<cp:lastModifiedBy>{PRODUCER}</cp:lastModifiedBy>"));
        xml.push_str(&format!(
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{date}</dcterms:created>"#
        ));
        xml.push_str(&format!(
            r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{date}</dcterms:modified>"#
        ));
        xml.push_str("</cp:coreProperties>");
        xml
    }

    /// Read title, creator, subject and keywords from a core properties part.
    ///
    /// # Errors
    ///
    /// Returns an error if the part is not well-formed XML.
    pub fn read(&self, xml: &str) -> anyhow::Result<Metadata> {
        let mut reader = Reader::from_str(xml);
        let mut fields: [Option<String>; 4] = Default::default();
        let mut current: Option<usize> = None;

        loop {
            match reader.read_event().context("malformed core properties part")? {
                Event::Start(e) => {
                    current = match e.local_name().as_ref() {
                        b"title" => Some(0),
                        b"creator" => Some(1),
                        b"subject" => Some(2),
                        b"keywords" => Some(3),
                        _ => None,
                    };
                }
                Event::Text(t) => {
                    if let Some(i) = current {
                        let text = t.unescape().context("bad text escape")?;
                        fields[i].get_or_insert_with(String::new).push_str(&text);
                    }
                }
                Event::End(_) => current = None,
                Event::Eof => break,
                _ => {}
            }
        }

        let [title, author, subject, keywords] = fields;
        Ok(Metadata::new(title, author, subject, keywords))
    }
}

impl Default for MetadataManager {
    fn default() -> Self {
        Self::new()
    }
}
