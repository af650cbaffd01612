//! The `[Content_Types].xml` part.

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

use super::xml::{attribute, escape_text, ns};

/// Content type of the main part of a regular document.
pub const DOCUMENT_MAIN: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
/// Content type of the style definitions part.
pub const STYLES: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
/// Content type of the numbering definitions part.
pub const NUMBERING: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml";
/// Content type of the settings part.
pub const SETTINGS: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml";
/// Content type of the core properties part.
pub const CORE_PROPERTIES: &str = "application/vnd.openxmlformats-package.core-properties+xml";
/// Content type of the extended properties part.
pub const EXTENDED_PROPERTIES: &str =
    "application/vnd.openxmlformats-officedocument.extended-properties+xml";
/// Content type of relationship parts.
pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";

/// Main-part content types accepted as word-processing documents.
const WORDPROCESSING_MAIN: [&str; 2] = [
    DOCUMENT_MAIN,
    "application/vnd.ms-word.document.macroEnabled.main+xml",
];

/// True if `content_type` is the main part of a word-processing document.
pub fn is_wordprocessing_main(content_type: &str) -> bool {
    WORDPROCESSING_MAIN.contains(&content_type)
}

/// Content type registry of a package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    defaults: Vec<(String, String)>,
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    /// Registry with the defaults every package needs.
    pub fn new() -> Self {
        let mut types = Self::default();
        types.add_default("rels", RELATIONSHIPS);
        types.add_default("xml", "application/xml");
        types
    }

    /// Parse a `[Content_Types].xml` part.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut types = Self::default();

        loop {
            match reader.read_event().context("malformed content types part")? {
                Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                    b"Default" => {
                        let ext = attribute(&e, "Extension")?.context("Default without Extension")?;
                        let ct = attribute(&e, "ContentType")?.context("Default without ContentType")?;
                        types.defaults.push((ext.to_ascii_lowercase(), ct));
                    }
                    b"Override" => {
                        let part = attribute(&e, "PartName")?.context("Override without PartName")?;
                        let ct = attribute(&e, "ContentType")?.context("Override without ContentType")?;
                        types.overrides.push((normalize_part_name(&part), ct));
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(types)
    }

    /// Content type of a part, by override first and extension second.
    pub fn content_type_for(&self, part: &str) -> Option<&str> {
        let part = normalize_part_name(part);
        if let Some((_, ct)) = self
            .overrides
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&part))
        {
            return Some(ct);
        }

        let ext = part.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())?;
        self.defaults
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, ct)| ct.as_str())
    }

    /// Register a default for an extension unless one exists.
    pub fn add_default(&mut self, extension: &str, content_type: &str) {
        let extension = extension.to_ascii_lowercase();
        if !self.defaults.iter().any(|(e, _)| *e == extension) {
            self.defaults.push((extension, content_type.to_string()));
        }
    }

    /// Register an override for a single part, replacing an earlier one.
    pub fn add_override(&mut self, part: &str, content_type: &str) {
        let part = normalize_part_name(part);
        self.overrides.retain(|(name, _)| *name != part);
        self.overrides.push((part, content_type.to_string()));
    }

    /// Make sure `part` resolves to `content_type`, preferring an extension
    /// default when the extension is still free.
    pub fn register(&mut self, part: &str, content_type: &str) {
        if self.content_type_for(part) == Some(content_type) {
            return;
        }
        match part.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
            Some(ext) if !self.defaults.iter().any(|(e, _)| *e == ext) => {
                self.add_default(&ext, content_type)
            }
            _ => self.add_override(part, content_type),
        }
    }

    /// Serialize as a `[Content_Types].xml` part.
    pub fn to_xml(&self) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<Types xmlns="{}">"#, ns::CONTENT_TYPES));
        for (ext, ct) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_text(ext),
                escape_text(ct)
            ));
        }
        for (part, ct) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_text(part),
                escape_text(ct)
            ));
        }
        xml.push_str("</Types>");
        xml
    }
}

/// Part names are compared in their `/`-rooted form.
fn normalize_part_name(part: &str) -> String {
    if part.starts_with('/') {
        part.to_string()
    } else {
        format!("/{part}")
    }
}
