//! Package relationship tables (`*.rels` parts).

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::Event;

use super::xml::{attribute, escape_text, ns};

/// Relationship type of the main document part.
pub const OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
/// Relationship type of an image part.
pub const IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
/// Relationship type of the style definitions part.
pub const STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
/// Relationship type of the numbering definitions part.
pub const NUMBERING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering";
/// Relationship type of the settings part.
pub const SETTINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/settings";
/// Relationship type of the core properties part.
pub const CORE_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
/// Relationship type of the extended properties part.
pub const EXTENDED_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";

/// One entry of a relationship table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship id, unique within its table (`rId1`, ...).
    pub id: String,
    /// Relationship type URI.
    pub rel_type: String,
    /// Target, relative to the source part unless external.
    pub target: String,
    /// Whether the target lives outside the package.
    pub external: bool,
}

impl Relationship {
    /// True if the relationship type tag marks an image.
    pub fn is_image(&self) -> bool {
        self.rel_type.contains("image")
    }
}

/// An ordered relationship table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    items: Vec<Relationship>,
}

impl Relationships {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `.rels` part, keeping declaration order.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut items = Vec::new();

        loop {
            match reader.read_event().context("malformed relationships part")? {
                Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                    let id = attribute(&e, "Id")?.context("relationship without Id")?;
                    let rel_type = attribute(&e, "Type")?
                        .with_context(|| format!("relationship {id} without Type"))?;
                    let target = attribute(&e, "Target")?
                        .with_context(|| format!("relationship {id} without Target"))?;
                    let external = attribute(&e, "TargetMode")?
                        .is_some_and(|mode| mode.eq_ignore_ascii_case("External"));

                    items.push(Relationship {
                        id,
                        rel_type,
                        target,
                        external,
                    });
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(Self { items })
    }

    /// Look up a relationship by id.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.id == id)
    }

    /// First relationship of the given type.
    pub fn first_of_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.rel_type == rel_type)
    }

    /// Iterate in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.items.iter()
    }

    /// Image relationships in declaration order.
    pub fn images(&self) -> impl Iterator<Item = &Relationship> {
        self.items.iter().filter(|r| r.is_image())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append a relationship under a fresh id and return that id.
    pub fn add(&mut self, rel_type: &str, target: &str, external: bool) -> String {
        let mut n = self.items.len() + 1;
        let id = loop {
            let candidate = format!("rId{n}");
            if self.get(&candidate).is_none() {
                break candidate;
            }
            n += 1;
        };

        self.items.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            external,
        });
        id
    }

    /// Append a relationship as is, replacing any entry with the same id.
    pub fn push(&mut self, rel: Relationship) {
        self.items.retain(|r| r.id != rel.id);
        self.items.push(rel);
    }

    /// Serialize as a `.rels` part.
    pub fn to_xml(&self) -> String {
        let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<Relationships xmlns="{}">"#, ns::PACKAGE_RELS));
        for rel in &self.items {
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

/// Name of the relationships part belonging to `part`.
///
/// `word/document.xml` maps to `word/_rels/document.xml.rels`; the package
/// itself (empty name) maps to `_rels/.rels`.
pub fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship target against the part that owns it.
///
/// Returns a normalized part name without a leading slash.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return normalize(absolute.split('/'));
    }
    let dir = source_part.rsplit_once('/').map_or("", |(dir, _)| dir);
    normalize(dir.split('/').chain(target.split('/')))
}

fn normalize<'a>(segments: impl Iterator<Item = &'a str>) -> String {
    let mut out: Vec<&str> = Vec::new();
    for segment in segments {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            s => out.push(s),
        }
    }
    out.join("/")
}
