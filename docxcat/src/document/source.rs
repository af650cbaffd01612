//! A parsed input document.

use anyhow::Context;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use super::DocumentSummary;
use super::media::EmbeddedImage;
use crate::config::Metadata;
use crate::error::{DocxCatError, Result};
use crate::merge::metadata::MetadataManager;
use crate::package::relationships::{self, Relationship, Relationships, resolve_target};
use crate::package::xml::{
    self, BodyElement, BodyElementKind, KeyedElement, RootNamespaces, ns, scan_body,
    scan_keyed_children,
};
use crate::package::DocxPackage;

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// List definitions of a numbering part.
#[derive(Debug, Clone)]
pub struct NumberingDefinitions {
    /// Namespaces of the numbering part root.
    pub namespaces: RootNamespaces,
    /// `w:abstractNum` elements keyed by `w:abstractNumId`.
    pub abstract_nums: Vec<KeyedElement>,
    /// `w:num` elements keyed by `w:numId`.
    pub nums: Vec<KeyedElement>,
}

/// An input document split into the pieces a merge needs.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    key: u64,
    name: String,
    package: DocxPackage,
    main_part: String,
    relationships: Relationships,
    namespaces: RootNamespaces,
    elements: Vec<BodyElement>,
}

impl SourceDocument {
    /// Parse a `.docx` buffer.
    ///
    /// # Errors
    ///
    /// Returns `MalformedInput` naming the document if the buffer is not a
    /// readable word-processing package.
    pub fn parse(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let name = name.into();
        match Self::read(&name, bytes) {
            Ok(doc) => Ok(doc),
            Err(e) => Err(DocxCatError::malformed_input(name, format!("{e:#}"))),
        }
    }

    fn read(name: &str, bytes: &[u8]) -> anyhow::Result<Self> {
        let package = DocxPackage::from_bytes(bytes)?;
        let main_part = package.main_document_part()?;
        let relationships = package.relationships_for(&main_part)?;
        let scan = scan_body(package.part_text(&main_part)?)
            .with_context(|| format!("main document part {main_part}"))?;

        debug!(
            document = name,
            part = main_part.as_str(),
            elements = scan.elements.len(),
            relationships = relationships.len(),
            "parsed document"
        );

        Ok(Self {
            key: NEXT_KEY.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
            package,
            main_part,
            relationships,
            namespaces: scan.namespaces,
            elements: scan.elements,
        })
    }

    /// Identifies this parse; clones share it.
    pub(crate) fn key(&self) -> u64 {
        self.key
    }

    /// Display name of the document.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the main document part.
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    /// The underlying package.
    pub fn package(&self) -> &DocxPackage {
        &self.package
    }

    /// Namespace declarations of the document root.
    pub fn namespaces(&self) -> &RootNamespaces {
        &self.namespaces
    }

    /// Relationship table of the main document part.
    pub fn relationships(&self) -> &Relationships {
        &self.relationships
    }

    /// Prefixes bound to the relationships namespace on the document root.
    pub fn relationship_prefixes(&self) -> Vec<String> {
        self.namespaces.prefixes_for(ns::R)
    }

    /// Every top-level body element, section properties included.
    pub fn all_elements(&self) -> &[BodyElement] {
        &self.elements
    }

    /// Top-level body content: everything except the body's section
    /// properties.
    pub fn body_elements(&self) -> impl Iterator<Item = &BodyElement> {
        self.elements
            .iter()
            .filter(|e| e.kind != BodyElementKind::SectionProperties)
    }

    /// Text of every top-level paragraph, in document order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(BodyElement::paragraph_text)
    }

    /// Resolved part name of an internal relationship.
    pub fn target_part(&self, rel: &Relationship) -> Option<String> {
        (!rel.external).then(|| resolve_target(&self.main_part, &rel.target))
    }

    /// Every embedded image, in relationship order.
    ///
    /// External images and relationships pointing at missing parts carry
    /// no bytes and are skipped.
    pub fn images(&self) -> Vec<EmbeddedImage> {
        let mut images = Vec::new();
        for rel in self.relationships.images() {
            let Some(part) = self.target_part(rel) else {
                debug!(document = self.name.as_str(), id = rel.id.as_str(), "skipping external image");
                continue;
            };
            let Some(data) = self.package.part(&part) else {
                warn!(
                    document = self.name.as_str(),
                    id = rel.id.as_str(),
                    part = part.as_str(),
                    "image relationship points at a missing part"
                );
                continue;
            };
            images.push(EmbeddedImage {
                relationship_id: rel.id.clone(),
                content_type: self.package.content_type(&part).map(str::to_string),
                part_name: part,
                data: data.to_vec(),
            });
        }
        images
    }

    /// Style definitions of the document, keyed by style id, with the
    /// namespaces of the style part. `None` when the document has no style
    /// part.
    pub fn styles(&self) -> Result<Option<(RootNamespaces, Vec<KeyedElement>)>> {
        let Some((part, text)) = self.related_part(relationships::STYLES)? else {
            return Ok(None);
        };
        scan_keyed_children(text, b"style", "styleId")
            .map(Some)
            .map_err(|e| DocxCatError::malformed_input(&self.name, format!("{part}: {e:#}")))
    }

    /// List definitions of the document. `None` when the document has no
    /// numbering part.
    pub fn numbering(&self) -> Result<Option<NumberingDefinitions>> {
        let Some((part, text)) = self.related_part(relationships::NUMBERING)? else {
            return Ok(None);
        };
        let scan = || -> anyhow::Result<NumberingDefinitions> {
            let (namespaces, abstract_nums) =
                scan_keyed_children(text, b"abstractNum", "abstractNumId")?;
            let (_, nums) = scan_keyed_children(text, b"num", "numId")?;
            let (_, bullets) = scan_keyed_children(text, b"numPicBullet", "numPicBulletId")?;
            if !bullets.is_empty() {
                warn!(
                    document = self.name.as_str(),
                    count = bullets.len(),
                    "picture bullets are not carried over"
                );
            }
            Ok(NumberingDefinitions {
                namespaces,
                abstract_nums,
                nums,
            })
        };
        scan()
            .map(Some)
            .map_err(|e| DocxCatError::malformed_input(&self.name, format!("{part}: {e:#}")))
    }

    /// Name and text of the part the main part relates to with `rel_type`.
    fn related_part(&self, rel_type: &str) -> Result<Option<(String, &str)>> {
        let Some(part) = self
            .relationships
            .first_of_type(rel_type)
            .and_then(|rel| self.target_part(rel))
        else {
            return Ok(None);
        };
        let Some(bytes) = self.package.part(&part) else {
            warn!(document = self.name.as_str(), part = part.as_str(), "related part is missing");
            return Ok(None);
        };
        let text = xml::part_text(bytes)
            .map_err(|e| DocxCatError::malformed_input(&self.name, format!("{part}: {e:#}")))?;
        Ok(Some((part, text)))
    }

    /// Core properties of the document, if it has any.
    pub fn metadata(&self) -> Option<Metadata> {
        let rels = self.package.relationships_for("").ok()?;
        let rel = rels.first_of_type(relationships::CORE_PROPERTIES)?;
        let text = self.package.part_text(&resolve_target("", &rel.target)).ok()?;
        MetadataManager::new().read(text).ok()
    }

    /// Counts describing the document.
    pub fn summary(&self, size: u64) -> DocumentSummary {
        let paragraphs: Vec<&str> = self.paragraphs().collect();
        DocumentSummary {
            name: self.name.clone(),
            size,
            paragraphs: paragraphs.len(),
            non_blank_paragraphs: paragraphs.iter().filter(|p| !p.trim().is_empty()).count(),
            tables: self
                .elements
                .iter()
                .filter(|e| e.kind == BodyElementKind::Table)
                .count(),
            body_elements: self.body_elements().count(),
            images: self.images().len(),
            title: self.metadata().and_then(|m| m.title),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fixtures::{FixtureDocx, png};

    #[test]
    fn test_parse_splits_body() {
        let bytes = FixtureDocx::new()
            .paragraph("Intro")
            .paragraph("   ")
            .raw("<w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>")
            .paragraph("Outro")
            .build();
        let doc = SourceDocument::parse("a.docx", &bytes).unwrap();

        assert_eq!(doc.name(), "a.docx");
        assert_eq!(doc.main_part(), "word/document.xml");
        assert_eq!(doc.all_elements().len(), 5);
        assert_eq!(doc.body_elements().count(), 4);
        assert_eq!(doc.paragraphs().collect::<Vec<_>>(), vec!["Intro", "   ", "Outro"]);
        assert_eq!(doc.relationship_prefixes(), vec!["r".to_string()]);
    }

    #[test]
    fn test_images_in_relationship_order_skipping_external() {
        let first = png(3, 2);
        let second = png(5, 5);
        let bytes = FixtureDocx::new()
            .image_part(first.clone())
            .external_image("https://example.com/remote.png")
            .picture(second.clone())
            .build();
        let doc = SourceDocument::parse("pics.docx", &bytes).unwrap();

        let images = doc.images();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].data, first);
        assert_eq!(images[1].data, second);
        assert_eq!(images[0].part_name, "word/media/image1.png");
        assert_eq!(images[0].content_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn test_styles_and_summary() {
        let bytes = FixtureDocx::new()
            .style("Quote", "paragraph")
            .paragraph("one")
            .paragraph("")
            .build();
        let doc = SourceDocument::parse("s.docx", &bytes).unwrap();

        let (_, styles) = doc.styles().unwrap().unwrap();
        assert_eq!(styles.len(), 1);
        assert_eq!(styles[0].key, "Quote");

        let summary = doc.summary(bytes.len() as u64);
        assert_eq!(summary.paragraphs, 2);
        assert_eq!(summary.non_blank_paragraphs, 1);
        assert_eq!(summary.images, 0);
        assert_eq!(summary.title, None);
    }

    #[test]
    fn test_numbering_definitions() {
        let bytes = FixtureDocx::new()
            .numbering("4", "7")
            .list_item("7", "first")
            .build();
        let doc = SourceDocument::parse("list.docx", &bytes).unwrap();

        let numbering = doc.numbering().unwrap().unwrap();
        assert_eq!(numbering.abstract_nums.len(), 1);
        assert_eq!(numbering.abstract_nums[0].key, "4");
        assert_eq!(numbering.nums.len(), 1);
        assert_eq!(numbering.nums[0].key, "7");
        assert!(numbering.nums[0].markup.contains(r#"<w:abstractNumId w:val="4"/>"#));
        assert_eq!(doc.paragraphs().collect::<Vec<_>>(), vec!["first"]);
    }

    #[test]
    fn test_document_without_styles() {
        let bytes = FixtureDocx::new().paragraph("x").build();
        let doc = SourceDocument::parse("plain.docx", &bytes).unwrap();
        assert!(doc.styles().unwrap().is_none());
        assert!(doc.numbering().unwrap().is_none());
        assert!(doc.metadata().is_none());
    }

    #[test]
    fn test_malformed_input_names_document() {
        let err = SourceDocument::parse("broken.docx", b"PK\x03\x04 truncated").unwrap_err();
        match err {
            DocxCatError::MalformedInput { name, .. } => assert_eq!(name, "broken.docx"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
