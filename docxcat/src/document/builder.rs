//! Builds the merged output package.

use chrono::Utc;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use super::media::{EmbeddedImage, Extent};
use super::source::SourceDocument;
use super::templates;
use crate::config::Metadata;
use crate::error::{DocxCatError, Result};
use crate::merge::metadata::MetadataManager;
use crate::package::content_types::{self, ContentTypes};
use crate::package::relationships::{self, Relationships, rels_part_for, resolve_target};
use crate::package::xml::{FragmentRewriter, RootNamespaces, escape_text, rewrite_fragment};
use crate::package::{CONTENT_TYPES_PART, PackageWriter};

pub(crate) const MAIN_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";
const NUMBERING_PART: &str = "word/numbering.xml";
const SETTINGS_PART: &str = "word/settings.xml";
const CORE_PART: &str = "docProps/core.xml";
const APP_PART: &str = "docProps/app.xml";

/// What has been added to a [`DocumentBuilder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildCounts {
    /// Heading paragraphs.
    pub headings: usize,
    /// Plain paragraphs, separators and blank spacers included.
    pub paragraphs: usize,
    /// Body elements copied verbatim.
    pub elements: usize,
    /// Pictures appended.
    pub images: usize,
    /// Parts copied from sources to satisfy relationships.
    pub parts_copied: usize,
    /// Style definitions imported from sources.
    pub styles_imported: usize,
    /// List instances imported from sources.
    pub lists_imported: usize,
}

/// How one source maps into the output. Kept while that source is being
/// appended so that its styles, body and pictures share relationships.
#[derive(Debug, Default)]
struct SourceImport {
    key: u64,
    /// Source relationship id to output relationship id.
    relationships: HashMap<String, Option<String>>,
    /// Source part name to output part name.
    parts: HashMap<String, String>,
    /// Source `w:numId` to output `w:numId`.
    numbering: HashMap<String, String>,
}

/// An empty document that content is appended to, then serialized once.
#[derive(Debug)]
pub struct DocumentBuilder {
    body: Vec<String>,
    namespaces: RootNamespaces,
    relationships: Relationships,
    content_types: ContentTypes,
    parts: Vec<(String, Vec<u8>)>,
    taken: HashSet<String>,
    style_namespaces: RootNamespaces,
    style_ids: HashSet<String>,
    imported_styles: Vec<String>,
    numbering_namespaces: RootNamespaces,
    abstract_nums: Vec<String>,
    nums: Vec<String>,
    next_abstract_num: u32,
    next_num: u32,
    import: Option<SourceImport>,
    next_drawing_id: u32,
    metadata: Metadata,
    counts: BuildCounts,
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentBuilder {
    /// Start a new, empty document.
    pub fn new() -> Self {
        let mut rels = Relationships::new();
        rels.add(relationships::STYLES, "styles.xml", false);
        rels.add(relationships::SETTINGS, "settings.xml", false);

        let mut types = ContentTypes::new();
        types.add_override(MAIN_PART, content_types::DOCUMENT_MAIN);
        types.add_override(STYLES_PART, content_types::STYLES);
        types.add_override(SETTINGS_PART, content_types::SETTINGS);
        types.add_override(CORE_PART, content_types::CORE_PROPERTIES);
        types.add_override(APP_PART, content_types::EXTENDED_PROPERTIES);

        let taken = [
            CONTENT_TYPES_PART,
            "_rels/.rels",
            MAIN_PART,
            "word/_rels/document.xml.rels",
            STYLES_PART,
            NUMBERING_PART,
            SETTINGS_PART,
            CORE_PART,
            APP_PART,
        ]
        .iter()
        .map(|p| p.to_ascii_lowercase())
        .collect();

        Self {
            body: Vec::new(),
            namespaces: templates::document_namespaces(),
            relationships: rels,
            content_types: types,
            parts: Vec::new(),
            taken,
            style_namespaces: templates::styles_namespaces(),
            style_ids: templates::base_style_ids().into_iter().collect(),
            imported_styles: Vec::new(),
            numbering_namespaces: templates::styles_namespaces(),
            abstract_nums: Vec::new(),
            nums: Vec::new(),
            next_abstract_num: 0,
            next_num: 1,
            import: None,
            next_drawing_id: 1,
            metadata: Metadata::default(),
            counts: BuildCounts::default(),
        }
    }

    /// Core properties written on [`finish`](Self::finish).
    pub fn set_metadata(&mut self, metadata: Metadata) {
        self.metadata = metadata;
    }

    /// Number of top-level body elements appended so far.
    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Counts of everything appended so far.
    pub fn counts(&self) -> BuildCounts {
        self.counts
    }

    /// Append a heading. Level 0 is the title style, 1 to 9 the heading styles.
    pub fn add_heading(&mut self, text: &str, level: u8) {
        let style = match level {
            0 => "Title".to_string(),
            n => format!("Heading{}", n.min(9)),
        };
        self.body.push(format!(
            r#"<w:p><w:pPr><w:pStyle w:val="{style}"/></w:pPr>{}</w:p>"#,
            run_markup(text)
        ));
        self.counts.headings += 1;
    }

    /// Append a paragraph of plain text. Tabs and line breaks become
    /// `w:tab` and `w:br`.
    pub fn add_paragraph(&mut self, text: &str) {
        if text.is_empty() {
            self.body.push("<w:p/>".to_string());
        } else {
            self.body.push(format!("<w:p>{}</w:p>", run_markup(text)));
        }
        self.counts.paragraphs += 1;
    }

    /// Copy every body element of `source` verbatim.
    ///
    /// Relationship references are remapped into the output, carrying the
    /// parts they point at. Drawing ids are renumbered, and list references
    /// follow the ids [`import_numbering`](Self::import_numbering) assigned.
    /// Returns the number of elements copied.
    pub fn append_body(&mut self, source: &SourceDocument) -> Result<usize> {
        self.namespaces.merge(source.namespaces());
        let prefixes = source.relationship_prefixes();

        let copied = self.with_importer(source, |importer| {
            let mut copied = Vec::new();
            for element in source.body_elements() {
                copied.push(rewrite_fragment(&element.markup, &prefixes, importer)?);
            }
            Ok(copied)
        })?;

        let count = copied.len();
        self.counts.elements += count;
        self.body.extend(copied);
        Ok(count)
    }

    /// Import the style definitions of `source` whose ids the output does
    /// not define yet. Returns the number imported.
    pub fn import_styles(&mut self, source: &SourceDocument) -> Result<usize> {
        let Some((namespaces, styles)) = source.styles()? else {
            return Ok(0);
        };
        self.style_namespaces.merge(&namespaces);

        let fresh: Vec<_> = styles
            .into_iter()
            .filter(|style| self.style_ids.insert(style.key.clone()))
            .collect();
        let imported = self.with_importer(source, |importer| {
            let mut imported = Vec::with_capacity(fresh.len());
            for style in &fresh {
                imported.push(rewrite_fragment(&style.markup, &[], importer)?);
            }
            Ok(imported)
        })?;

        let count = imported.len();
        self.imported_styles.extend(imported);
        self.counts.styles_imported += count;
        Ok(count)
    }

    /// Import the list definitions of `source`.
    ///
    /// Abstract and instance ids are reassigned so lists of different
    /// sources never share an id. Call before [`import_styles`](Self::import_styles)
    /// and [`append_body`](Self::append_body) so their list references are
    /// rewritten. Returns the number of list instances imported.
    pub fn import_numbering(&mut self, source: &SourceDocument) -> Result<usize> {
        let Some(numbering) = source.numbering()? else {
            return Ok(0);
        };
        self.numbering_namespaces.merge(&numbering.namespaces);

        let mut ids = NumberingIds::default();
        for definition in &numbering.abstract_nums {
            ids.abstract_nums
                .insert(definition.key.clone(), self.next_abstract_num.to_string());
            self.next_abstract_num += 1;
        }
        for num in &numbering.nums {
            ids.nums.insert(num.key.clone(), self.next_num.to_string());
            self.next_num += 1;
        }

        for definition in &numbering.abstract_nums {
            self.abstract_nums
                .push(rewrite_fragment(&definition.markup, &[], &mut ids)?);
        }
        for num in &numbering.nums {
            self.nums.push(rewrite_fragment(&num.markup, &[], &mut ids)?);
        }

        let count = numbering.nums.len();
        debug!(document = source.name(), lists = count, "imported numbering");
        let mut import = self.take_import(source);
        import.numbering = ids.nums;
        self.import = Some(import);
        self.counts.lists_imported += count;
        Ok(count)
    }

    /// Append an image as an inline picture in its own paragraph.
    pub fn add_picture(&mut self, image: &EmbeddedImage, extent: Extent) {
        let desired = format!("word/media/image{}.{}", self.counts.images + 1, image.extension());
        let part = self.reserve_part_name(&desired);
        self.add_part(part.clone(), image.data.clone(), Some(&image.mime_type()));

        let rel_id = self
            .relationships
            .add(relationships::IMAGE, &relative_target(MAIN_PART, &part), false);
        let drawing_id = self.next_drawing_id();
        self.body
            .push(picture_markup(&rel_id, drawing_id, image.file_name(), extent));
        self.counts.images += 1;
    }

    /// Append an image of `source` as an inline picture in its own
    /// paragraph.
    ///
    /// The picture points at the relationship the source's copied markup
    /// uses for the same image, so the image part is stored once.
    pub fn add_source_picture(
        &mut self,
        source: &SourceDocument,
        image: &EmbeddedImage,
        extent: Extent,
    ) -> Result<()> {
        let rel_id = self.with_importer(source, |importer| {
            importer.relationship(&image.relationship_id)
        })?;
        let Some(rel_id) = rel_id else {
            self.add_picture(image, extent);
            return Ok(());
        };

        let drawing_id = self.next_drawing_id();
        self.body
            .push(picture_markup(&rel_id, drawing_id, image.file_name(), extent));
        self.counts.images += 1;
        Ok(())
    }

    /// Serialize the package.
    ///
    /// # Errors
    ///
    /// Returns `OutputSerialization` if the archive cannot be written.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let mut writer = PackageWriter::new();
        if !self.nums.is_empty() {
            self.relationships
                .add(relationships::NUMBERING, "numbering.xml", false);
            self.content_types
                .add_override(NUMBERING_PART, content_types::NUMBERING);

            let mut numbering = String::from(templates::XML_DECLARATION);
            numbering.push_str(&format!(
                "<w:numbering{}>",
                self.numbering_namespaces.to_attributes()
            ));
            for chunk in self.abstract_nums.iter().chain(&self.nums) {
                numbering.push_str(chunk);
            }
            numbering.push_str("</w:numbering>");
            writer.add_part(NUMBERING_PART, numbering);
        }
        writer.add_part(CONTENT_TYPES_PART, self.content_types.to_xml());

        let mut package_rels = Relationships::new();
        package_rels.add(relationships::OFFICE_DOCUMENT, MAIN_PART, false);
        package_rels.add(relationships::CORE_PROPERTIES, CORE_PART, false);
        package_rels.add(relationships::EXTENDED_PROPERTIES, APP_PART, false);
        writer.add_part("_rels/.rels", package_rels.to_xml());

        let body_len: usize = self.body.iter().map(String::len).sum();
        let mut document = String::with_capacity(body_len + 4096);
        document.push_str(templates::XML_DECLARATION);
        document.push_str(&format!(
            "<w:document{}><w:body>",
            self.namespaces.to_attributes()
        ));
        for chunk in &self.body {
            document.push_str(chunk);
        }
        document.push_str(templates::SECTION_PROPERTIES);
        document.push_str("</w:body></w:document>");
        writer.add_part(MAIN_PART, document);
        writer.add_part(rels_part_for(MAIN_PART), self.relationships.to_xml());

        let mut styles = String::from(templates::XML_DECLARATION);
        styles.push_str(&format!("<w:styles{}>", self.style_namespaces.to_attributes()));
        styles.push_str(&templates::styles_body());
        for style in &self.imported_styles {
            styles.push_str(style);
        }
        styles.push_str("</w:styles>");
        writer.add_part(STYLES_PART, styles);

        writer.add_part(SETTINGS_PART, templates::SETTINGS);
        writer.add_part(
            CORE_PART,
            MetadataManager::new().core_properties(&self.metadata, Utc::now()),
        );
        writer.add_part(APP_PART, templates::APP_PROPERTIES);

        for (name, data) in self.parts {
            writer.add_part(name, data);
        }

        writer
            .finish()
            .map_err(|e| DocxCatError::output_serialization(format!("{e:#}")))
    }

    /// Import state for `source`, fresh when the previous state belonged to
    /// another source.
    fn take_import(&mut self, source: &SourceDocument) -> SourceImport {
        match self.import.take() {
            Some(import) if import.key == source.key() => import,
            _ => SourceImport {
                key: source.key(),
                ..SourceImport::default()
            },
        }
    }

    fn with_importer<T>(
        &mut self,
        source: &SourceDocument,
        f: impl FnOnce(&mut PartImporter<'_>) -> Result<T>,
    ) -> Result<T> {
        let import = self.take_import(source);
        let mut importer = PartImporter {
            builder: self,
            source,
            import,
        };
        let result = f(&mut importer);
        let import = importer.import;
        self.import = Some(import);
        result
    }

    fn next_drawing_id(&mut self) -> u32 {
        let id = self.next_drawing_id;
        self.next_drawing_id += 1;
        id
    }

    /// Claim a part name, suffixing `_2`, `_3`, ... to the file stem when
    /// the name is taken.
    fn reserve_part_name(&mut self, desired: &str) -> String {
        let (dir, file) = desired.rsplit_once('/').unwrap_or(("", desired));
        let (stem, ext) = match file.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
            _ => (file, None),
        };

        let mut candidate = desired.to_string();
        let mut n = 2;
        while !self.taken.insert(candidate.to_ascii_lowercase()) {
            let file = match ext {
                Some(ext) => format!("{stem}_{n}.{ext}"),
                None => format!("{stem}_{n}"),
            };
            candidate = if dir.is_empty() {
                file
            } else {
                format!("{dir}/{file}")
            };
            n += 1;
        }
        candidate
    }

    fn add_part(&mut self, name: String, data: Vec<u8>, content_type: Option<&str>) {
        let content_type = content_type
            .map(str::to_string)
            .or_else(|| super::media::guess_format(&data).map(|f| f.to_mime_type().to_string()))
            .unwrap_or_else(|| "application/octet-stream".to_string());
        self.content_types.register(&name, &content_type);
        self.parts.push((name, data));
    }
}

/// New ids for the list definitions of one source.
#[derive(Debug, Default)]
struct NumberingIds {
    abstract_nums: HashMap<String, String>,
    nums: HashMap<String, String>,
}

impl FragmentRewriter for NumberingIds {
    fn relationship(&mut self, _id: &str) -> Result<Option<String>> {
        Ok(None)
    }

    // Numbering definitions carry no drawings.
    fn drawing_id(&mut self) -> u32 {
        0
    }

    fn numbering_id(&mut self, id: &str) -> Option<String> {
        self.nums.get(id).cloned()
    }

    fn abstract_numbering_id(&mut self, id: &str) -> Option<String> {
        self.abstract_nums.get(id).cloned()
    }
}

/// Remaps references of one source while its markup is copied.
struct PartImporter<'a> {
    builder: &'a mut DocumentBuilder,
    source: &'a SourceDocument,
    import: SourceImport,
}

impl FragmentRewriter for PartImporter<'_> {
    fn relationship(&mut self, id: &str) -> Result<Option<String>> {
        if let Some(mapped) = self.import.relationships.get(id) {
            return Ok(mapped.clone());
        }
        let mapped = self.import_relationship(id)?;
        self.import
            .relationships
            .insert(id.to_string(), mapped.clone());
        Ok(mapped)
    }

    fn drawing_id(&mut self) -> u32 {
        self.builder.next_drawing_id()
    }

    fn numbering_id(&mut self, id: &str) -> Option<String> {
        self.import.numbering.get(id).cloned()
    }
}

impl PartImporter<'_> {
    fn import_relationship(&mut self, id: &str) -> Result<Option<String>> {
        let source = self.source;
        let Some(rel) = source.relationships().get(id) else {
            warn!(
                document = source.name(),
                id, "reference to an undeclared relationship left as is"
            );
            return Ok(None);
        };

        if rel.external {
            let new_id = self
                .builder
                .relationships
                .add(&rel.rel_type, &rel.target, true);
            return Ok(Some(new_id));
        }

        let part = resolve_target(source.main_part(), &rel.target);
        let Some(new_part) = self.copy_part(&part)? else {
            warn!(
                document = source.name(),
                id,
                part = part.as_str(),
                "relationship target is missing, reference left as is"
            );
            return Ok(None);
        };

        let target = relative_target(MAIN_PART, &new_part);
        Ok(Some(
            self.builder.relationships.add(&rel.rel_type, &target, false),
        ))
    }

    /// Copy a source part, and the parts it links to, into the output.
    /// Nested relationship tables keep their ids so the copied markup stays
    /// valid.
    fn copy_part(&mut self, part: &str) -> Result<Option<String>> {
        let source = self.source;
        if part.eq_ignore_ascii_case(source.main_part()) {
            return Ok(Some(MAIN_PART.to_string()));
        }
        if let Some(done) = self.import.parts.get(part) {
            return Ok(Some(done.clone()));
        }
        let package = source.package();
        let Some(data) = package.part(part) else {
            return Ok(None);
        };

        let new_part = self.builder.reserve_part_name(part);
        self.import.parts.insert(part.to_string(), new_part.clone());
        debug!(
            document = source.name(),
            from = part,
            to = new_part.as_str(),
            "copying part"
        );

        let rels = package.relationships_for(part).map_err(|e| {
            DocxCatError::malformed_input(source.name(), format!("{part}: {e:#}"))
        })?;
        if !rels.is_empty() {
            let mut nested = Relationships::new();
            for rel in rels.iter() {
                let mut rel = rel.clone();
                if !rel.external {
                    let target = resolve_target(part, &rel.target);
                    match self.copy_part(&target)? {
                        Some(copied) => rel.target = relative_target(&new_part, &copied),
                        None => warn!(
                            document = source.name(),
                            part = target.as_str(),
                            "nested relationship target is missing"
                        ),
                    }
                }
                nested.push(rel);
            }
            let rels_part = rels_part_for(&new_part);
            self.builder.taken.insert(rels_part.to_ascii_lowercase());
            self.builder
                .parts
                .push((rels_part, nested.to_xml().into_bytes()));
        }

        let content_type = package.content_type(part).map(str::to_string);
        self.builder
            .add_part(new_part.clone(), data.to_vec(), content_type.as_deref());
        self.builder.counts.parts_copied += 1;
        Ok(Some(new_part))
    }
}

/// Target of `to_part` as seen from `from_part`: relative when it lives at
/// or below the source's directory, absolute otherwise.
fn relative_target(from_part: &str, to_part: &str) -> String {
    let dir = from_part.rsplit_once('/').map_or("", |(dir, _)| dir);
    if dir.is_empty() {
        return to_part.to_string();
    }
    match to_part
        .strip_prefix(dir)
        .and_then(|rest| rest.strip_prefix('/'))
    {
        Some(rest) => rest.to_string(),
        None => format!("/{to_part}"),
    }
}

/// Characters XML 1.0 cannot carry.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
}

/// One run holding `text`.
fn run_markup(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut out = String::from("<w:r>");
    let mut pending = String::new();
    let flush = |pending: &mut String, out: &mut String| {
        if !pending.is_empty() {
            out.push_str(&format!(
                r#"<w:t xml:space="preserve">{}</w:t>"#,
                escape_text(pending)
            ));
            pending.clear();
        }
    };

    let mut chars = text.chars().filter(|&c| is_xml_char(c)).peekable();
    while let Some(c) = chars.next() {
        match c {
            '\t' => {
                flush(&mut pending, &mut out);
                out.push_str("<w:tab/>");
            }
            '\n' | '\r' => {
                // A CRLF pair is one break.
                if c == '\r' {
                    chars.next_if_eq(&'\n');
                }
                flush(&mut pending, &mut out);
                out.push_str("<w:br/>");
            }
            c => pending.push(c),
        }
    }
    flush(&mut pending, &mut out);
    out.push_str("</w:r>");
    out
}

fn picture_markup(rel_id: &str, drawing_id: u32, file_name: &str, extent: Extent) -> String {
    let Extent { cx, cy } = extent;
    let name = escape_text(file_name);
    format!(
        concat!(
            r#"<w:p><w:r><w:drawing>"#,
            r#"<wp:inline distT="0" distB="0" distL="0" distR="0">"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
            r#"<wp:docPr id="{id}" name="Picture {id}"/>"#,
            r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
            r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
            r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="0" name="{name}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic>"#,
            r#"</a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#
        ),
        cx = cx,
        cy = cy,
        id = drawing_id,
        name = name,
        rel = rel_id,
    )
}
