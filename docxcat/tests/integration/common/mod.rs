//! Shared helpers: an in-memory `.docx` builder and output inspection.

#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use std::path::PathBuf;
use tempfile::TempDir;
use zip::ZipArchive;
use zip::write::{SimpleFileOptions, ZipWriter};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const IMAGE_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
const HYPERLINK_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
const STYLES_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";

/// A solid-colour PNG of the given size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Builder for small word-processing documents.
#[derive(Default)]
pub struct Docx {
    body: Vec<String>,
    rels: Vec<(String, String, String, bool)>,
    media: Vec<(String, Vec<u8>)>,
    styles: Vec<String>,
    title: Option<String>,
}

impl Docx {
    pub fn new() -> Self {
        Self::default()
    }

    fn add_rel(&mut self, rel_type: &str, target: &str, external: bool) -> String {
        let id = format!("rId{}", self.rels.len() + 1);
        self.rels
            .push((id.clone(), rel_type.to_string(), target.to_string(), external));
        id
    }

    pub fn paragraph(mut self, text: &str) -> Self {
        self.body.push(format!(
            r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
            escape(text)
        ));
        self
    }

    pub fn bold(mut self, text: &str) -> Self {
        self.body.push(format!(
            r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>{}</w:t></w:r></w:p>"#,
            escape(text)
        ));
        self
    }

    pub fn styled(mut self, style: &str, text: &str) -> Self {
        self.body.push(format!(
            r#"<w:p><w:pPr><w:pStyle w:val="{style}"/></w:pPr><w:r><w:t>{}</w:t></w:r></w:p>"#,
            escape(text)
        ));
        self
    }

    pub fn table(mut self, cell: &str) -> Self {
        self.body.push(format!(
            r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
            escape(cell)
        ));
        self
    }

    /// An image part with a relationship but no drawing in the body.
    pub fn image(mut self, data: Vec<u8>) -> Self {
        let target = format!("media/image{}.png", self.media.len() + 1);
        self.add_rel(IMAGE_REL, &target, false);
        self.media.push((format!("word/{target}"), data));
        self
    }

    /// An image part shown inline in the body.
    pub fn inline_image(mut self, data: Vec<u8>) -> Self {
        let target = format!("media/image{}.png", self.media.len() + 1);
        let id = self.add_rel(IMAGE_REL, &target, false);
        self.media.push((format!("word/{target}"), data));
        self.body.push(format!(
            concat!(
                r#"<w:p><w:r><w:drawing><wp:inline><wp:extent cx="914400" cy="914400"/>"#,
                r#"<wp:docPr id="1" name="Picture 1"/><a:graphic><a:graphicData uri="x">"#,
                r#"<pic:pic><pic:blipFill><a:blip r:embed="{}"/></pic:blipFill></pic:pic>"#,
                r#"</a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#
            ),
            id
        ));
        self
    }

    pub fn hyperlink(mut self, text: &str, url: &str) -> Self {
        let id = self.add_rel(HYPERLINK_REL, url, true);
        self.body.push(format!(
            r#"<w:p><w:hyperlink r:id="{id}"><w:r><w:t>{}</w:t></w:r></w:hyperlink></w:p>"#,
            escape(text)
        ));
        self
    }

    pub fn style(mut self, id: &str) -> Self {
        self.styles.push(format!(
            r#"<w:style w:type="paragraph" w:styleId="{id}"><w:name w:val="{id}"/><w:rPr><w:i/></w:rPr></w:style>"#
        ));
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        if !self.styles.is_empty() {
            self.add_rel(STYLES_REL, "styles.xml", false);
        }

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        let mut put = |name: &str, data: &[u8]| {
            zip.start_file(name, options).expect("start file");
            zip.write_all(data).expect("write part");
        };

        let mut types = String::from(concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Default Extension="png" ContentType="image/png"/>"#,
            r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
        ));
        if !self.styles.is_empty() {
            types.push_str(r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#);
        }
        if self.title.is_some() {
            types.push_str(r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#);
        }
        types.push_str("</Types>");
        put("[Content_Types].xml", types.as_bytes());

        let mut package_rels = String::from(concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
        ));
        if let Some(title) = &self.title {
            package_rels.push_str(r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#);
            put(
                "docProps/core.xml",
                format!(
                    concat!(
                        r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                        r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
                        r#"xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>{}</dc:title></cp:coreProperties>"#
                    ),
                    escape(title)
                )
                .as_bytes(),
            );
        }
        package_rels.push_str("</Relationships>");
        put("_rels/.rels", package_rels.as_bytes());

        let document = format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<w:document xmlns:w="{w}" xmlns:r="{r}" "#,
                r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
                r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
                r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<w:body>{body}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#
            ),
            w = W_NS,
            r = R_NS,
            body = self.body.concat()
        );
        put("word/document.xml", document.as_bytes());

        let mut rels = String::from(concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#
        ));
        for (id, rel_type, target, external) in &self.rels {
            let mode = if *external { r#" TargetMode="External""# } else { "" };
            rels.push_str(&format!(
                r#"<Relationship Id="{id}" Type="{rel_type}" Target="{}"{mode}/>"#,
                escape(target)
            ));
        }
        rels.push_str("</Relationships>");
        put("word/_rels/document.xml.rels", rels.as_bytes());

        if !self.styles.is_empty() {
            let styles = format!(r#"<w:styles xmlns:w="{W_NS}">{}</w:styles>"#, self.styles.concat());
            put("word/styles.xml", styles.as_bytes());
        }
        for (name, data) in &self.media {
            put(name, data);
        }

        zip.finish().expect("finish zip").into_inner()
    }
}

/// Text of a part of a package.
pub fn part(package: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(package)).expect("open zip");
    let mut file = archive.by_name(name).expect("part present");
    let mut text = String::new();
    file.read_to_string(&mut text).expect("utf-8 part");
    text
}

/// Names of every part of a package.
pub fn part_names(package: &[u8]) -> Vec<String> {
    let archive = ZipArchive::new(Cursor::new(package)).expect("open zip");
    archive.file_names().map(str::to_string).collect()
}

/// Non-overlapping occurrences of `needle` in `haystack`.
pub fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

/// Write documents into a fresh temp dir and return their paths.
pub fn write_inputs(dir: &TempDir, docs: Vec<(&str, Vec<u8>)>) -> Vec<PathBuf> {
    docs.into_iter()
        .map(|(name, bytes)| {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("create dir");
            }
            std::fs::write(&path, bytes).expect("write input");
            path
        })
        .collect()
}
