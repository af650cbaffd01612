//! Small in-memory documents for unit tests.

use crate::package::content_types::{self, ContentTypes};
use crate::package::relationships::{self, Relationships};
use crate::package::xml::escape_text;
use crate::package::{CONTENT_TYPES_PART, PackageWriter};
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// A solid-colour PNG.
pub(crate) fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 120, 200]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

#[derive(Default)]
pub(crate) struct FixtureDocx {
    body: Vec<String>,
    rels: Relationships,
    media: Vec<(String, Vec<u8>)>,
    styles: Vec<String>,
    abstract_nums: Vec<String>,
    nums: Vec<String>,
}

impl FixtureDocx {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn paragraph(mut self, text: &str) -> Self {
        self.body.push(format!(
            "<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
            escape_text(text)
        ));
        self
    }

    pub(crate) fn raw(mut self, markup: &str) -> Self {
        self.body.push(markup.to_string());
        self
    }

    pub(crate) fn picture(mut self, data: Vec<u8>) -> Self {
        let n = self.media.len() + 1;
        let target = format!("media/image{n}.png");
        let id = self.rels.add(relationships::IMAGE, &target, false);
        self.media.push((format!("word/{target}"), data));
        self.body.push(format!(
            concat!(
                r#"<w:p><w:r><w:drawing><wp:inline><wp:extent cx="914400" cy="914400"/>"#,
                r#"<wp:docPr id="1" name="Picture 1"/><a:graphic><a:graphicData uri="pic">"#,
                r#"<pic:pic><pic:blipFill><a:blip r:embed="{id}"/></pic:blipFill></pic:pic>"#,
                r#"</a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#
            ),
            id = id
        ));
        self
    }

    pub(crate) fn image_part(mut self, data: Vec<u8>) -> Self {
        let n = self.media.len() + 1;
        let target = format!("media/image{n}.png");
        self.rels.add(relationships::IMAGE, &target, false);
        self.media.push((format!("word/{target}"), data));
        self
    }

    pub(crate) fn external_image(mut self, url: &str) -> Self {
        self.rels.add(relationships::IMAGE, url, true);
        self
    }

    pub(crate) fn hyperlink(mut self, text: &str, url: &str) -> Self {
        let id = self.rels.add(
            "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink",
            url,
            true,
        );
        self.body.push(format!(
            r#"<w:p><w:hyperlink r:id="{id}"><w:r><w:t>{}</w:t></w:r></w:hyperlink></w:p>"#,
            escape_text(text)
        ));
        self
    }

    pub(crate) fn style(mut self, id: &str, kind: &str) -> Self {
        self.styles.push(format!(
            r#"<w:style w:type="{kind}" w:styleId="{id}"><w:name w:val="{id}"/></w:style>"#
        ));
        self
    }

    /// A bullet list definition `abstract_id` with one instance `num_id`.
    pub(crate) fn numbering(mut self, abstract_id: &str, num_id: &str) -> Self {
        self.abstract_nums.push(format!(
            concat!(
                r#"<w:abstractNum w:abstractNumId="{a}"><w:nsid w:val="0000000{a}"/>"#,
                r#"<w:lvl w:ilvl="0"><w:start w:val="1"/><w:numFmt w:val="bullet"/>"#,
                r#"<w:lvlText w:val="-"/></w:lvl></w:abstractNum>"#
            ),
            a = abstract_id
        ));
        self.nums.push(format!(
            r#"<w:num w:numId="{num_id}"><w:abstractNumId w:val="{abstract_id}"/></w:num>"#
        ));
        self
    }

    pub(crate) fn list_item(mut self, num_id: &str, text: &str) -> Self {
        self.body.push(format!(
            concat!(
                r#"<w:p><w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="{}"/></w:numPr></w:pPr>"#,
                r#"<w:r><w:t>{}</w:t></w:r></w:p>"#
            ),
            num_id,
            escape_text(text)
        ));
        self
    }

    pub(crate) fn build(mut self) -> Vec<u8> {
        let mut writer = PackageWriter::new();
        let mut types = ContentTypes::new();
        types.add_default("png", "image/png");
        types.add_override("word/document.xml", content_types::DOCUMENT_MAIN);

        if !self.styles.is_empty() {
            self.rels.add(relationships::STYLES, "styles.xml", false);
            types.add_override("word/styles.xml", content_types::STYLES);
            writer.add_part(
                "word/styles.xml",
                format!(
                    r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">{}</w:styles>"#,
                    self.styles.concat()
                ),
            );
        }
        if !self.nums.is_empty() {
            self.rels.add(relationships::NUMBERING, "numbering.xml", false);
            types.add_override("word/numbering.xml", content_types::NUMBERING);
            writer.add_part(
                "word/numbering.xml",
                format!(
                    r#"<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">{}{}</w:numbering>"#,
                    self.abstract_nums.concat(),
                    self.nums.concat()
                ),
            );
        }
        writer.add_part(CONTENT_TYPES_PART, types.to_xml());

        let mut package_rels = Relationships::new();
        package_rels.add(relationships::OFFICE_DOCUMENT, "word/document.xml", false);
        writer.add_part("_rels/.rels", package_rels.to_xml());

        writer.add_part(
            "word/document.xml",
            format!(
                concat!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                    r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
                    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
                    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
                    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
                    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                    r#"<w:body>{}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#
                ),
                self.body.concat()
            ),
        );
        writer.add_part("word/_rels/document.xml.rels", self.rels.to_xml());
        for (name, data) in self.media {
            writer.add_part(name, data);
        }
        writer.finish().unwrap()
    }
}
