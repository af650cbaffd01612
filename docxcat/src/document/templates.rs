//! Fixed markup of a freshly created document.

use crate::package::xml::{RootNamespaces, ns};

pub(crate) const XML_DECLARATION: &str =
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Namespaces declared on the root of a new main document part.
pub(crate) fn document_namespaces() -> RootNamespaces {
    let mut namespaces = RootNamespaces::new([
        (
            "wpc",
            "http://schemas.microsoft.com/office/word/2010/wordprocessingCanvas",
        ),
        ("mc", ns::MC),
        ("o", "urn:schemas-microsoft-com:office:office"),
        ("r", ns::R),
        (
            "m",
            "http://schemas.openxmlformats.org/officeDocument/2006/math",
        ),
        ("v", "urn:schemas-microsoft-com:vml"),
        (
            "wp14",
            "http://schemas.microsoft.com/office/word/2010/wordprocessingDrawing",
        ),
        (
            "wp",
            "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing",
        ),
        ("w10", "urn:schemas-microsoft-com:office:word"),
        ("w", ns::W),
        ("w14", "http://schemas.microsoft.com/office/word/2010/wordml"),
        ("w15", "http://schemas.microsoft.com/office/word/2012/wordml"),
        (
            "wpg",
            "http://schemas.microsoft.com/office/word/2010/wordprocessingGroup",
        ),
        (
            "wpi",
            "http://schemas.microsoft.com/office/word/2010/wordprocessingInk",
        ),
        ("wne", "http://schemas.microsoft.com/office/word/2006/wordml"),
        (
            "wps",
            "http://schemas.microsoft.com/office/word/2010/wordprocessingShape",
        ),
        ("a", "http://schemas.openxmlformats.org/drawingml/2006/main"),
        (
            "pic",
            "http://schemas.openxmlformats.org/drawingml/2006/picture",
        ),
    ]);
    for prefix in ["w14", "w15", "wp14"] {
        namespaces.add_ignorable(prefix);
    }
    namespaces
}

/// Namespaces declared on the root of a new style definitions part.
pub(crate) fn styles_namespaces() -> RootNamespaces {
    let mut namespaces = RootNamespaces::new([
        ("mc", ns::MC),
        ("r", ns::R),
        ("w", ns::W),
        ("w14", "http://schemas.microsoft.com/office/word/2010/wordml"),
        ("w15", "http://schemas.microsoft.com/office/word/2012/wordml"),
    ]);
    for prefix in ["w14", "w15"] {
        namespaces.add_ignorable(prefix);
    }
    namespaces
}

/// Letter page, 1" top/bottom and 1.25" side margins.
pub(crate) const SECTION_PROPERTIES: &str = concat!(
    r#"<w:sectPr>"#,
    r#"<w:pgSz w:w="12240" w:h="15840"/>"#,
    r#"<w:pgMar w:top="1440" w:right="1800" w:bottom="1440" w:left="1800" w:header="720" w:footer="720" w:gutter="0"/>"#,
    r#"<w:cols w:space="720"/>"#,
    r#"<w:docGrid w:linePitch="360"/>"#,
    r#"</w:sectPr>"#
);

const DOC_DEFAULTS: &str = concat!(
    r#"<w:docDefaults>"#,
    r#"<w:rPrDefault><w:rPr>"#,
    r#"<w:rFonts w:asciiTheme="minorHAnsi" w:eastAsiaTheme="minorEastAsia" w:hAnsiTheme="minorHAnsi" w:cstheme="minorBidi"/>"#,
    r#"<w:sz w:val="22"/><w:szCs w:val="22"/><w:lang w:val="en-US" w:eastAsia="en-US" w:bidi="ar-SA"/>"#,
    r#"</w:rPr></w:rPrDefault>"#,
    r#"<w:pPrDefault><w:pPr><w:spacing w:after="200" w:line="276" w:lineRule="auto"/></w:pPr></w:pPrDefault>"#,
    r#"</w:docDefaults>"#
);

const BASE_STYLES: &str = concat!(
    r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal">"#,
    r#"<w:name w:val="Normal"/><w:qFormat/></w:style>"#,
    r#"<w:style w:type="character" w:default="1" w:styleId="DefaultParagraphFont">"#,
    r#"<w:name w:val="Default Paragraph Font"/><w:uiPriority w:val="1"/><w:semiHidden/><w:unhideWhenUsed/></w:style>"#,
    r#"<w:style w:type="table" w:default="1" w:styleId="TableNormal">"#,
    r#"<w:name w:val="Normal Table"/><w:uiPriority w:val="99"/><w:semiHidden/><w:unhideWhenUsed/>"#,
    r#"<w:tblPr><w:tblInd w:w="0" w:type="dxa"/><w:tblCellMar><w:top w:w="0" w:type="dxa"/>"#,
    r#"<w:left w:w="108" w:type="dxa"/><w:bottom w:w="0" w:type="dxa"/><w:right w:w="108" w:type="dxa"/>"#,
    r#"</w:tblCellMar></w:tblPr></w:style>"#,
    r#"<w:style w:type="numbering" w:default="1" w:styleId="NoList">"#,
    r#"<w:name w:val="No List"/><w:uiPriority w:val="99"/><w:semiHidden/><w:unhideWhenUsed/></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Title">"#,
    r#"<w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:uiPriority w:val="10"/><w:qFormat/>"#,
    r#"<w:pPr><w:spacing w:after="300" w:line="240" w:lineRule="auto"/><w:contextualSpacing/></w:pPr>"#,
    r#"<w:rPr><w:rFonts w:asciiTheme="majorHAnsi" w:hAnsiTheme="majorHAnsi"/><w:spacing w:val="5"/><w:kern w:val="28"/>"#,
    r#"<w:sz w:val="52"/><w:szCs w:val="52"/></w:rPr></w:style>"#
);

/// Font size in half-points for each heading level.
const HEADING_SIZES: [u32; 9] = [28, 26, 24, 22, 22, 22, 22, 20, 20];

/// Style ids defined by [`styles_body`].
pub(crate) fn base_style_ids() -> Vec<String> {
    let mut ids: Vec<String> = ["Normal", "DefaultParagraphFont", "TableNormal", "NoList", "Title"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    ids.extend((1..=HEADING_SIZES.len()).map(|level| format!("Heading{level}")));
    ids
}

/// Document defaults and style definitions of a new style part.
pub(crate) fn styles_body() -> String {
    let mut xml = String::from(DOC_DEFAULTS);
    xml.push_str(BASE_STYLES);

    for (i, size) in HEADING_SIZES.iter().enumerate() {
        let level = i + 1;
        let spacing_before = if level == 1 { 480 } else { 200 };
        xml.push_str(&format!(
            concat!(
                r#"<w:style w:type="paragraph" w:styleId="Heading{level}">"#,
                r#"<w:name w:val="heading {level}"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/>"#,
                r#"<w:uiPriority w:val="9"/><w:qFormat/>"#,
                r#"<w:pPr><w:keepNext/><w:keepLines/><w:spacing w:before="{before}" w:after="0"/><w:outlineLvl w:val="{outline}"/></w:pPr>"#,
                r#"<w:rPr><w:rFonts w:asciiTheme="majorHAnsi" w:hAnsiTheme="majorHAnsi"/><w:b/><w:bCs/>"#,
                r#"<w:sz w:val="{size}"/><w:szCs w:val="{size}"/></w:rPr></w:style>"#
            ),
            level = level,
            before = spacing_before,
            outline = i,
            size = size,
        ));
    }
    xml
}

pub(crate) const SETTINGS: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<w:settings xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    r#"<w:defaultTabStop w:val="720"/>"#,
    r#"<w:characterSpacingControl w:val="doNotCompress"/>"#,
    r#"<w:compat><w:compatSetting w:name="compatibilityMode" w:uri="http://schemas.microsoft.com/office/word" w:val="15"/></w:compat>"#,
    r#"</w:settings>"#
);

pub(crate) const APP_PROPERTIES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" "#,
    r#"xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#,
    r#"<Application>docxcat</Application>"#,
    r#"</Properties>"#
);
