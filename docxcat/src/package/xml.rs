//! Streaming XML helpers for WordprocessingML parts.
//!
//! Body markup is never re-serialized through a DOM. Top-level body
//! elements are sliced out of the source text byte for byte, and the only
//! rewriting ever done (relationship ids, drawing ids) replaces single
//! start tags in place.

use anyhow::{Context, Result, bail};
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};

/// Well-known namespace URIs.
pub mod ns {
    /// WordprocessingML main namespace.
    pub const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
    /// Office document relationships namespace (`r:` attributes).
    pub const R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
    /// Markup compatibility namespace (`mc:Ignorable`).
    pub const MC: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";
    /// Package relationships namespace.
    pub const PACKAGE_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
    /// Content types namespace.
    pub const CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
}

/// Strip a UTF-8 byte order mark and decode a part as text.
pub fn part_text(bytes: &[u8]) -> Result<&str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    std::str::from_utf8(bytes).context("part is not valid UTF-8")
}

/// Escape a string for use in element text or attribute values.
pub fn escape_text(text: &str) -> String {
    escape(text).into_owned()
}

/// Look up an attribute by its qualified or local name and return its
/// unescaped value.
pub fn attribute(element: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.context("malformed attribute")?;
        let key = attr.key.as_ref();
        let local = attr.key.local_name();
        if key == name.as_bytes() || local.as_ref() == name.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Namespace declarations and ignorable prefixes found on a part's root
/// element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootNamespaces {
    declarations: Vec<(String, String)>,
    ignorable: Vec<String>,
}

impl RootNamespaces {
    /// Build from `(prefix, uri)` pairs.
    pub fn new<I, P, U>(declarations: I) -> Self
    where
        I: IntoIterator<Item = (P, U)>,
        P: Into<String>,
        U: Into<String>,
    {
        Self {
            declarations: declarations
                .into_iter()
                .map(|(p, u)| (p.into(), u.into()))
                .collect(),
            ignorable: Vec::new(),
        }
    }

    /// Read the declarations from a root start tag.
    pub fn from_element(element: &BytesStart<'_>) -> Result<Self> {
        let mut namespaces = Self::default();
        let mut ignorable = None;

        for attr in element.attributes() {
            let attr = attr.context("malformed attribute on root element")?;
            let key = std::str::from_utf8(attr.key.as_ref())?;
            let value = attr.unescape_value()?.into_owned();

            if let Some(prefix) = key.strip_prefix("xmlns:") {
                namespaces.declarations.push((prefix.to_string(), value));
            } else if key == "xmlns" {
                namespaces.declarations.push((String::new(), value));
            } else if attr.key.local_name().as_ref() == b"Ignorable" {
                ignorable = Some(value);
            }
        }

        if let Some(ignorable) = ignorable {
            namespaces.ignorable = ignorable.split_whitespace().map(str::to_string).collect();
        }

        Ok(namespaces)
    }

    /// URI bound to `prefix`, if declared.
    pub fn uri(&self, prefix: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, u)| u.as_str())
    }

    /// All prefixes bound to `uri`.
    pub fn prefixes_for(&self, uri: &str) -> Vec<String> {
        self.declarations
            .iter()
            .filter(|(_, u)| u == uri)
            .map(|(p, _)| p.clone())
            .collect()
    }

    /// Mark a declared prefix as ignorable.
    pub fn add_ignorable(&mut self, prefix: &str) {
        if !self.ignorable.iter().any(|p| p == prefix) {
            self.ignorable.push(prefix.to_string());
        }
    }

    /// Merge declarations from another root.
    ///
    /// A prefix already bound here keeps its binding; a conflicting binding
    /// from `other` is dropped and reported. Ignorable prefixes are merged
    /// when the prefix ends up declared with the same URI.
    pub fn merge(&mut self, other: &RootNamespaces) {
        for (prefix, uri) in &other.declarations {
            match self.uri(prefix) {
                Some(existing) if existing == uri => {}
                Some(existing) => {
                    tracing::warn!(
                        prefix = prefix.as_str(),
                        kept = existing,
                        dropped = uri.as_str(),
                        "conflicting namespace prefix"
                    );
                }
                None => self.declarations.push((prefix.clone(), uri.clone())),
            }
        }

        for prefix in &other.ignorable {
            if self.uri(prefix) == other.uri(prefix) && self.uri(prefix).is_some() {
                self.add_ignorable(prefix);
            }
        }
    }

    /// Render as attributes for a root start tag, leading space included.
    pub fn to_attributes(&self) -> String {
        let mut out = String::new();
        for (prefix, uri) in &self.declarations {
            if prefix.is_empty() {
                out.push_str(&format!(" xmlns=\"{}\"", escape_text(uri)));
            } else {
                out.push_str(&format!(" xmlns:{prefix}=\"{}\"", escape_text(uri)));
            }
        }

        let mc_prefix = self.prefixes_for(ns::MC).into_iter().next();
        if let Some(mc) = mc_prefix
            && !self.ignorable.is_empty()
        {
            out.push_str(&format!(" {mc}:Ignorable=\"{}\"", self.ignorable.join(" ")));
        }
        out
    }
}

/// Classification of a top-level body element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyElementKind {
    /// A paragraph, with its plain text.
    Paragraph {
        /// Text of the paragraph's runs.
        text: String,
    },
    /// A table.
    Table,
    /// Final section properties of the body.
    SectionProperties,
    /// Any other body-level element (structured document tags, bookmarks, ...).
    Other {
        /// Local name of the element.
        name: String,
    },
}

/// One top-level child of `w:body`, with its verbatim markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyElement {
    /// What kind of element this is.
    pub kind: BodyElementKind,
    /// The element's markup exactly as it appears in the source part.
    pub markup: String,
}

impl BodyElement {
    /// Paragraph text, if this element is a paragraph.
    pub fn paragraph_text(&self) -> Option<&str> {
        match &self.kind {
            BodyElementKind::Paragraph { text } => Some(text),
            _ => None,
        }
    }
}

/// The root namespaces and the top-level body elements of a document part.
#[derive(Debug, Clone)]
pub struct BodyScan {
    /// Namespace declarations of the `w:document` element.
    pub namespaces: RootNamespaces,
    /// Children of `w:body`, in document order.
    pub elements: Vec<BodyElement>,
}

/// Characters a run-level element contributes to paragraph text. Only
/// text-wrapping breaks count as line breaks; page and column breaks add
/// nothing.
fn run_child_text(element: &BytesStart<'_>) -> Result<Option<&'static str>> {
    Ok(match element.local_name().as_ref() {
        b"tab" | b"ptab" => Some("\t"),
        b"cr" => Some("\n"),
        b"br" => match attribute(element, "type")?.as_deref() {
            None | Some("textWrapping") => Some("\n"),
            Some(_) => None,
        },
        b"noBreakHyphen" => Some("-"),
        _ => None,
    })
}

/// True when `path` (local names below the paragraph) is a run, either
/// directly in the paragraph or inside a hyperlink.
fn is_run_path(path: &[Vec<u8>]) -> bool {
    match path {
        [r] => r == b"r",
        [h, r] => h == b"hyperlink" && r == b"r",
        _ => false,
    }
}

/// Scan a main document part.
pub fn scan_body(xml: &str) -> Result<BodyScan> {
    let mut reader = Reader::from_str(xml);

    let mut namespaces = None;
    let mut elements = Vec::new();
    let mut depth = 0usize;
    let mut in_body = false;
    let mut saw_body = false;

    // State for the body-level element currently being read.
    let mut element_start = 0usize;
    let mut element_local: Vec<u8> = Vec::new();
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut text = String::new();

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .with_context(|| format!("XML error at byte {before}"))?;
        let after = reader.buffer_position() as usize;

        match event {
            Event::Start(e) => {
                let local = e.local_name().as_ref().to_vec();
                match depth {
                    0 => {
                        if local != b"document" {
                            bail!(
                                "root element is <{}>, expected <w:document>",
                                String::from_utf8_lossy(e.name().as_ref())
                            );
                        }
                        namespaces = Some(RootNamespaces::from_element(&e)?);
                    }
                    1 if local == b"body" => {
                        in_body = true;
                        saw_body = true;
                    }
                    2 if in_body => {
                        element_start = before;
                        element_local = local;
                        path.clear();
                        text.clear();
                    }
                    d if in_body && d > 2 => {
                        if element_local == b"p" {
                            path.push(local);
                        }
                    }
                    _ => {}
                }
                depth += 1;
            }
            Event::Empty(e) => {
                let local = e.local_name().as_ref().to_vec();
                match depth {
                    0 => bail!("document root element is empty"),
                    1 if local == b"body" => saw_body = true,
                    2 if in_body => {
                        elements.push(classify(&local, String::new(), &xml[before..after]));
                    }
                    d if in_body && d > 2 && element_local == b"p" => {
                        if is_run_path(&path)
                            && let Some(chars) = run_child_text(&e)?
                        {
                            text.push_str(chars);
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(t) => {
                if in_body
                    && element_local == b"p"
                    && path.last().is_some_and(|l| l == b"t")
                    && is_run_path(&path[..path.len() - 1])
                {
                    text.push_str(&t.unescape().context("bad text escape")?);
                }
            }
            Event::CData(t) => {
                if in_body
                    && element_local == b"p"
                    && path.last().is_some_and(|l| l == b"t")
                    && is_run_path(&path[..path.len() - 1])
                {
                    text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Event::End(_) => {
                depth = depth.checked_sub(1).context("unbalanced end tag")?;
                match depth {
                    1 if in_body => in_body = false,
                    2 if in_body => {
                        let markup = &xml[element_start..after];
                        elements.push(classify(&element_local, std::mem::take(&mut text), markup));
                        element_local.clear();
                    }
                    d if in_body && d > 2 && element_local == b"p" => {
                        path.pop();
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if depth != 0 {
        bail!("document part ended with {depth} unclosed element(s)");
    }
    let namespaces = namespaces.context("document part has no root element")?;
    if !saw_body {
        bail!("document part has no <w:body>");
    }

    Ok(BodyScan {
        namespaces,
        elements,
    })
}

fn classify(local: &[u8], text: String, markup: &str) -> BodyElement {
    let kind = match local {
        b"p" => BodyElementKind::Paragraph { text },
        b"tbl" => BodyElementKind::Table,
        b"sectPr" => BodyElementKind::SectionProperties,
        other => BodyElementKind::Other {
            name: String::from_utf8_lossy(other).into_owned(),
        },
    };
    BodyElement {
        kind,
        markup: markup.to_string(),
    }
}

/// A top-level child of a part's root element, keyed by one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedElement {
    /// Value of the key attribute.
    pub key: String,
    /// Verbatim markup.
    pub markup: String,
}

/// Scan the root of a part and return its namespaces and every direct
/// child named `child` that carries the attribute `key`.
pub fn scan_keyed_children(
    xml: &str,
    child: &[u8],
    key: &str,
) -> Result<(RootNamespaces, Vec<KeyedElement>)> {
    let mut reader = Reader::from_str(xml);
    let mut namespaces = RootNamespaces::default();
    let mut found = Vec::new();
    let mut depth = 0usize;
    let mut current: Option<(usize, String)> = None;

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader
            .read_event()
            .with_context(|| format!("XML error at byte {before}"))?;
        let after = reader.buffer_position() as usize;

        match event {
            Event::Start(e) => {
                if depth == 0 {
                    namespaces = RootNamespaces::from_element(&e)?;
                } else if depth == 1 && e.local_name().as_ref() == child {
                    current = attribute(&e, key)?.map(|k| (before, k));
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if depth == 1
                    && e.local_name().as_ref() == child
                    && let Some(k) = attribute(&e, key)?
                {
                    found.push(KeyedElement {
                        key: k,
                        markup: xml[before..after].to_string(),
                    });
                }
            }
            Event::End(_) => {
                depth = depth.checked_sub(1).context("unbalanced end tag")?;
                if depth == 1
                    && let Some((start, k)) = current.take()
                {
                    found.push(KeyedElement {
                        key: k,
                        markup: xml[start..after].to_string(),
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok((namespaces, found))
}

/// Rewrites applied to copied markup.
pub trait FragmentRewriter {
    /// Map a relationship id of the source part to one of the output part.
    /// `None` leaves the attribute untouched.
    fn relationship(&mut self, id: &str) -> crate::Result<Option<String>>;

    /// Next unique drawing object id.
    fn drawing_id(&mut self) -> u32;

    /// Map a list instance id (`w:numId`). `None` leaves it untouched.
    fn numbering_id(&mut self, _id: &str) -> Option<String> {
        None
    }

    /// Map an abstract list definition id (`w:abstractNumId`).
    fn abstract_numbering_id(&mut self, _id: &str) -> Option<String> {
        None
    }
}

/// Rewrite relationship references (attributes in any of `r_prefixes`),
/// drawing ids (`docPr/@id`) and list numbering ids in a markup fragment.
///
/// Tags that need no change are copied verbatim.
pub fn rewrite_fragment(
    markup: &str,
    r_prefixes: &[String],
    rewriter: &mut dyn FragmentRewriter,
) -> crate::Result<String> {
    let mut reader = Reader::from_str(markup);
    let mut out = String::with_capacity(markup.len());
    let mut copied_to = 0usize;

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|e| {
            crate::DocxCatError::other(format!("XML error in copied markup at byte {before}: {e}"))
        })?;
        let after = reader.buffer_position() as usize;

        let (element, empty) = match event {
            Event::Start(e) => (e, false),
            Event::Empty(e) => (e, true),
            Event::Eof => break,
            _ => continue,
        };

        if let Some(tag) = rewrite_tag(&element, empty, r_prefixes, rewriter)? {
            out.push_str(&markup[copied_to..before]);
            out.push_str(&tag);
            copied_to = after;
        }
    }

    out.push_str(&markup[copied_to..]);
    Ok(out)
}

fn rewrite_tag(
    element: &BytesStart<'_>,
    empty: bool,
    r_prefixes: &[String],
    rewriter: &mut dyn FragmentRewriter,
) -> crate::Result<Option<String>> {
    let local = element.local_name();
    let element_local = local.as_ref();
    let is_doc_pr = element_local == b"docPr";
    let mut changed = false;
    let mut attrs = Vec::new();

    for attr in element.attributes() {
        let attr = attr.map_err(|e| crate::DocxCatError::other(format!("malformed attribute: {e}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| crate::DocxCatError::other(format!("bad attribute value: {e}")))?
            .into_owned();

        let prefix = attr
            .key
            .prefix()
            .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned());

        let new_value = if prefix.is_some_and(|p| r_prefixes.contains(&p)) {
            rewriter.relationship(&value)?
        } else if is_doc_pr && key == "id" {
            Some(rewriter.drawing_id().to_string())
        } else {
            match (element_local, attr.key.local_name().as_ref()) {
                (b"numId", b"val") | (b"num", b"numId") => rewriter.numbering_id(&value),
                (b"abstractNumId", b"val") | (b"abstractNum", b"abstractNumId") => {
                    rewriter.abstract_numbering_id(&value)
                }
                _ => None,
            }
        };

        match new_value {
            Some(v) if v != value => {
                changed = true;
                attrs.push((key, v));
            }
            _ => attrs.push((key, value)),
        }
    }

    if !changed {
        return Ok(None);
    }

    let mut tag = format!("<{}", String::from_utf8_lossy(element.name().as_ref()));
    for (key, value) in attrs {
        tag.push_str(&format!(" {key}=\"{}\"", escape_text(&value)));
    }
    tag.push_str(if empty { "/>" } else { ">" });
    Ok(Some(tag))
}
