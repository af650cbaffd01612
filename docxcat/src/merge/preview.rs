//! Read-only previews of input documents.
//!
//! Nothing here mutates its input; the same helpers back the CLI preview
//! selector and the image pass of a merge.

use serde::Serialize;
use tracing::debug;

use crate::document::media::guess_format;
use crate::document::{DocumentSummary, SourceDocument};
use crate::error::{DocxCatError, Result};

/// Number of leading paragraphs a text preview considers.
pub const PREVIEW_PARAGRAPHS: usize = 5;

/// Default number of images decoded for a preview.
pub const PREVIEW_IMAGE_LIMIT: usize = 3;

const UNNAMED: &str = "document";

/// Text preview: the non-blank paragraphs among the first five top-level
/// paragraphs, joined with `\n`.
///
/// # Errors
///
/// Returns `MalformedInput` if the bytes are not a readable document.
///
/// # Examples
///
/// ```no_run
/// # fn example(bytes: &[u8]) -> docxcat::Result<()> {
/// let text = docxcat::merge::extract_preview(bytes)?;
/// println!("{text}");
/// # Ok(())
/// # }
/// ```
pub fn extract_preview(bytes: &[u8]) -> Result<String> {
    SourceDocument::parse(UNNAMED, bytes).map(|doc| preview_text(&doc))
}

/// Raw bytes of every embedded image, in relationship order.
pub fn extract_images(bytes: &[u8]) -> Result<Vec<Vec<u8>>> {
    let doc = SourceDocument::parse(UNNAMED, bytes)?;
    Ok(doc.images().into_iter().map(|image| image.data).collect())
}

/// Decode up to `limit` embedded images.
///
/// A failure to decode one image is recorded in its entry and does not stop
/// the others.
pub fn preview_images(bytes: &[u8], limit: usize) -> Result<Vec<PreviewImage>> {
    let doc = SourceDocument::parse(UNNAMED, bytes)?;
    Ok(decode_images(&doc, limit))
}

fn preview_text(doc: &SourceDocument) -> String {
    doc.paragraphs()
        .take(PREVIEW_PARAGRAPHS)
        .filter(|text| !text.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_images(doc: &SourceDocument, limit: usize) -> Vec<PreviewImage> {
    doc.images()
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, image)| decode_image(i + 1, &image.data))
        .collect()
}

fn decode_image(index: usize, data: &[u8]) -> PreviewImage {
    match image::load_from_memory(data) {
        Ok(decoded) => PreviewImage::Decoded(ImageInfo {
            index,
            format: guess_format(data)
                .and_then(|f| f.extensions_str().first().copied())
                .unwrap_or("unknown")
                .to_string(),
            width: decoded.width(),
            height: decoded.height(),
            size: data.len(),
        }),
        Err(e) => {
            debug!(index, error = %e, "image preview failed");
            PreviewImage::Failed(DocxCatError::image_decode(index, e.to_string()))
        }
    }
}

/// A decoded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    /// 1-based position in the relationship table.
    pub index: usize,
    /// Format name (`png`, `jpg`, ...).
    pub format: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Size of the encoded image in bytes.
    pub size: usize,
}

/// Outcome of previewing one image.
#[derive(Debug)]
pub enum PreviewImage {
    /// The image decoded.
    Decoded(ImageInfo),
    /// The image could not be decoded; holds an `ImageDecode` error.
    Failed(DocxCatError),
}

impl PreviewImage {
    /// Whether the image decoded.
    pub fn is_decoded(&self) -> bool {
        matches!(self, Self::Decoded(_))
    }
}

/// Everything shown when previewing one input.
#[derive(Debug)]
pub struct DocumentPreview {
    /// Display name.
    pub name: String,
    /// Text preview.
    pub text: String,
    /// The first few images.
    pub images: Vec<PreviewImage>,
    /// Counts describing the document.
    pub summary: DocumentSummary,
}

impl DocumentPreview {
    /// Build a preview, decoding at most `image_limit` images.
    ///
    /// # Errors
    ///
    /// Returns `MalformedInput` naming the document if it cannot be parsed.
    pub fn from_bytes(name: &str, bytes: &[u8], image_limit: usize) -> Result<Self> {
        let doc = SourceDocument::parse(name, bytes)?;
        Ok(Self {
            name: name.to_string(),
            text: preview_text(&doc),
            images: decode_images(&doc, image_limit),
            summary: doc.summary(bytes.len() as u64),
        })
    }

    /// Images that failed to decode.
    pub fn failed_images(&self) -> impl Iterator<Item = &DocxCatError> {
        self.images.iter().filter_map(|image| match image {
            PreviewImage::Failed(err) => Some(err),
            PreviewImage::Decoded(_) => None,
        })
    }
}
