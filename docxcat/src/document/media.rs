//! Embedded images and their placement size.

use image::{ImageFormat, ImageReader};
use serde::Serialize;
use std::io::Cursor;

/// English Metric Units per inch.
pub const EMU_PER_INCH: u64 = 914_400;

/// Width of every picture appended to a merged document: 6 inches.
pub const PICTURE_WIDTH_EMU: u64 = 6 * EMU_PER_INCH;

/// An image resource referenced from a document's relationship table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    /// Relationship id in the source document.
    pub relationship_id: String,
    /// Part name inside the source package.
    pub part_name: String,
    /// Declared content type, if any.
    pub content_type: Option<String>,
    /// Raw image bytes.
    pub data: Vec<u8>,
}

impl EmbeddedImage {
    /// File name of the part (`image1.png`).
    pub fn file_name(&self) -> &str {
        self.part_name
            .rsplit_once('/')
            .map_or(self.part_name.as_str(), |(_, f)| f)
    }

    /// Lower-cased extension of the part name, or one guessed from the bytes.
    pub fn extension(&self) -> String {
        match self.file_name().rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => ext.to_ascii_lowercase(),
            _ => guess_format(&self.data)
                .and_then(|f| f.extensions_str().first().copied())
                .unwrap_or("bin")
                .to_string(),
        }
    }

    /// Declared content type, or one derived from the bytes.
    pub fn mime_type(&self) -> String {
        self.content_type
            .clone()
            .or_else(|| guess_format(&self.data).map(|f| f.to_mime_type().to_string()))
            .unwrap_or_else(|| "application/octet-stream".to_string())
    }
}

/// Sniff the format of image bytes.
pub fn guess_format(data: &[u8]) -> Option<ImageFormat> {
    image::guess_format(data).ok()
}

/// Pixel dimensions read from the image header, without decoding pixels.
pub fn pixel_dimensions(data: &[u8]) -> Result<(u32, u32), String> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| e.to_string())?;
    if reader.format().is_none() {
        return Err("unrecognized image format".to_string());
    }
    let (width, height) = reader.into_dimensions().map_err(|e| e.to_string())?;
    if width == 0 || height == 0 {
        return Err(format!("image has zero size ({width}x{height})"));
    }
    Ok((width, height))
}

/// Rendered size of a picture in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Extent {
    /// Width in EMU.
    pub cx: u64,
    /// Height in EMU.
    pub cy: u64,
}

impl Extent {
    /// Scale pixel dimensions to a fixed width, keeping the aspect ratio.
    pub fn scaled_to_width((px_width, px_height): (u32, u32), width_emu: u64) -> Self {
        let cy = (f64::from(px_height) * width_emu as f64 / f64::from(px_width.max(1))).round();
        Self {
            cx: width_emu,
            cy: cy as u64,
        }
    }
}
