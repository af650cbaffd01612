//! Word document model.
//!
//! [`SourceDocument`] is a parsed input: its body elements, paragraphs,
//! relationships and images. [`DocumentBuilder`] is the output: a fresh
//! document that headings, paragraphs, copied elements and pictures are
//! appended to.

pub mod builder;
pub mod media;
pub mod source;
mod templates;

#[cfg(test)]
pub(crate) mod fixtures;

use serde::Serialize;

pub use builder::{BuildCounts, DocumentBuilder};
pub use media::{EmbeddedImage, Extent, PICTURE_WIDTH_EMU};
pub use source::{NumberingDefinitions, SourceDocument};

/// Counts describing one input document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    /// Display name.
    pub name: String,
    /// Size of the file in bytes.
    pub size: u64,
    /// Top-level paragraphs.
    pub paragraphs: usize,
    /// Top-level paragraphs with visible text.
    pub non_blank_paragraphs: usize,
    /// Top-level tables.
    pub tables: usize,
    /// Top-level body elements, section properties excluded.
    pub body_elements: usize,
    /// Embedded images.
    pub images: usize,
    /// Title from the core properties.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}
