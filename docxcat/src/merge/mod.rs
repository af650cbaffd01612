//! Document merging.
//!
//! This module provides the core merge functionality:
//! - Concatenation of inputs behind per-input headings
//! - Verbatim or plain-text content
//! - Image re-embedding at a fixed width
//! - Core properties of the output
//! - Read-only previews of inputs
//!
//! # Examples
//!
//! ```no_run
//! use docxcat::merge::Merger;
//! use docxcat::config::Config;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     inputs: vec![PathBuf::from("a.docx"), PathBuf::from("b.docx")],
//!     output: PathBuf::from("merged.docx"),
//!     ..Default::default()
//! };
//!
//! let merger = Merger::new();
//! let result = merger.merge(&config).await?;
//! println!("Merged {} documents", result.statistics.files_merged);
//! # Ok(())
//! # }
//! ```

pub mod merger;
pub mod metadata;
pub mod preview;

pub use merger::{MergeResult, MergeStatistics, Merger, NamedInput, SEPARATOR_WIDTH, merge_documents};
pub use metadata::MetadataManager;
pub use preview::{
    DocumentPreview, ImageInfo, PREVIEW_IMAGE_LIMIT, PreviewImage, extract_images,
    extract_preview, preview_images,
};

use crate::config::Config;
use crate::error::Result;

/// Merge the inputs of `config` and return the document bytes with
/// statistics.
///
/// Convenience function that creates a merger and performs the merge.
///
/// # Errors
///
/// Returns an error if any input cannot be loaded or merged.
///
/// # Examples
///
/// ```no_run
/// use docxcat::merge::merge_docx;
/// use docxcat::config::Config;
///
/// # async fn example(config: Config) -> Result<(), Box<dyn std::error::Error>> {
/// let (bytes, stats) = merge_docx(&config).await?;
/// println!("Created a {} byte document with {} images", bytes.len(), stats.images);
/// # Ok(())
/// # }
/// ```
pub async fn merge_docx(config: &Config) -> Result<(Vec<u8>, MergeStatistics)> {
    let merger = Merger::new();
    let result = merger.merge(config).await?;
    Ok((result.bytes, result.statistics))
}
