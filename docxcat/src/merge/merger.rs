//! Core merge implementation.
//!
//! Every input contributes, in caller order: a level-1 heading with its
//! display name, its content, its images, and a separator rule followed by
//! an empty paragraph.

use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::{Config, FileOrder, MergeOptions, Metadata};
use crate::document::media::{Extent, PICTURE_WIDTH_EMU, pixel_dimensions};
use crate::document::{BuildCounts, DocumentBuilder, SourceDocument};
use crate::error::{DocxCatError, Result};
use crate::io::{DocxReader, LoadedDocx};
use crate::utils::format_file_size;

/// Number of `=` characters in the rule that closes each input.
pub const SEPARATOR_WIDTH: usize = 50;

/// An input document: a display name and the raw file bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedInput {
    /// Display name, used for the heading.
    pub name: String,
    /// Contents of the `.docx` file.
    pub bytes: Vec<u8>,
}

impl NamedInput {
    /// Create an input.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Merge `inputs` into one document and return its bytes.
///
/// `progress`, when given, is called with `(completed, total)` after each
/// input has been appended. Any failure aborts the whole merge; no partial
/// output is produced.
///
/// # Errors
///
/// - `NoFilesToMerge` if `inputs` is empty
/// - `MalformedInput` naming the first input that cannot be parsed
/// - `UnsupportedImage` if an image's dimensions cannot be read while
///   images are preserved
/// - `OutputSerialization` if the result cannot be written
///
/// # Examples
///
/// ```no_run
/// use docxcat::config::MergeOptions;
/// use docxcat::merge::{NamedInput, merge_documents};
///
/// # fn example(a: Vec<u8>, b: Vec<u8>) -> docxcat::Result<()> {
/// let inputs = vec![NamedInput::new("a.docx", a), NamedInput::new("b.docx", b)];
/// let merged = merge_documents(&inputs, MergeOptions::default(), None)?;
/// std::fs::write("merged_document.docx", merged)?;
/// # Ok(())
/// # }
/// ```
pub fn merge_documents(
    inputs: &[NamedInput],
    options: MergeOptions,
    progress: Option<&mut dyn FnMut(usize, usize)>,
) -> Result<Vec<u8>> {
    build_merged(inputs, options, &Metadata::default(), progress).map(|(bytes, _)| bytes)
}

/// Merge and also report what went into the output.
pub(crate) fn build_merged(
    inputs: &[NamedInput],
    options: MergeOptions,
    metadata: &Metadata,
    mut progress: Option<&mut dyn FnMut(usize, usize)>,
) -> Result<(Vec<u8>, BuildCounts)> {
    if inputs.is_empty() {
        return Err(DocxCatError::NoFilesToMerge);
    }

    let total = inputs.len();
    let separator = "=".repeat(SEPARATOR_WIDTH);
    let mut builder = DocumentBuilder::new();
    builder.set_metadata(metadata.clone());

    for (i, input) in inputs.iter().enumerate() {
        let source = SourceDocument::parse(input.name.as_str(), &input.bytes)?;
        append_document(&mut builder, &source, options)?;

        builder.add_paragraph(&separator);
        builder.add_paragraph("");

        debug!(
            document = input.name.as_str(),
            position = i + 1,
            total,
            body = builder.body_len(),
            "appended document"
        );
        if let Some(report) = progress.as_deref_mut() {
            report(i + 1, total);
        }
    }

    let counts = builder.counts();
    let bytes = builder.finish()?;
    Ok((bytes, counts))
}

fn append_document(
    builder: &mut DocumentBuilder,
    source: &SourceDocument,
    options: MergeOptions,
) -> Result<()> {
    builder.add_heading(source.name(), 1);

    if options.preserve_styles {
        builder.import_numbering(source)?;
        builder.import_styles(source)?;
        builder.append_body(source)?;
    } else {
        for text in source.paragraphs().filter(|t| !t.trim().is_empty()) {
            builder.add_paragraph(text);
        }
    }

    if options.preserve_images {
        for (i, image) in source.images().iter().enumerate() {
            let dimensions = pixel_dimensions(&image.data).map_err(|reason| {
                DocxCatError::unsupported_image(source.name(), i + 1, reason)
            })?;
            let extent = Extent::scaled_to_width(dimensions, PICTURE_WIDTH_EMU);
            builder.add_source_picture(source, image, extent)?;
        }
    }

    Ok(())
}

/// Statistics about a merge.
#[derive(Debug, Clone)]
pub struct MergeStatistics {
    /// Number of documents merged.
    pub files_merged: usize,

    /// Headings added (one per document).
    pub headings: usize,

    /// Plain paragraphs added, separators included.
    pub paragraphs: usize,

    /// Body elements copied verbatim.
    pub elements: usize,

    /// Pictures appended.
    pub images: usize,

    /// Style definitions imported.
    pub styles_imported: usize,

    /// List instances imported.
    pub lists_imported: usize,

    /// Parts copied to satisfy relationships of copied content.
    pub parts_copied: usize,

    /// Total size of the inputs.
    pub input_size: u64,

    /// Size of the merged document.
    pub output_size: u64,

    /// Time taken to read the inputs.
    pub load_time: Duration,

    /// Time taken by the merge itself.
    pub merge_time: Duration,
}

impl MergeStatistics {
    /// Input size as a human-readable string.
    pub fn format_input_size(&self) -> String {
        format_file_size(self.input_size)
    }

    /// Output size as a human-readable string.
    pub fn format_output_size(&self) -> String {
        format_file_size(self.output_size)
    }
}

/// Result of a merge.
#[derive(Debug)]
pub struct MergeResult {
    /// The merged document.
    pub bytes: Vec<u8>,

    /// Statistics about the merge.
    pub statistics: MergeStatistics,

    /// Paths of the merged files, in merge order.
    pub merged_files: Vec<PathBuf>,

    /// Display names of the merged files, in merge order.
    pub merged_names: Vec<String>,
}

/// Loads, orders and merges the inputs of a [`Config`].
pub struct Merger {
    reader: DocxReader,
}

impl Merger {
    /// Create a merger.
    pub fn new() -> Self {
        Self {
            reader: DocxReader::new(),
        }
    }

    /// Load and order the inputs of `config`.
    ///
    /// # Errors
    ///
    /// Returns the first load error, or `InvalidOrder` if an order override
    /// names no input.
    pub async fn load_ordered(&self, config: &Config) -> Result<(Vec<LoadedDocx>, Duration)> {
        let (results, stats) = self
            .reader
            .load_all(&config.inputs, config.effective_jobs())
            .await;
        let loaded = results.into_iter().collect::<Result<Vec<_>>>()?;
        if loaded.is_empty() {
            return Err(DocxCatError::NoFilesToMerge);
        }

        let mut order = FileOrder::new(loaded.iter().map(|l| l.name.clone()));
        order.apply(&config.order)?;
        Ok((order.arrange(loaded), stats.total_time))
    }

    /// Merge the inputs of `config`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use docxcat::merge::Merger;
    /// # use docxcat::config::Config;
    /// # async fn example(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    /// let result = Merger::new().merge(&config).await?;
    /// println!("Merged {} files, {} images",
    ///          result.statistics.files_merged,
    ///          result.statistics.images);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn merge(&self, config: &Config) -> Result<MergeResult> {
        self.merge_with_progress(config, |_, _| {}).await
    }

    /// Merge, reporting `(completed, total)` after each document.
    ///
    /// The merge runs on a blocking thread; `on_progress` is called from it.
    pub async fn merge_with_progress<F>(&self, config: &Config, mut on_progress: F) -> Result<MergeResult>
    where
        F: FnMut(usize, usize) + Send + 'static,
    {
        let (loaded, load_time) = self.load_ordered(config).await?;

        let input_size = loaded.iter().map(|l| l.file_size).sum();
        let merged_files: Vec<PathBuf> = loaded.iter().map(|l| l.path.clone()).collect();
        let merged_names: Vec<String> = loaded.iter().map(|l| l.name.clone()).collect();
        let inputs: Vec<NamedInput> = loaded.into_iter().map(LoadedDocx::into_input).collect();
        let options = config.options;
        let metadata = config.metadata.clone();

        info!(files = inputs.len(), ?options, "merging documents");
        let merge_start = Instant::now();
        let (bytes, counts) = tokio::task::spawn_blocking(move || {
            build_merged(&inputs, options, &metadata, Some(&mut on_progress))
        })
        .await
        .map_err(|e| DocxCatError::other(format!("Merge task failed: {e}")))??;
        let merge_time = merge_start.elapsed();

        let statistics = MergeStatistics {
            files_merged: merged_files.len(),
            headings: counts.headings,
            paragraphs: counts.paragraphs,
            elements: counts.elements,
            images: counts.images,
            styles_imported: counts.styles_imported,
            lists_imported: counts.lists_imported,
            parts_copied: counts.parts_copied,
            input_size,
            output_size: bytes.len() as u64,
            load_time,
            merge_time,
        };

        Ok(MergeResult {
            bytes,
            statistics,
            merged_files,
            merged_names,
        })
    }
}

impl Default for Merger {
    fn default() -> Self {
        Self::new()
    }
}
