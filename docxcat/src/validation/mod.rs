//! Input validation for docxcat.
//!
//! Checks run before a merge:
//! - Inputs exist, are files and can be read
//! - Inputs parse as word-processing packages
//! - The output is not one of the inputs
//! - The output directory exists
//!
//! # Examples
//!
//! ```no_run
//! use docxcat::validation::Validator;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let validator = Validator::new();
//! let result = validator.validate_file(&PathBuf::from("report.docx")).await?;
//! println!("{} paragraphs", result.summary.paragraphs);
//! # Ok(())
//! # }
//! ```

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{Config, OverwriteMode};
use crate::document::{DocumentSummary, SourceDocument};
use crate::error::{DocxCatError, Result};
use crate::io::{DocxReader, DocxWriter};
use crate::utils::format_file_size;

/// Result of validating one input.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Path to the validated file.
    pub path: PathBuf,

    /// Counts describing the document.
    pub summary: DocumentSummary,
}

/// Summary of validating every input.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    /// Per-file results, in input order.
    pub results: Vec<ValidationResult>,

    /// Paragraphs across all inputs.
    pub total_paragraphs: usize,

    /// Embedded images across all inputs.
    pub total_images: usize,

    /// Total size in bytes.
    pub total_size: u64,

    /// Number of files that passed.
    pub files_validated: usize,

    /// Problems that do not stop the merge.
    pub warnings: Vec<String>,
}

impl ValidationSummary {
    /// Create a summary from per-file results.
    pub fn from_results(results: Vec<ValidationResult>) -> Self {
        Self {
            total_paragraphs: results.iter().map(|r| r.summary.paragraphs).sum(),
            total_images: results.iter().map(|r| r.summary.images).sum(),
            total_size: results.iter().map(|r| r.summary.size).sum(),
            files_validated: results.len(),
            results,
            warnings: Vec::new(),
        }
    }

    /// Total size as a human-readable string.
    pub fn format_total_size(&self) -> String {
        format_file_size(self.total_size)
    }
}

/// Validator for inputs and output.
pub struct Validator {
    reader: DocxReader,
}

impl Validator {
    /// Create a validator.
    pub fn new() -> Self {
        Self {
            reader: DocxReader::new(),
        }
    }

    /// Validate one input.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, is not a file, cannot
    /// be read, or is not a document package.
    pub async fn validate_file(&self, path: &Path) -> Result<ValidationResult> {
        let loaded = self.reader.load(path).await?;
        let doc = SourceDocument::parse(loaded.name.as_str(), &loaded.bytes)?;
        let summary = doc.summary(loaded.file_size);
        debug!(path = %path.display(), paragraphs = summary.paragraphs, images = summary.images, "validated input");

        Ok(ValidationResult {
            path: loaded.path,
            summary,
        })
    }

    /// Validate inputs in order, stopping at the first failure.
    pub async fn validate_files(&self, paths: &[PathBuf]) -> Result<ValidationSummary> {
        if paths.is_empty() {
            return Err(DocxCatError::NoFilesToMerge);
        }

        let mut results = Vec::with_capacity(paths.len());
        for path in paths {
            results.push(self.validate_file(path).await?);
        }
        Ok(ValidationSummary::from_results(results))
    }

    /// Validate the output path. Returns warnings that do not stop the merge.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The output is one of the inputs
    /// - The output exists and overwriting is disabled
    /// - The output directory does not exist or is not writable
    pub async fn validate_output(&self, config: &Config) -> Result<Vec<String>> {
        let output = &config.output;

        let output_id = identity(output);
        if let Some(input) = config.inputs.iter().find(|input| identity(input) == output_id) {
            return Err(DocxCatError::invalid_config(format!(
                "Output file cannot be the same as an input file: {}",
                input.display()
            )));
        }

        let writer = DocxWriter::new();
        if config.overwrite_mode == OverwriteMode::NoClobber && writer.exists(output).await {
            return Err(DocxCatError::output_exists(output.clone()));
        }
        writer.can_write(output).await?;

        let mut warnings = Vec::new();
        let is_docx = output
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("docx"));
        if !is_docx {
            warnings.push(format!(
                "Output file does not have a .docx extension: {}",
                output.display()
            ));
        }
        Ok(warnings)
    }

    /// Validate inputs and output.
    pub async fn validate_config(&self, config: &Config) -> Result<ValidationSummary> {
        let mut summary = self.validate_files(&config.inputs).await?;
        summary.warnings = self.validate_output(config).await?;
        Ok(summary)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// Canonical form of a path when it exists, the path itself otherwise.
fn identity(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
