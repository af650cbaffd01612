//! Configuration module for docxcat.
//!
//! This module turns CLI arguments into a validated configuration that
//! drives a merge. It holds:
//! - The two merge options and the output metadata
//! - The order table and its `NAME=N` overrides
//! - Overwrite behavior and output verbosity

use anyhow::{Result, bail};

use crate::DocxCatError;
use std::{path::PathBuf, str::FromStr};

/// Default name of the merged document.
pub const DEFAULT_OUTPUT: &str = "merged_document.docx";

/// How source content is carried into the merged document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Copy body elements verbatim, formatting included. When off, only the
    /// plain text of non-blank paragraphs is kept.
    pub preserve_styles: bool,
    /// Append every embedded image of each source as a picture.
    pub preserve_images: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            preserve_styles: true,
            preserve_images: true,
        }
    }
}

/// A `NAME=N` override of the order table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEntry {
    /// Display name of the input(s) to move.
    pub name: String,
    /// New order value. Lower values merge first.
    pub order: i64,
}

impl FromStr for OrderEntry {
    type Err = DocxCatError;

    /// Parse `NAME=N`. The last `=` separates the name, so names may contain `=`.
    fn from_str(s: &str) -> crate::Result<Self> {
        let Some((name, order)) = s.rsplit_once('=') else {
            return Err(DocxCatError::invalid_order(s, "expected NAME=N"));
        };
        if name.trim().is_empty() {
            return Err(DocxCatError::invalid_order(s, "name is empty"));
        }
        let order = order
            .trim()
            .parse()
            .map_err(|_| DocxCatError::invalid_order(s, format!("'{order}' is not an integer")))?;

        Ok(Self {
            name: name.trim().to_string(),
            order,
        })
    }
}

/// One row of the order table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRow {
    /// Display name of the input.
    pub name: String,
    /// Order value.
    pub order: i64,
}

/// The order table: one row per input, in input position.
///
/// Rows are tied to positions rather than names, so two inputs sharing a
/// display name are still merged exactly once each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileOrder {
    rows: Vec<OrderRow>,
}

impl FileOrder {
    /// Table with the default order: 1-based input position.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows = names
            .into_iter()
            .zip(1..)
            .map(|(name, order)| OrderRow {
                name: name.into(),
                order,
            })
            .collect();
        Self { rows }
    }

    /// Rows in input position.
    pub fn rows(&self) -> &[OrderRow] {
        &self.rows
    }

    /// Set the order of every row named `name`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOrder` if no row has that name.
    pub fn set(&mut self, name: &str, order: i64) -> crate::Result<usize> {
        let mut matched = 0;
        for row in self.rows.iter_mut().filter(|r| r.name == name) {
            row.order = order;
            matched += 1;
        }
        if matched == 0 {
            return Err(DocxCatError::invalid_order(
                format!("{name}={order}"),
                "no input has this name",
            ));
        }
        Ok(matched)
    }

    /// Apply overrides in sequence.
    pub fn apply(&mut self, entries: &[OrderEntry]) -> crate::Result<()> {
        for entry in entries {
            self.set(&entry.name, entry.order)?;
        }
        Ok(())
    }

    /// Input positions in merge order: a stable sort by order value.
    pub fn permutation(&self) -> Vec<usize> {
        let mut positions: Vec<usize> = (0..self.rows.len()).collect();
        positions.sort_by_key(|&i| self.rows[i].order);
        positions
    }

    /// Rearrange `items` (one per row, in input position) into merge order.
    pub fn arrange<T>(&self, items: Vec<T>) -> Vec<T> {
        let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
        self.permutation()
            .into_iter()
            .filter_map(|i| slots.get_mut(i).and_then(Option::take))
            .collect()
    }
}

/// Core properties to set on the output document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Document title.
    pub title: Option<String>,
    /// Document author.
    pub author: Option<String>,
    /// Document subject.
    pub subject: Option<String>,
    /// Document keywords (comma-separated).
    pub keywords: Option<String>,
}

impl Metadata {
    /// Check if any metadata fields are set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.subject.is_none()
            && self.keywords.is_none()
    }

    /// Create metadata from optional strings, trimming whitespace.
    pub fn new(
        title: Option<String>,
        author: Option<String>,
        subject: Option<String>,
        keywords: Option<String>,
    ) -> Self {
        let trimmed = |opt: Option<String>| {
            opt.filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_string())
        };

        Self {
            title: trimmed(title),
            author: trimmed(author),
            subject: trimmed(subject),
            keywords: trimmed(keywords),
        }
    }
}

/// Output file overwrite behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Prompt the user before overwriting (default).
    #[default]
    Prompt,
    /// Always overwrite without prompting.
    Force,
    /// Never overwrite, error if file exists.
    NoClobber,
}

/// Complete configuration for a merge.
#[derive(Debug, Clone)]
pub struct Config {
    /// Input document paths, in input position.
    pub inputs: Vec<PathBuf>,

    /// Output document path.
    pub output: PathBuf,

    /// Merge options.
    pub options: MergeOptions,

    /// Overrides of the order table.
    pub order: Vec<OrderEntry>,

    /// Show a preview of this input instead of merging.
    pub preview: Option<String>,

    /// Metadata to set on the output document.
    pub metadata: Metadata,

    /// Dry run mode - validate without creating output.
    pub dry_run: bool,

    /// Verbose output mode.
    pub verbose: bool,

    /// Quiet mode - suppress non-error output.
    pub quiet: bool,

    /// File overwrite behavior.
    pub overwrite_mode: OverwriteMode,

    /// Number of concurrent file reads (None = auto-detect).
    pub jobs: Option<usize>,

    /// Print the result as JSON.
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            options: MergeOptions::default(),
            order: Vec::new(),
            preview: None,
            metadata: Metadata::default(),
            dry_run: false,
            verbose: false,
            quiet: false,
            overwrite_mode: OverwriteMode::default(),
            jobs: None,
            json: false,
        }
    }
}

impl Config {
    /// Returns a reference to inputs.
    pub fn inputs(&self) -> &[PathBuf] {
        self.inputs.as_ref()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No input files are specified
    /// - Verbose and quiet modes are both enabled
    /// - Jobs count is zero
    /// - The output path is also an input
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            bail!("No input files specified");
        }

        if self.verbose && self.quiet {
            bail!("Cannot use both --verbose and --quiet");
        }

        if let Some(jobs) = self.jobs
            && jobs == 0
        {
            bail!("Number of jobs must be at least 1");
        }

        if self.output.as_os_str().is_empty() {
            bail!("Output file name cannot be empty");
        }

        for input in &self.inputs {
            if input == &self.output {
                bail!(
                    "Output file cannot be the same as an input file: {}",
                    self.output.display()
                );
            }
        }

        Ok(())
    }

    /// Get the effective number of concurrent reads.
    ///
    /// Returns the configured job count, or the number of CPU cores if auto-detect.
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Check if output should be displayed.
    ///
    /// Returns false if in quiet mode and not doing a dry run.
    pub fn should_print(&self) -> bool {
        !self.quiet || self.dry_run
    }
}
