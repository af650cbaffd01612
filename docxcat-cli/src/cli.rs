//! CLI argument parsing for docxcat.
//!
//! Defines the command-line interface with `clap` and turns it into a
//! [`Config`].

use clap::Parser;
use std::path::{Path, PathBuf};

use docxcat::config::{
    Config, DEFAULT_OUTPUT, MergeOptions, Metadata, OrderEntry, OverwriteMode,
};
use docxcat::error::{DocxCatError, Result};
use docxcat::utils::collect_paths_for_patterns;

/// Concatenate Word documents into a single document.
///
/// Each input is introduced by a heading with its file name and closed by
/// a rule of `=` characters. Formatting and images are kept by default.
#[derive(Parser, Debug)]
#[command(name = "docxcat")]
#[command(version)]
#[command(about = "Concatenate Word documents into a single document", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Input .docx files or glob patterns, in merge order
    ///
    /// Examples:
    ///   docxcat intro.docx body.docx -o report.docx
    ///   docxcat 'chapters/*.docx'
    #[arg(value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Output file path
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Keep only the plain text of non-blank paragraphs
    ///
    /// By default every body element is copied with its formatting.
    #[arg(long)]
    pub no_styles: bool,

    /// Do not append the images of each document
    #[arg(long)]
    pub no_images: bool,

    /// Set the order value of an input (repeatable)
    ///
    /// Inputs start with their position (1, 2, 3, ...) and are merged in
    /// ascending order. NAME is the file name of an input.
    ///
    /// Example:
    ///   docxcat a.docx b.docx c.docx --order c.docx=0
    #[arg(long = "order", value_name = "NAME=N")]
    pub order: Vec<OrderEntry>,

    /// Read more inputs from a file, one path per line
    ///
    /// Empty lines and lines starting with '#' are skipped. Use '-' to read
    /// from stdin. Paths from the list follow the inputs given directly.
    #[arg(long, value_name = "FILE")]
    pub input_list: Option<PathBuf>,

    /// Preview one input (first paragraphs and up to three images) instead
    /// of merging
    #[arg(short, long, value_name = "NAME")]
    pub preview: Option<String>,

    /// Validate inputs and show the merge order without writing output
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Show details about each input and the merge
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Overwrite the output file without asking
    #[arg(short, long)]
    pub force: bool,

    /// Never overwrite the output file
    #[arg(long, conflicts_with = "force")]
    pub no_clobber: bool,

    /// Number of files read concurrently (default: number of CPU cores)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Print the result as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Title of the output document
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Author of the output document
    #[arg(long, value_name = "TEXT")]
    pub author: Option<String>,

    /// Subject of the output document
    #[arg(long, value_name = "TEXT")]
    pub subject: Option<String>,

    /// Keywords of the output document (comma-separated)
    #[arg(long, value_name = "TEXT")]
    pub keywords: Option<String>,
}

impl Cli {
    /// Build a validated [`Config`] for the given, already expanded, inputs.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the configuration does not validate.
    pub fn to_config(&self, inputs: Vec<PathBuf>) -> Result<Config> {
        let overwrite_mode = if self.force {
            OverwriteMode::Force
        } else if self.no_clobber {
            OverwriteMode::NoClobber
        } else {
            OverwriteMode::Prompt
        };

        let config = Config {
            inputs,
            output: self.output.clone(),
            options: MergeOptions {
                preserve_styles: !self.no_styles,
                preserve_images: !self.no_images,
            },
            order: self.order.clone(),
            preview: self.preview.clone(),
            metadata: Metadata::new(
                self.title.clone(),
                self.author.clone(),
                self.subject.clone(),
                self.keywords.clone(),
            ),
            dry_run: self.dry_run,
            verbose: self.verbose,
            quiet: self.quiet,
            overwrite_mode,
            jobs: self.jobs,
            json: self.json,
        };

        config.validate().map_err(|e| {
            DocxCatError::invalid_config(format!("Configuration validation failed: {e}"))
        })?;

        Ok(config)
    }

    /// Checks that need no file I/O.
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() && self.input_list.is_none() {
            return Err(DocxCatError::invalid_config("No input files specified"));
        }

        if let Some(jobs) = self.jobs
            && jobs == 0
        {
            return Err(DocxCatError::invalid_config(
                "Number of jobs must be at least 1",
            ));
        }

        if self.preview.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(DocxCatError::invalid_config("Preview name cannot be empty"));
        }

        Ok(())
    }

    /// Every input: expanded patterns first, then the input list.
    ///
    /// # Errors
    ///
    /// Returns `NoFilesToMerge` if nothing remains, or an error reading the
    /// input list.
    pub async fn get_all_inputs(&self) -> Result<Vec<PathBuf>> {
        let mut all_inputs = collect_paths_for_patterns(&self.inputs)?;

        if let Some(ref input_list_path) = self.input_list {
            all_inputs.extend(read_input_list(input_list_path).await?);
        }

        if all_inputs.is_empty() {
            return Err(DocxCatError::NoFilesToMerge);
        }

        Ok(all_inputs)
    }
}

async fn read_input_list(path: &Path) -> Result<Vec<PathBuf>> {
    use tokio::io::AsyncReadExt;

    let read_error = |source| DocxCatError::FailedToReadInputList {
        path: path.to_path_buf(),
        source,
    };

    let mut text = String::new();
    if path.as_os_str() == "-" {
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .map_err(read_error)?;
    } else {
        text = tokio::fs::read_to_string(path).await.map_err(read_error)?;
    }

    parse_input_list(path, &text)
}

fn parse_input_list(path: &Path, text: &str) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.contains('\0') {
            return Err(DocxCatError::InvalidInputList {
                path: path.to_path_buf(),
                line_number: i + 1,
                details: "path contains a NUL byte".to_string(),
            });
        }
        paths.push(PathBuf::from(line));
    }

    Ok(paths)
}
