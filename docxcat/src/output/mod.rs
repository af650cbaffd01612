//! User-facing output.
//!
//! This module handles:
//! - Formatted status messages
//! - Per-document progress
//! - Validation, preview and merge summaries
//! - JSON reports for `--json`
//!
//! # Examples
//!
//! ```no_run
//! use docxcat::output::OutputFormatter;
//! use docxcat::config::Config;
//!
//! # fn example(config: Config) {
//! let formatter = OutputFormatter::from_config(&config);
//! formatter.info("Starting merge");
//! formatter.success("Merge completed");
//! # }
//! ```

pub mod formatter;
pub mod progress;

pub use formatter::{MessageLevel, OutputFormatter};
pub use progress::{ProgressBar, ProgressStyle};

use serde_json::{Value, json};

use crate::io::WriteStatistics;
use crate::merge::{DocumentPreview, MergeResult, PreviewImage};
use crate::validation::ValidationSummary;

/// Show the outcome of input validation.
pub fn display_validation_summary(formatter: &OutputFormatter, summary: &ValidationSummary) {
    for warning in &summary.warnings {
        formatter.warning(warning);
    }

    formatter.info(&format!(
        "Validated {} file(s): {} paragraphs, {} images, {}",
        summary.files_validated,
        summary.total_paragraphs,
        summary.total_images,
        summary.format_total_size()
    ));

    for (i, result) in summary.results.iter().enumerate() {
        formatter.detail(
            &format!("{}. {}", i + 1, result.summary.name),
            &format!(
                "{} paragraphs ({} non-blank), {} tables, {} images",
                result.summary.paragraphs,
                result.summary.non_blank_paragraphs,
                result.summary.tables,
                result.summary.images
            ),
        );
    }
}

/// Show a document preview: text first, then one line per image.
pub fn display_preview(formatter: &OutputFormatter, preview: &DocumentPreview) {
    formatter.section(&format!("Preview: {}", preview.name));
    if preview.text.is_empty() {
        formatter.info("  (no text in the first paragraphs)");
    } else {
        formatter.block(&preview.text);
    }

    if preview.images.is_empty() {
        return;
    }
    formatter.blank_line();
    for image in &preview.images {
        match image {
            PreviewImage::Decoded(info) => formatter.list_item(
                info.index,
                &format!(
                    "{} image, {}x{} px, {} bytes",
                    info.format, info.width, info.height, info.size
                ),
            ),
            PreviewImage::Failed(err) => formatter.warning(&err.to_string()),
        }
    }
}

/// Show merge statistics. Verbose mode only.
pub fn display_merge_statistics(
    formatter: &OutputFormatter,
    result: &MergeResult,
    write_stats: &WriteStatistics,
) {
    if !formatter.is_verbose() {
        return;
    }
    let stats = &result.statistics;

    formatter.blank_line();
    formatter.section("Statistics");
    formatter.detail("Input files", &stats.files_merged.to_string());
    formatter.detail("Merge order", &result.merged_names.join(", "));
    formatter.detail("Copied elements", &stats.elements.to_string());
    formatter.detail("Paragraphs added", &stats.paragraphs.to_string());
    formatter.detail("Images", &stats.images.to_string());
    formatter.detail("Styles imported", &stats.styles_imported.to_string());
    formatter.detail("Lists imported", &stats.lists_imported.to_string());
    formatter.detail("Parts copied", &stats.parts_copied.to_string());
    formatter.detail("Input size", &stats.format_input_size());
    formatter.detail("Output size", &write_stats.format_file_size());
    formatter.detail("Load time", &format!("{:.2}s", stats.load_time.as_secs_f64()));
    formatter.detail("Merge time", &format!("{:.2}s", stats.merge_time.as_secs_f64()));
    formatter.detail(
        "Write time",
        &format!("{:.2}s", write_stats.write_time.as_secs_f64()),
    );
}

/// JSON report of a completed merge.
pub fn merge_report(result: &MergeResult, write_stats: &WriteStatistics) -> Value {
    let stats = &result.statistics;
    json!({
        "output": write_stats.output_path.display().to_string(),
        "files": result.merged_names,
        "filesMerged": stats.files_merged,
        "headings": stats.headings,
        "paragraphs": stats.paragraphs,
        "elements": stats.elements,
        "images": stats.images,
        "stylesImported": stats.styles_imported,
        "listsImported": stats.lists_imported,
        "partsCopied": stats.parts_copied,
        "inputSize": stats.input_size,
        "outputSize": write_stats.file_size,
        "loadMillis": stats.load_time.as_millis() as u64,
        "mergeMillis": stats.merge_time.as_millis() as u64,
        "writeMillis": write_stats.write_time.as_millis() as u64,
    })
}

/// JSON report of a dry run.
pub fn dry_run_report(summary: &ValidationSummary, order: &[String], output: &str) -> Value {
    json!({
        "dryRun": true,
        "output": output,
        "order": order,
        "validation": summary,
    })
}

/// JSON report of a document preview.
pub fn preview_report(preview: &DocumentPreview) -> Value {
    let images: Vec<Value> = preview
        .images
        .iter()
        .map(|image| match image {
            PreviewImage::Decoded(info) => json!(info),
            PreviewImage::Failed(err) => json!({ "error": err.to_string() }),
        })
        .collect();

    json!({
        "name": preview.name,
        "text": preview.text,
        "images": images,
        "summary": preview.summary,
    })
}
