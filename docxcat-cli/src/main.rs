//! docxcat - Concatenate Word documents into a single document.

mod cli;

use clap::Parser;
use std::process;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use docxcat::config::{Config, FileOrder, OverwriteMode};
use docxcat::error::DocxCatError;
use docxcat::io::{DocxReader, DocxWriter, display_name};
use docxcat::merge::{DocumentPreview, Merger, PREVIEW_IMAGE_LIMIT};
use docxcat::output::{
    OutputFormatter, ProgressBar, ProgressStyle, display_merge_statistics, display_preview,
    display_validation_summary, dry_run_report, merge_report, preview_report,
};
use docxcat::validation::Validator;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        process::exit(err.exit_code());
    }
}

/// Diagnostics on stderr; `RUST_LOG` overrides the default filter.
fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,docxcat=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

async fn run(cli: Cli) -> Result<(), DocxCatError> {
    cli.validate()?;

    let inputs = cli.get_all_inputs().await?;
    let config = cli.to_config(inputs)?;
    let formatter = OutputFormatter::from_config(&config);

    if formatter.should_print() {
        formatter.section(&format!("{} v{}", docxcat::NAME, docxcat::VERSION));
        formatter.blank_line();
    }

    if let Some(name) = &config.preview {
        return preview(&config, name, &formatter).await;
    }

    formatter.info("Validating input files...");
    let validator = Validator::new();
    let summary = validator.validate_config(&config).await?;
    display_validation_summary(&formatter, &summary);

    let order = merge_order(&config)?;
    if formatter.is_verbose() {
        formatter.blank_line();
        formatter.section("Merge order");
        for (i, name) in order.iter().enumerate() {
            formatter.list_item(i + 1, name);
        }
    }

    if config.dry_run {
        if config.json {
            print_json(&dry_run_report(
                &summary,
                &order,
                &config.output.display().to_string(),
            ))?;
        }
        formatter.blank_line();
        formatter.success("Dry run completed successfully");
        formatter.info(&format!("  Output would be: {}", config.output.display()));
        formatter.info("  Run without --dry-run to create the merged document");
        return Ok(());
    }

    handle_output_overwrite(&config, &formatter).await?;

    formatter.info("Merging documents...");
    let mut progress = if formatter.should_print() {
        ProgressBar::new(config.inputs.len(), ProgressStyle::Bar)
    } else {
        ProgressBar::disabled()
    };
    progress.set_message("Merging");

    let mut result = Merger::new()
        .merge_with_progress(&config, move |done, total| {
            progress.update(done);
            if done == total {
                progress.finish();
            }
        })
        .await?;

    formatter.info(&format!(
        "Merged {} file(s) in {:.2}s",
        result.statistics.files_merged,
        result.statistics.merge_time.as_secs_f64()
    ));
    formatter.info(&format!("Writing to: {}", config.output.display()));

    let write_stats = DocxWriter::new()
        .save_with_stats(std::mem::take(&mut result.bytes), &config.output)
        .await?;

    if config.json {
        print_json(&merge_report(&result, &write_stats))?;
    }
    formatter.blank_line();
    formatter.success(&format!(
        "Successfully created {} ({})",
        config.output.display(),
        write_stats.format_file_size()
    ));
    display_merge_statistics(&formatter, &result, &write_stats);

    Ok(())
}

/// Show a preview of the input named `name`.
async fn preview(
    config: &Config,
    name: &str,
    formatter: &OutputFormatter,
) -> Result<(), DocxCatError> {
    let path = find_input(config, name)?;
    let loaded = DocxReader::new().load(&path).await?;
    let preview = DocumentPreview::from_bytes(&loaded.name, &loaded.bytes, PREVIEW_IMAGE_LIMIT)?;

    if config.json {
        print_json(&preview_report(&preview))?;
    }
    display_preview(formatter, &preview);
    Ok(())
}

/// The input whose file name, or full path, is `name`.
fn find_input(config: &Config, name: &str) -> Result<std::path::PathBuf, DocxCatError> {
    config
        .inputs
        .iter()
        .find(|path| display_name(path) == name)
        .or_else(|| config.inputs.iter().find(|path| path.as_os_str() == name))
        .cloned()
        .ok_or_else(|| {
            let names: Vec<String> = config.inputs.iter().map(|p| display_name(p)).collect();
            DocxCatError::invalid_config(format!(
                "No input named '{name}'. Inputs: {}",
                names.join(", ")
            ))
        })
}

/// Display names in the order they will be merged.
fn merge_order(config: &Config) -> Result<Vec<String>, DocxCatError> {
    let names: Vec<String> = config.inputs.iter().map(|p| display_name(p)).collect();
    let mut order = FileOrder::new(names.iter().cloned());
    order.apply(&config.order)?;
    Ok(order.arrange(names))
}

fn print_json(value: &serde_json::Value) -> Result<(), DocxCatError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| DocxCatError::other(format!("Failed to render JSON: {e}")))?;
    println!("{text}");
    Ok(())
}

/// Handle output file overwrite scenarios.
async fn handle_output_overwrite(
    config: &Config,
    formatter: &OutputFormatter,
) -> Result<(), DocxCatError> {
    if !DocxWriter::new().exists(&config.output).await {
        return Ok(());
    }

    match config.overwrite_mode {
        OverwriteMode::Force => Ok(()),
        OverwriteMode::NoClobber => Err(DocxCatError::output_exists(config.output.clone())),
        OverwriteMode::Prompt => {
            // Nobody to ask.
            if formatter.is_quiet() {
                return Err(DocxCatError::output_exists(config.output.clone()));
            }

            formatter.warning(&format!(
                "Output file already exists: {}",
                config.output.display()
            ));

            use std::io::{self, Write};
            print!("Overwrite? [y/N]: ");
            io::stdout().flush().ok();

            let mut response = String::new();
            io::stdin()
                .read_line(&mut response)
                .map_err(|err| DocxCatError::other(format!("Failed to read input: {err}")))?;

            match response.trim().to_lowercase().as_str() {
                "y" | "yes" => Ok(()),
                _ => Err(DocxCatError::Cancelled),
            }
        }
    }
}
