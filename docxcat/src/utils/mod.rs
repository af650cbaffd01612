//! Utilities for path collection and size formatting.

use crate::{Result, error::DocxCatError};
use std::path::PathBuf;

/// Expand every pattern into paths, keeping pattern order.
///
/// A pattern without glob metacharacters is taken literally, so a missing
/// file is reported when it is loaded instead of silently vanishing. Matches
/// of one glob pattern come back in alphabetical order.
pub fn collect_paths_for_patterns<T>(patterns: T) -> Result<Vec<PathBuf>>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let mut resolved_paths = Vec::new();

    for pattern in patterns.into_iter() {
        let paths = collect_paths_for_pattern(pattern)?;
        resolved_paths.extend(paths);
    }

    Ok(resolved_paths)
}

fn collect_paths_for_pattern<P: AsRef<str>>(pattern: P) -> Result<Vec<PathBuf>> {
    let pattern = pattern.as_ref();
    if !is_glob(pattern) {
        return Ok(vec![PathBuf::from(pattern)]);
    }

    let mut resolved_paths = Vec::new();
    let paths = glob::glob(pattern)
        .map_err(|err| DocxCatError::other(format!("invalid pattern '{pattern}': {err}")))?;

    for entry in paths {
        let path = entry.map_err(|err| DocxCatError::other(err.to_string()))?;
        resolved_paths.push(path);
    }

    if resolved_paths.is_empty() {
        tracing::warn!(pattern, "pattern matched no files");
    }

    Ok(resolved_paths)
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Format a byte count as a human-readable string.
pub fn format_file_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{size} bytes")
    }
}
