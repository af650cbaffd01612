//! Writing merged documents to disk.
//!
//! - Atomic writes (write to a temp file next to the target, then rename)
//! - Output directory checks
//! - Write statistics
//!
//! # Examples
//!
//! ```no_run
//! use docxcat::io::writer::DocxWriter;
//! use std::path::Path;
//!
//! # async fn example(bytes: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let writer = DocxWriter::new();
//! writer.save(bytes, Path::new("merged_document.docx")).await?;
//! # Ok(())
//! # }
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;

use crate::error::{DocxCatError, Result};
use crate::utils::format_file_size;

/// Options for writing.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Write to a temp file and rename it into place.
    pub atomic: bool,

    /// Buffer size for the file writer.
    pub buffer_size: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            atomic: true,
            buffer_size: 64 * 1024,
        }
    }
}

/// Statistics about a write.
#[derive(Debug, Clone)]
pub struct WriteStatistics {
    /// Time spent writing.
    pub write_time: Duration,

    /// Size of the written file.
    pub file_size: u64,

    /// Where the file was written.
    pub output_path: PathBuf,
}

impl WriteStatistics {
    /// File size as a human-readable string.
    pub fn format_file_size(&self) -> String {
        format_file_size(self.file_size)
    }
}

/// Writes document bytes to disk.
pub struct DocxWriter {
    options: WriteOptions,
}

impl DocxWriter {
    /// Writer with atomic writes.
    pub fn new() -> Self {
        Self {
            options: WriteOptions::default(),
        }
    }

    /// Writer with custom options.
    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Writer that writes straight to the target path.
    pub fn non_atomic() -> Self {
        Self {
            options: WriteOptions {
                atomic: false,
                ..Default::default()
            },
        }
    }

    /// Write `bytes` to `path`.
    pub async fn save(&self, bytes: Vec<u8>, path: &Path) -> Result<()> {
        self.save_with_stats(bytes, path).await.map(|_| ())
    }

    /// Write `bytes` to `path` and report statistics.
    ///
    /// # Errors
    ///
    /// Returns `FailedToCreateOutput` or `FailedToWrite`. On failure no
    /// partial file is left at `path` when writing atomically.
    pub async fn save_with_stats(&self, bytes: Vec<u8>, path: &Path) -> Result<WriteStatistics> {
        let path_buf = path.to_path_buf();
        let options = self.options.clone();

        task::spawn_blocking(move || {
            let start = Instant::now();

            let write_path = if options.atomic {
                temp_path_for(&path_buf)
            } else {
                path_buf.clone()
            };

            let result = write_file(&write_path, &bytes, options.buffer_size).and_then(|()| {
                if options.atomic {
                    std::fs::rename(&write_path, &path_buf).map_err(|e| {
                        DocxCatError::FailedToWrite {
                            path: path_buf.clone(),
                            source: e,
                        }
                    })
                } else {
                    Ok(())
                }
            });
            if result.is_err() && options.atomic {
                let _ = std::fs::remove_file(&write_path);
            }
            result?;

            let file_size = std::fs::metadata(&path_buf)
                .map(|m| m.len())
                .unwrap_or(bytes.len() as u64);

            Ok::<_, DocxCatError>(WriteStatistics {
                write_time: start.elapsed(),
                file_size,
                output_path: path_buf,
            })
        })
        .await
        .map_err(|e| DocxCatError::other(format!("Write task failed: {e}")))?
    }

    /// Check that the output directory exists and is writable.
    pub async fn can_write(&self, path: &Path) -> Result<()> {
        let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(());
        };

        let metadata =
            tokio::fs::metadata(parent)
                .await
                .map_err(|_| {
                    DocxCatError::invalid_config(format!(
                        "Output directory does not exist: {}",
                        parent.display()
                    ))
                })?;

        if !metadata.is_dir() {
            return Err(DocxCatError::invalid_config(format!(
                "Output directory is not a directory: {}",
                parent.display()
            )));
        }

        if metadata.permissions().readonly() {
            return Err(DocxCatError::invalid_config(format!(
                "Output directory is not writable: {}",
                parent.display()
            )));
        }

        Ok(())
    }

    /// Whether something exists at `path`.
    pub async fn exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path).await.is_ok()
    }

    /// Delete `path` if it exists.
    pub async fn remove_if_exists(&self, path: &Path) -> Result<()> {
        if self.exists(path).await {
            tokio::fs::remove_file(path)
                .await
                .map_err(|e| DocxCatError::FailedToWrite {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }
}

impl Default for DocxWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Hidden sibling of the target, so the final rename stays on one filesystem.
fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{file_name}.{}.tmp", std::process::id()))
}

fn write_file(path: &Path, bytes: &[u8], buffer_size: usize) -> Result<()> {
    let file = std::fs::File::create(path).map_err(|e| DocxCatError::FailedToCreateOutput {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut writer = std::io::BufWriter::with_capacity(buffer_size, file);
    writer
        .write_all(bytes)
        .and_then(|()| writer.flush())
        .map_err(|e| DocxCatError::FailedToWrite {
            path: path.to_path_buf(),
            source: e,
        })
}
