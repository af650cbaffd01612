//! Document loading.
//!
//! Inputs are read whole into memory with `tokio::fs`. Several files may be
//! read at once; results always come back in input order.
//!
//! # Examples
//!
//! ```no_run
//! use docxcat::io::reader::DocxReader;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = DocxReader::new();
//! let paths = vec![PathBuf::from("a.docx"), PathBuf::from("b.docx")];
//! let (results, stats) = reader.load_all(&paths, 4).await;
//! println!("loaded {} of {}", stats.success_count, results.len());
//! # Ok(())
//! # }
//! ```

use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::error::{DocxCatError, Result};
use crate::merge::NamedInput;
use crate::utils::format_file_size;

/// Local file header signature of a zip archive.
const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

/// A document file read into memory.
#[derive(Debug, Clone)]
pub struct LoadedDocx {
    /// Display name: the file name.
    pub name: String,

    /// Path the file was read from.
    pub path: PathBuf,

    /// File contents.
    pub bytes: Vec<u8>,

    /// Time taken to read the file.
    pub load_time: Duration,

    /// File size in bytes.
    pub file_size: u64,
}

impl LoadedDocx {
    /// Convert into a merge input, keeping the display name.
    pub fn into_input(self) -> NamedInput {
        NamedInput::new(self.name, self.bytes)
    }
}

/// Display name of a path: its file name, or the whole path when it has none.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Result of loading one file.
pub type LoadResult = Result<LoadedDocx>;

/// Statistics about a batch load.
#[derive(Debug, Clone)]
pub struct LoadStatistics {
    /// Number of files loaded.
    pub success_count: usize,

    /// Number of files that failed.
    pub failure_count: usize,

    /// Wall-clock time of the batch.
    pub total_time: Duration,

    /// Mean load time of the successful files.
    pub average_time: Duration,

    /// Total bytes read.
    pub total_size: u64,
}

impl LoadStatistics {
    fn from_results(results: &[LoadResult], total_time: Duration) -> Self {
        let mut success_count = 0;
        let mut failure_count = 0;
        let mut total_size = 0;
        let mut total_load_time = Duration::ZERO;

        for result in results {
            match result {
                Ok(loaded) => {
                    success_count += 1;
                    total_size += loaded.file_size;
                    total_load_time += loaded.load_time;
                }
                Err(_) => failure_count += 1,
            }
        }

        let average_time = if success_count > 0 {
            total_load_time / success_count as u32
        } else {
            Duration::ZERO
        };

        Self {
            success_count,
            failure_count,
            total_time,
            average_time,
            total_size,
        }
    }

    /// Total size as a human-readable string.
    pub fn format_total_size(&self) -> String {
        format_file_size(self.total_size)
    }
}

/// Reads document files.
#[derive(Debug, Clone, Copy)]
pub struct DocxReader {
    verify: bool,
}

impl DocxReader {
    /// Reader that rejects files that are not zip archives.
    pub fn new() -> Self {
        Self { verify: true }
    }

    /// Reader that returns file contents unchecked.
    pub fn without_verification() -> Self {
        Self { verify: false }
    }

    /// Read one file.
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist, is not a regular file,
    /// cannot be read, or (when verifying) is not a zip archive.
    pub async fn load(&self, path: &Path) -> Result<LoadedDocx> {
        let start = Instant::now();

        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DocxCatError::file_not_found(path.to_path_buf())
            } else {
                DocxCatError::FileNotAccessible {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        if !metadata.is_file() {
            return Err(DocxCatError::not_a_file(path.to_path_buf()));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| DocxCatError::FileNotAccessible {
                path: path.to_path_buf(),
                source: e,
            })?;

        let name = display_name(path);
        if self.verify && !bytes.starts_with(ZIP_SIGNATURE) {
            return Err(DocxCatError::malformed_input(name, "not a zip archive"));
        }

        let load_time = start.elapsed();
        debug!(path = %path.display(), size = bytes.len(), ?load_time, "loaded file");

        Ok(LoadedDocx {
            name,
            path: path.to_path_buf(),
            file_size: bytes.len() as u64,
            bytes,
            load_time,
        })
    }

    /// Read files one after another.
    pub async fn load_sequential(&self, paths: &[PathBuf]) -> Vec<LoadResult> {
        let mut results = Vec::with_capacity(paths.len());
        for path in paths {
            results.push(self.load(path).await);
        }
        results
    }

    /// Read up to `workers` files at once, returning results in input order.
    pub async fn load_parallel(&self, paths: &[PathBuf], workers: usize) -> Vec<LoadResult> {
        let reader = *self;
        stream::iter(paths.iter().map(|path| async move { reader.load(path).await }))
            .buffered(workers.max(1))
            .collect()
            .await
    }

    /// Read every file and collect statistics.
    pub async fn load_all(
        &self,
        paths: &[PathBuf],
        max_workers: usize,
    ) -> (Vec<LoadResult>, LoadStatistics) {
        let start = Instant::now();

        let results = if paths.len() <= 3 {
            self.load_sequential(paths).await
        } else {
            self.load_parallel(paths, max_workers).await
        };

        let stats = LoadStatistics::from_results(&results, start.elapsed());
        (results, stats)
    }
}

impl Default for DocxReader {
    fn default() -> Self {
        Self::new()
    }
}
