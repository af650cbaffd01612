//! docxcat - Concatenate Word documents into a single document.
//!
//! This library merges `.docx` packages in a caller-chosen order. Each
//! input is introduced by a heading with its name and closed by a rule.
//! It supports:
//!
//! - Verbatim copying of body content, formatting included
//! - Re-embedding of every image at a fixed width
//! - An editable order table
//! - Read-only previews of inputs
//! - Core properties of the output
//!
//! # Examples
//!
//! ## Merging buffers
//!
//! ```no_run
//! use docxcat::config::MergeOptions;
//! use docxcat::merge::{NamedInput, merge_documents};
//!
//! # fn example(a: Vec<u8>, b: Vec<u8>) -> docxcat::Result<()> {
//! let inputs = vec![NamedInput::new("a.docx", a), NamedInput::new("b.docx", b)];
//! let merged = merge_documents(&inputs, MergeOptions::default(), None)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Merging files
//!
//! ```no_run
//! use docxcat::merge;
//! use docxcat::config::Config;
//! use docxcat::io::DocxWriter;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     inputs: vec![PathBuf::from("a.docx"), PathBuf::from("b.docx")],
//!     ..Default::default()
//! };
//!
//! let (bytes, stats) = merge::merge_docx(&config).await?;
//! DocxWriter::new().save(bytes, &config.output).await?;
//! println!("Merged {} documents", stats.files_merged);
//! # Ok(())
//! # }
//! ```
//!
//! ## Previewing an input
//!
//! ```no_run
//! # fn example(bytes: &[u8]) -> docxcat::Result<()> {
//! let text = docxcat::merge::extract_preview(bytes)?;
//! let images = docxcat::merge::extract_images(bytes)?;
//! println!("{text}\n({} images)", images.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod document;
pub mod error;
pub mod io;
pub mod merge;
pub mod output;
pub mod package;
pub mod utils;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{DocxCatError, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
