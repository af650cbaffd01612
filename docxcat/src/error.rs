//! Error types for docxcat.
//!
//! This module defines all error types that can occur while reading,
//! merging and writing Word documents. Errors are designed to be
//! informative and actionable, naming the input or output involved.
//!
//! # Error Categories
//!
//! - **I/O Errors**: File not found, permission denied, etc.
//! - **Package Errors**: Inputs that are not `.docx` packages
//! - **Image Errors**: Embedded images that cannot be read
//! - **Validation Errors**: Invalid arguments or configuration

use std::io;
use std::path::PathBuf;

/// Result type alias for docxcat operations.
pub type Result<T> = std::result::Result<T, DocxCatError>;

/// Main error type for docxcat operations.
#[derive(Debug, thiserror::Error)]
pub enum DocxCatError {
    /// Input file was not found.
    #[error("File not found: {}", path.display())]
    FileNotFound {
        /// Path to the file that was not found.
        path: PathBuf,
    },

    /// Input file is not accessible (permission denied, etc.).
    #[error("Cannot access file: {}\n  Reason: {source}", path.display())]
    FileNotAccessible {
        /// Path to the inaccessible file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Input path exists but is not a regular file.
    #[error("Not a file: {}", path.display())]
    NotAFile {
        /// Path that is not a file.
        path: PathBuf,
    },

    /// Input bytes are not a parseable document package.
    #[error("Malformed document: {name}\n  Reason: {reason}")]
    MalformedInput {
        /// Display name of the offending input.
        name: String,
        /// Reason reported by the package reader.
        reason: String,
    },

    /// An embedded image could not be decoded for preview.
    #[error("Failed to decode image #{index}: {reason}")]
    ImageDecode {
        /// 1-based position of the image in the relationship table.
        index: usize,
        /// Reason reported by the decoder.
        reason: String,
    },

    /// An embedded image could not be sized for the merged document.
    #[error("Unsupported image #{index} in {name}\n  Reason: {reason}")]
    UnsupportedImage {
        /// Display name of the input holding the image.
        name: String,
        /// 1-based position of the image in the relationship table.
        index: usize,
        /// Reason reported by the decoder.
        reason: String,
    },

    /// The merged document could not be serialized.
    #[error("Failed to serialize merged document: {reason}")]
    OutputSerialization {
        /// Details about the failure.
        reason: String,
    },

    /// No files were provided for merging.
    #[error("No input files specified for merging")]
    NoFilesToMerge,

    /// Output file already exists and overwrite is not allowed.
    #[error(
        "Output file already exists: {}\n  Use --force to overwrite or choose a different output path",
        path.display()
    )]
    OutputExists {
        /// Path to the existing output file.
        path: PathBuf,
    },

    /// Failed to create output file.
    #[error("Failed to create output file: {}\n  Reason: {source}", path.display())]
    FailedToCreateOutput {
        /// Path where output should be created.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to write to output file.
    #[error("Failed to write to output file: {}\n  Reason: {source}", path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to read input list file.
    #[error("Failed to read input list file: {}\n  Reason: {source}", path.display())]
    FailedToReadInputList {
        /// Path to the input list file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Input list file contains invalid paths.
    #[error(
        "Invalid entry in input list file: {} at line {line_number}\n  Details: {details}",
        path.display()
    )]
    InvalidInputList {
        /// Path to the input list file.
        path: PathBuf,
        /// Line number with the error.
        line_number: usize,
        /// Details about what's invalid.
        details: String,
    },

    /// An order table entry is malformed or names an unknown input.
    #[error("Invalid order entry '{entry}': {reason}")]
    InvalidOrder {
        /// The entry as given by the user.
        entry: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// User cancelled the operation.
    #[error("Operation cancelled by user")]
    Cancelled,

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl From<anyhow::Error> for DocxCatError {
    fn from(err: anyhow::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl DocxCatError {
    /// Create a FileNotFound error.
    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    /// Create a NotAFile error.
    pub fn not_a_file(path: PathBuf) -> Self {
        Self::NotAFile { path }
    }

    /// Create a MalformedInput error.
    pub fn malformed_input(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an ImageDecode error.
    pub fn image_decode(index: usize, reason: impl Into<String>) -> Self {
        Self::ImageDecode {
            index,
            reason: reason.into(),
        }
    }

    /// Create an UnsupportedImage error.
    pub fn unsupported_image(name: impl Into<String>, index: usize, reason: impl Into<String>) -> Self {
        Self::UnsupportedImage {
            name: name.into(),
            index,
            reason: reason.into(),
        }
    }

    /// Create an OutputSerialization error.
    pub fn output_serialization(reason: impl Into<String>) -> Self {
        Self::OutputSerialization {
            reason: reason.into(),
        }
    }

    /// Create an OutputExists error.
    pub fn output_exists(path: PathBuf) -> Self {
        Self::OutputExists { path }
    }

    /// Create an InvalidOrder error.
    pub fn invalid_order(entry: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOrder {
            entry: entry.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if this error only affects a single preview item.
    ///
    /// Recoverable errors are reported inline and processing continues.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ImageDecode { .. })
    }

    /// Check if this error should stop all processing immediately.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NoFilesToMerge
                | Self::MalformedInput { .. }
                | Self::UnsupportedImage { .. }
                | Self::OutputSerialization { .. }
                | Self::FailedToCreateOutput { .. }
                | Self::FailedToWrite { .. }
                | Self::Cancelled
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. } => 2,
            Self::FileNotAccessible { .. } => 2,
            Self::NotAFile { .. } => 2,
            Self::MalformedInput { .. } => 3,
            Self::ImageDecode { .. } => 3,
            Self::UnsupportedImage { .. } => 3,
            Self::NoFilesToMerge => 1,
            Self::OutputExists { .. } => 4,
            Self::FailedToCreateOutput { .. } => 5,
            Self::FailedToWrite { .. } => 5,
            Self::OutputSerialization { .. } => 6,
            Self::FailedToReadInputList { .. } => 2,
            Self::InvalidInputList { .. } => 1,
            Self::InvalidOrder { .. } => 1,
            Self::InvalidConfig { .. } => 1,
            Self::Cancelled => 130, // SIGINT
            Self::Io { .. } => 5,
            Self::Other { .. } => 1,
        }
    }
}
