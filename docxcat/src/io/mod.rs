//! File input and output.

pub mod reader;
pub mod writer;

pub use reader::{DocxReader, LoadResult, LoadStatistics, LoadedDocx, display_name};
pub use writer::{DocxWriter, WriteOptions, WriteStatistics};
