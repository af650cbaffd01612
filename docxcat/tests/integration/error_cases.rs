//! Integration tests for error handling and edge cases.

use docxcat::config::{Config, MergeOptions, OrderEntry, OverwriteMode};
use docxcat::error::DocxCatError;
use docxcat::merge::{NamedInput, merge_docx, merge_documents};
use std::path::PathBuf;
use tempfile::TempDir;

use crate::common::{Docx, write_inputs};

fn config_for(dir: &TempDir, inputs: Vec<PathBuf>) -> Config {
    Config {
        inputs,
        output: dir.path().join("merged.docx"),
        overwrite_mode: OverwriteMode::Force,
        quiet: true,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_error_nonexistent_input() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, vec![PathBuf::from("/nonexistent/file.docx")]);

    let err = merge_docx(&config).await.unwrap_err();
    assert!(matches!(err, DocxCatError::FileNotFound { .. }));
}

#[tokio::test]
async fn test_error_empty_input_list() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, vec![]);

    assert!(config.validate().is_err(), "Should fail with empty input list");
    let err = merge_docx(&config).await.unwrap_err();
    assert!(matches!(err, DocxCatError::NoFilesToMerge));
}

#[test]
fn test_error_empty_in_memory_inputs() {
    let err = merge_documents(&[], MergeOptions::default(), None).unwrap_err();
    assert!(matches!(err, DocxCatError::NoFilesToMerge));
}

#[tokio::test]
async fn test_error_directory_as_input() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir, vec![dir.path().to_path_buf()]);

    let err = merge_docx(&config).await.unwrap_err();
    assert!(matches!(err, DocxCatError::NotAFile { .. }));
}

#[tokio::test]
async fn test_error_malformed_input_aborts_merge() {
    let dir = TempDir::new().unwrap();
    let inputs = write_inputs(
        &dir,
        vec![
            ("good.docx", Docx::new().paragraph("text").build()),
            ("broken.docx", b"not a document".to_vec()),
        ],
    );
    let config = config_for(&dir, inputs);

    let err = merge_docx(&config).await.unwrap_err();
    assert!(matches!(err, DocxCatError::MalformedInput { ref name, .. } if name == "broken.docx"));
    assert!(!config.output.exists());
}

#[test]
fn test_error_zip_without_main_part() {
    let mut bytes = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut bytes);
        zip.start_file("readme.txt", zip::write::SimpleFileOptions::default())
            .unwrap();
        std::io::Write::write_all(&mut zip, b"hello").unwrap();
        zip.finish().unwrap();
    }
    let inputs = vec![NamedInput::new("archive.docx", bytes.into_inner())];

    let err = merge_documents(&inputs, MergeOptions::default(), None).unwrap_err();
    assert!(matches!(err, DocxCatError::MalformedInput { ref name, .. } if name == "archive.docx"));
}

#[test]
fn test_error_unreadable_image() {
    let inputs = vec![NamedInput::new(
        "broken-image.docx",
        Docx::new()
            .paragraph("caption")
            .image(b"\x89PNG but truncated".to_vec())
            .build(),
    )];

    let err = merge_documents(&inputs, MergeOptions::default(), None).unwrap_err();
    assert!(matches!(
        err,
        DocxCatError::UnsupportedImage { ref name, index: 1, .. } if name == "broken-image.docx"
    ));
}

#[test]
fn test_unreadable_image_ignored_without_images() {
    let inputs = vec![NamedInput::new(
        "broken-image.docx",
        Docx::new()
            .paragraph("caption")
            .image(b"\x89PNG but truncated".to_vec())
            .build(),
    )];
    let options = MergeOptions {
        preserve_styles: true,
        preserve_images: false,
    };

    assert!(merge_documents(&inputs, options, None).is_ok());
}

#[tokio::test]
async fn test_error_unknown_order_name() {
    let dir = TempDir::new().unwrap();
    let inputs = write_inputs(&dir, vec![("a.docx", Docx::new().paragraph("text").build())]);
    let mut config = config_for(&dir, inputs);
    config.order = vec![OrderEntry {
        name: "missing.docx".to_string(),
        order: 1,
    }];

    let err = merge_docx(&config).await.unwrap_err();
    assert!(matches!(err, DocxCatError::InvalidOrder { .. }));
}
