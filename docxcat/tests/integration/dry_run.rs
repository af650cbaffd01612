//! Integration tests for dry-run validation.

use docxcat::config::{Config, OverwriteMode};
use docxcat::error::DocxCatError;
use docxcat::validation::Validator;
use tempfile::TempDir;

use crate::common::{Docx, png, write_inputs};

#[tokio::test]
async fn test_dry_run_does_not_create_output() {
    let dir = TempDir::new().unwrap();
    let inputs = write_inputs(&dir, vec![("a.docx", Docx::new().paragraph("text").build())]);
    let output = dir.path().join("merged.docx");

    let config = Config {
        inputs,
        output: output.clone(),
        dry_run: true,
        quiet: true,
        overwrite_mode: OverwriteMode::Force,
        ..Default::default()
    };

    let result = Validator::new().validate_config(&config).await;
    assert!(result.is_ok(), "Validation failed: {:?}", result.err());
    assert!(!output.exists(), "Output file should not be created in dry run");
}

#[tokio::test]
async fn test_dry_run_summarises_all_inputs() {
    let dir = TempDir::new().unwrap();
    let inputs = write_inputs(
        &dir,
        vec![
            ("a.docx", Docx::new().paragraph("one").paragraph("two").build()),
            ("b.docx", Docx::new().paragraph("three").image(png(4, 4)).build()),
        ],
    );

    let config = Config {
        inputs,
        output: dir.path().join("merged.docx"),
        dry_run: true,
        quiet: true,
        overwrite_mode: OverwriteMode::Force,
        ..Default::default()
    };

    let summary = Validator::new().validate_config(&config).await.unwrap();
    assert_eq!(summary.files_validated, 2);
    assert_eq!(summary.total_paragraphs, 3);
    assert_eq!(summary.total_images, 1);
    assert!(summary.total_size > 0);
}

#[tokio::test]
async fn test_dry_run_reports_existing_output_with_no_clobber() {
    let dir = TempDir::new().unwrap();
    let inputs = write_inputs(&dir, vec![("a.docx", Docx::new().paragraph("text").build())]);
    let output = dir.path().join("merged.docx");
    std::fs::write(&output, b"existing").unwrap();

    let config = Config {
        inputs,
        output,
        dry_run: true,
        quiet: true,
        overwrite_mode: OverwriteMode::NoClobber,
        ..Default::default()
    };

    let err = Validator::new().validate_config(&config).await.unwrap_err();
    assert!(matches!(err, DocxCatError::OutputExists { .. }));
}

#[tokio::test]
async fn test_dry_run_catches_malformed_input() {
    let dir = TempDir::new().unwrap();
    let inputs = write_inputs(
        &dir,
        vec![
            ("good.docx", Docx::new().paragraph("text").build()),
            ("bad.docx", b"plain text, not a package".to_vec()),
        ],
    );

    let config = Config {
        inputs,
        output: dir.path().join("merged.docx"),
        dry_run: true,
        quiet: true,
        overwrite_mode: OverwriteMode::Force,
        ..Default::default()
    };

    let err = Validator::new().validate_config(&config).await.unwrap_err();
    assert!(matches!(err, DocxCatError::MalformedInput { ref name, .. } if name == "bad.docx"));
}
