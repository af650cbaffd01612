//! Integration tests for merging documents from disk.

use docxcat::config::{Config, MergeOptions, Metadata, OrderEntry, OverwriteMode};
use docxcat::io::DocxWriter;
use docxcat::merge::{Merger, NamedInput, SEPARATOR_WIDTH, extract_preview, merge_docx, merge_documents};
use tempfile::TempDir;

use crate::common::{Docx, count, part, part_names, png, write_inputs};

fn config_for(dir: &TempDir, inputs: Vec<std::path::PathBuf>) -> Config {
    Config {
        inputs,
        output: dir.path().join("merged.docx"),
        overwrite_mode: OverwriteMode::Force,
        quiet: true,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_merge_two_documents() {
    let dir = TempDir::new().unwrap();
    let inputs = write_inputs(
        &dir,
        vec![
            ("intro.docx", Docx::new().paragraph("Welcome").build()),
            ("body.docx", Docx::new().paragraph("Details").paragraph("More").build()),
        ],
    );

    let (bytes, stats) = merge_docx(&config_for(&dir, inputs)).await.unwrap();
    assert_eq!(stats.files_merged, 2);
    assert_eq!(stats.headings, 2);
    assert!(stats.input_size > 0);
    assert_eq!(stats.output_size, bytes.len() as u64);

    let document = part(&bytes, "word/document.xml");
    let intro = document.find(">intro.docx<").unwrap();
    let welcome = document.find(">Welcome<").unwrap();
    let body = document.find(">body.docx<").unwrap();
    let more = document.find(">More<").unwrap();
    assert!(intro < welcome && welcome < body && body < more);

    let rule = "=".repeat(SEPARATOR_WIDTH);
    assert_eq!(count(&document, &rule), 2);
    assert_eq!(count(&document, r#"<w:pStyle w:val="Heading1"/>"#), 2);
    // Only the output's own section properties survive.
    assert_eq!(count(&document, "<w:sectPr"), 1);
    assert!(!document.contains(r#"w:w="11906""#));
}

#[tokio::test]
async fn test_merged_output_is_readable_again() {
    let dir = TempDir::new().unwrap();
    let inputs = write_inputs(
        &dir,
        vec![
            ("a.docx", Docx::new().paragraph("alpha").build()),
            ("b.docx", Docx::new().paragraph("beta").build()),
        ],
    );
    let config = config_for(&dir, inputs);

    let (bytes, _) = merge_docx(&config).await.unwrap();
    let stats = DocxWriter::new().save_with_stats(bytes, &config.output).await.unwrap();
    assert!(config.output.exists());
    assert_eq!(stats.output_path, config.output);

    let written = std::fs::read(&config.output).unwrap();
    let preview = extract_preview(&written).unwrap();
    assert_eq!(preview, "a.docx\nalpha\n==================================================\nb.docx");
}

#[tokio::test]
async fn test_merge_preserves_formatting_and_styles() {
    let dir = TempDir::new().unwrap();
    let inputs = write_inputs(
        &dir,
        vec![(
            "styled.docx",
            Docx::new()
                .style("Callout")
                .bold("Important")
                .styled("Callout", "Note")
                .table("cell")
                .build(),
        )],
    );

    let (bytes, stats) = merge_docx(&config_for(&dir, inputs)).await.unwrap();
    assert_eq!(stats.styles_imported, 1);

    let document = part(&bytes, "word/document.xml");
    assert!(document.contains("<w:b/>"));
    assert!(document.contains(r#"<w:pStyle w:val="Callout"/>"#));
    assert!(document.contains("<w:tbl>"));

    let styles = part(&bytes, "word/styles.xml");
    assert_eq!(count(&styles, r#"w:styleId="Callout""#), 1);
}

#[tokio::test]
async fn test_plain_text_merge_drops_formatting() {
    let dir = TempDir::new().unwrap();
    let inputs = write_inputs(
        &dir,
        vec![(
            "styled.docx",
            Docx::new()
                .bold("Important")
                .paragraph("   ")
                .table("cell")
                .build(),
        )],
    );
    let mut config = config_for(&dir, inputs);
    config.options = MergeOptions {
        preserve_styles: false,
        preserve_images: true,
    };

    let (bytes, stats) = merge_docx(&config).await.unwrap();
    assert_eq!(stats.styles_imported, 0);

    let document = part(&bytes, "word/document.xml");
    assert!(document.contains(">Important<"));
    assert!(!document.contains("<w:b/>"));
    assert!(!document.contains("<w:tbl>"));
    assert!(!document.contains(">cell<"));
}

#[tokio::test]
async fn test_images_are_rescaled_to_page_width() {
    let dir = TempDir::new().unwrap();
    let inputs = write_inputs(
        &dir,
        vec![("pictures.docx", Docx::new().paragraph("Chart").image(png(40, 10)).build())],
    );

    let (bytes, stats) = merge_docx(&config_for(&dir, inputs)).await.unwrap();
    assert_eq!(stats.images, 1);

    let document = part(&bytes, "word/document.xml");
    assert!(document.contains(r#"<wp:extent cx="5486400" cy="1371600"/>"#));
    assert!(part_names(&bytes).iter().any(|name| name.starts_with("word/media/")));
    assert!(part(&bytes, "word/_rels/document.xml.rels").contains("media/"));
}

#[tokio::test]
async fn test_images_can_be_left_out() {
    let dir = TempDir::new().unwrap();
    let inputs = write_inputs(
        &dir,
        vec![("pictures.docx", Docx::new().paragraph("Chart").image(png(40, 10)).build())],
    );
    let mut config = config_for(&dir, inputs);
    config.options = MergeOptions {
        preserve_styles: true,
        preserve_images: false,
    };

    let (bytes, stats) = merge_docx(&config).await.unwrap();
    assert_eq!(stats.images, 0);
    assert!(!part(&bytes, "word/document.xml").contains("<w:drawing>"));
}

#[tokio::test]
async fn test_inline_image_stored_once() {
    let dir = TempDir::new().unwrap();
    let photo = png(16, 8);
    let inputs = write_inputs(
        &dir,
        vec![("photo.docx", Docx::new().inline_image(photo.clone()).paragraph("Caption").build())],
    );

    let (bytes, stats) = merge_docx(&config_for(&dir, inputs)).await.unwrap();
    assert_eq!(stats.images, 1);

    let media: Vec<_> = part_names(&bytes)
        .into_iter()
        .filter(|name| name.starts_with("word/media/"))
        .collect();
    assert_eq!(media.len(), 1);

    let document = part(&bytes, "word/document.xml");
    assert_eq!(count(&document, "<w:drawing>"), 2);
    let embeds: std::collections::HashSet<_> = document
        .match_indices("r:embed=\"")
        .map(|(i, _)| {
            let rest = &document[i + 9..];
            &rest[..rest.find('"').unwrap()]
        })
        .collect();
    assert_eq!(embeds.len(), 1);
    assert!(document.contains(r#"<wp:extent cx="5486400" cy="2743200"/>"#));
}

#[tokio::test]
async fn test_hyperlinks_survive_merge() {
    let dir = TempDir::new().unwrap();
    let inputs = write_inputs(
        &dir,
        vec![
            ("one.docx", Docx::new().hyperlink("home", "https://example.com/").build()),
            ("two.docx", Docx::new().hyperlink("docs", "https://example.org/").build()),
        ],
    );

    let (bytes, _) = merge_docx(&config_for(&dir, inputs)).await.unwrap();
    let rels = part(&bytes, "word/_rels/document.xml.rels");
    assert!(rels.contains(r#"Target="https://example.com/""#));
    assert!(rels.contains(r#"Target="https://example.org/""#));
    assert_eq!(count(&rels, r#"TargetMode="External""#), 2);
}

#[tokio::test]
async fn test_order_overrides_input_sequence() {
    let dir = TempDir::new().unwrap();
    let inputs = write_inputs(
        &dir,
        vec![
            ("first.docx", Docx::new().paragraph("1").build()),
            ("second.docx", Docx::new().paragraph("2").build()),
            ("third.docx", Docx::new().paragraph("3").build()),
        ],
    );
    let mut config = config_for(&dir, inputs);
    config.order = vec![
        OrderEntry {
            name: "third.docx".to_string(),
            order: 0,
        },
        OrderEntry {
            name: "first.docx".to_string(),
            order: 5,
        },
    ];

    let result = Merger::new().merge(&config).await.unwrap();
    assert_eq!(
        result.merged_names,
        vec!["third.docx", "second.docx", "first.docx"]
    );

    let document = part(&result.bytes, "word/document.xml");
    let third = document.find(">third.docx<").unwrap();
    let second = document.find(">second.docx<").unwrap();
    let first = document.find(">first.docx<").unwrap();
    assert!(third < second && second < first);
}

#[tokio::test]
async fn test_same_name_in_different_directories() {
    let dir = TempDir::new().unwrap();
    let inputs = write_inputs(
        &dir,
        vec![
            ("x/report.docx", Docx::new().paragraph("from x").build()),
            ("y/report.docx", Docx::new().paragraph("from y").build()),
        ],
    );

    let (bytes, stats) = merge_docx(&config_for(&dir, inputs)).await.unwrap();
    assert_eq!(stats.files_merged, 2);

    let document = part(&bytes, "word/document.xml");
    assert_eq!(count(&document, ">report.docx<"), 2);
    assert!(document.find(">from x<").unwrap() < document.find(">from y<").unwrap());
}

#[tokio::test]
async fn test_metadata_written_to_core_properties() {
    let dir = TempDir::new().unwrap();
    let inputs = write_inputs(
        &dir,
        vec![("a.docx", Docx::new().title("Old title").paragraph("text").build())],
    );
    let mut config = config_for(&dir, inputs);
    config.metadata = Metadata::new(
        Some("Quarterly pack".to_string()),
        Some("Finance".to_string()),
        None,
        Some("q3, report".to_string()),
    );

    let (bytes, _) = merge_docx(&config).await.unwrap();
    let core = part(&bytes, "docProps/core.xml");
    assert!(core.contains("<dc:title>Quarterly pack</dc:title>"));
    assert!(core.contains("<dc:creator>Finance</dc:creator>"));
    assert!(core.contains("<cp:keywords>q3, report</cp:keywords>"));
    assert!(!core.contains("Old title"));
}

#[test]
fn test_merge_documents_from_memory() {
    let inputs = vec![
        NamedInput::new("upload-1.docx", Docx::new().paragraph("first").build()),
        NamedInput::new("upload-2.docx", Docx::new().paragraph("second").build()),
    ];
    let mut seen = Vec::new();
    let mut progress = |done: usize, total: usize| seen.push((done, total));

    let bytes = merge_documents(&inputs, MergeOptions::default(), Some(&mut progress)).unwrap();
    assert_eq!(seen, vec![(1, 2), (2, 2)]);
    assert!(part(&bytes, "word/document.xml").contains(">upload-2.docx<"));
}
