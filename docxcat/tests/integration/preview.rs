//! Integration tests for document previews.

use docxcat::error::DocxCatError;
use docxcat::merge::{
    DocumentPreview, PREVIEW_IMAGE_LIMIT, PreviewImage, extract_images, extract_preview,
    preview_images,
};

use crate::common::{Docx, png};

#[test]
fn test_preview_first_paragraphs() {
    let bytes = Docx::new()
        .paragraph("one")
        .paragraph("")
        .paragraph("three")
        .paragraph("four")
        .paragraph("five")
        .paragraph("six")
        .build();

    assert_eq!(extract_preview(&bytes).unwrap(), "one\nthree\nfour\nfive");
}

#[test]
fn test_preview_stops_after_five_of_seven_paragraphs() {
    let bytes = (1..=7)
        .fold(Docx::new(), |doc, n| doc.paragraph(&format!("P{n}")))
        .build();

    assert_eq!(extract_preview(&bytes).unwrap(), "P1\nP2\nP3\nP4\nP5");
}

#[test]
fn test_preview_of_empty_document() {
    let bytes = Docx::new().table("only a table").build();
    assert_eq!(extract_preview(&bytes).unwrap(), "");
}

#[test]
fn test_preview_of_malformed_document() {
    let err = extract_preview(b"garbage").unwrap_err();
    assert!(matches!(err, DocxCatError::MalformedInput { .. }));
}

#[test]
fn test_extract_images_in_order() {
    let first = png(3, 2);
    let second = png(5, 7);
    let bytes = Docx::new()
        .inline_image(first.clone())
        .paragraph("between")
        .image(second.clone())
        .build();

    assert_eq!(extract_images(&bytes).unwrap(), vec![first, second]);
}

#[test]
fn test_preview_images_limit_and_failures() {
    let bytes = Docx::new()
        .image(png(8, 6))
        .image(b"not an image".to_vec())
        .image(png(2, 2))
        .image(png(9, 9))
        .build();

    let images = preview_images(&bytes, PREVIEW_IMAGE_LIMIT).unwrap();
    assert_eq!(images.len(), 3);

    match &images[0] {
        PreviewImage::Decoded(info) => {
            assert_eq!((info.index, info.width, info.height), (1, 8, 6));
            assert_eq!(info.format, "png");
        }
        other => panic!("expected a decoded image, got {other:?}"),
    }
    assert!(matches!(
        images[1],
        PreviewImage::Failed(DocxCatError::ImageDecode { index: 2, .. })
    ));
    assert!(images[2].is_decoded());
}

#[test]
fn test_document_preview() {
    let bytes = Docx::new()
        .paragraph("Summary")
        .inline_image(png(4, 4))
        .build();

    let preview = DocumentPreview::from_bytes("notes.docx", &bytes, PREVIEW_IMAGE_LIMIT).unwrap();
    assert_eq!(preview.name, "notes.docx");
    assert_eq!(preview.text, "Summary");
    assert_eq!(preview.images.len(), 1);
    assert_eq!(preview.failed_images().count(), 0);
}
