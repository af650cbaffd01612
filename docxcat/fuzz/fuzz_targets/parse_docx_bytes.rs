#![no_main]

use docxcat::config::MergeOptions;
use docxcat::merge::{NamedInput, extract_preview, merge_documents, preview_images};
use libfuzzer_sys::fuzz_target;

// Arbitrary bytes must produce an error, never a panic.
fuzz_target!(|data: &[u8]| {
    let _ = extract_preview(data);
    let _ = preview_images(data, 1);

    let inputs = [NamedInput::new("fuzz.docx", data)];
    let _ = merge_documents(&inputs, MergeOptions::default(), None);
});
