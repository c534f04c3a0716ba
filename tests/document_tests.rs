mod test_utils;

use std::sync::atomic::{AtomicUsize, Ordering};

use ai_tutor::error::DocumentError;
use ai_tutor::{extract_excerpt, PdfExtractor, Session, TextExtractor};
use crate::test_utils::pdf_with_pages;

#[test]
fn extracts_only_the_first_three_pages() {
    let pdf = pdf_with_pages(&[
        "Alpha first page",
        "Bravo second page",
        "Charlie third page",
        "Delta fourth page",
        "Echo fifth page",
    ]);

    let text = extract_excerpt(&pdf).unwrap();

    assert!(text.contains("Alpha first page"), "got: {text:?}");
    assert!(text.contains("Bravo second page"));
    assert!(text.contains("Charlie third page"));
    assert!(!text.contains("Delta"));
    assert!(!text.contains("Echo"));

    let alpha = text.find("Alpha").unwrap();
    let charlie = text.find("Charlie").unwrap();
    assert!(alpha < charlie, "pages must stay in order");
}

#[test]
fn short_documents_are_read_whole() {
    let pdf = pdf_with_pages(&["The Pacific Ocean is the largest ocean."]);
    let text = extract_excerpt(&pdf).unwrap();
    assert!(text.contains("The Pacific Ocean is the largest ocean."));
}

#[test]
fn page_limit_is_configurable() {
    let pdf = pdf_with_pages(&["Alpha first page", "Bravo second page"]);
    let text = PdfExtractor::with_max_pages(1).extract(&pdf).unwrap();
    assert!(text.contains("Alpha"));
    assert!(!text.contains("Bravo"));
}

#[test]
fn blank_pages_do_not_stop_extraction() {
    let pdf = pdf_with_pages(&["Alpha first page", "", "Charlie third page"]);

    let text = extract_excerpt(&pdf).unwrap();

    let alpha = text.find("Alpha first page").expect("first page text");
    let charlie = text.find("Charlie third page").expect("third page text");
    assert!(alpha < charlie, "got: {text:?}");
}

#[test]
fn empty_page_tree_is_rejected() {
    let pdf = pdf_with_pages(&[]);
    assert!(matches!(extract_excerpt(&pdf), Err(DocumentError::NoPages)));
}

#[test]
fn invalid_bytes_are_a_parse_error() {
    let result = extract_excerpt(b"this is not a pdf");
    assert!(matches!(result, Err(DocumentError::Parse(_))));
}

struct CountingPdf {
    calls: AtomicUsize,
}

impl TextExtractor for CountingPdf {
    fn extract(&self, bytes: &[u8]) -> Result<String, DocumentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        PdfExtractor::default().extract(bytes)
    }
}

#[test]
fn session_extracts_a_real_pdf_once() {
    let session = Session::new(pdf_with_pages(&["Alpha first page"]));
    let extractor = CountingPdf { calls: AtomicUsize::new(0) };

    let first = session.excerpt(&extractor).unwrap().to_string();
    for _ in 0..3 {
        assert_eq!(session.excerpt(&extractor).unwrap(), first);
    }
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn session_loads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chapter.pdf");
    std::fs::write(&path, pdf_with_pages(&["Bravo second page"])).unwrap();

    let session = Session::from_path(&path).unwrap();
    let text = session.excerpt(&PdfExtractor::default()).unwrap();
    assert!(text.contains("Bravo second page"));
}
