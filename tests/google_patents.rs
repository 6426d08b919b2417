use std::fs;

use patent_citations::fetcher::{PatentPage, extract_page};

#[test]
fn extract_fields_from_patent_page() {
    let html = fs::read_to_string("tests/fixtures/patent_page.html").unwrap();
    let page = extract_page(&html);

    assert_eq!(
        page.title.as_deref(),
        Some("US7654321B2 - Method and apparatus for secure key exchange")
    );
    assert_eq!(
        page.abstract_text.as_deref(),
        Some("A method for exchanging keys between two parties over an untrusted network.")
    );
    assert_eq!(page.cpc_classes, vec!["H04L9/0841", "G06F21/60"]);
    assert_eq!(
        page.first_claim.as_deref(),
        Some("1. A method comprising: generating a key pair.")
    );
    assert_eq!(
        page.image_url.as_deref(),
        Some("https://patentimages.storage.googleapis.com/full/US7654321B2-D00000.png")
    );
}

#[test]
fn empty_page_yields_nothing() {
    let page = extract_page("<html><body><p>Not found</p></body></html>");
    assert_eq!(page, PatentPage::default());
}

#[test]
fn title_falls_back_to_meta() {
    let page = extract_page(
        r#"<html><head><meta name="DC.title" content="  Widget
        assembly "></head><body></body></html>"#,
    );
    assert_eq!(page.title.as_deref(), Some("Widget assembly"));
}
