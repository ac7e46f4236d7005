//! Library API integration tests
use graded_core::*;

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(get_fixture_path(name)).unwrap()
}

#[test]
fn test_extract_prefers_main_content() {
    let extracted = extract_main_text(&read_fixture("article.html"), &ExtractConfig::default()).unwrap();

    assert_eq!(extracted.source, ContentSource::Selector("main".to_string()));
    assert!(extracted.text.starts_with("How Rivers Shape the Land"));
    assert!(extracted.text.contains("The delta that forms there can be very fertile."));
    assert!(!extracted.text.contains("Home"));
    assert!(!extracted.text.contains("Copyright"));
    assert!(!extracted.truncated);
}

#[test]
fn test_extract_falls_back_to_stripped_body() {
    let extracted = extract_main_text(&read_fixture("nav_only.html"), &ExtractConfig::default()).unwrap();

    assert_eq!(extracted.source, ContentSource::Body);
    assert!(extracted.is_empty());
}

#[test]
fn test_extract_truncates_long_pages() {
    let config = ExtractConfig { max_len: 120, ..Default::default() };
    let extracted = extract_main_text(&read_fixture("article.html"), &config).unwrap();

    assert!(extracted.truncated);
    assert_eq!(extracted.char_len(), 120);
}

#[test]
fn test_chunk_extracted_article() {
    let extracted = extract_main_text(&read_fixture("article.html"), &ExtractConfig::default()).unwrap();
    let chunks: Vec<Chunk> = chunk_text(&extracted.text, &ChunkConfig::default()).collect();

    assert!(chunks.len() >= 3);
    assert!(chunks.iter().enumerate().all(|(i, c)| c.index == i));
    assert!(chunks.iter().all(|c| c.sentence_count <= 4));
    assert!(chunks[0].needs_processing());

    let sentence_total: usize = chunks.iter().map(|c| c.sentence_count).sum();
    assert_eq!(sentence_total, sentences(&extracted.text).count());
}

#[test]
fn test_capture_and_restore_fixture() {
    let mut page = HtmlPage::parse(&read_fixture("article.html"), None).unwrap();
    let before = page.markup();
    let snapshot = capture(&page, &PatchConfig::default()).unwrap();

    let texts: Vec<&str> = snapshot.iter().map(|e| e.original_text.trim()).collect();
    assert_eq!(texts.first(), Some(&"How Rivers Shape the Land"));
    assert_eq!(texts.last(), Some(&"Copyright 2026 Field Notes Weekly. All rights reserved."));
    assert!(!texts.contains(&"Home"));

    let report = apply(&mut page, &snapshot, &["Plain words.".to_string()], &PatchConfig::default()).unwrap();
    assert_eq!(report.updated, snapshot.len());
    assert!(page.markup().contains("<em></em>"));

    restore(&mut page, &snapshot).unwrap();
    assert_eq!(page.markup(), before);
}

#[test]
fn test_page_metadata() {
    let page = HtmlPage::parse(&read_fixture("article.html"), Some("https://example.com/rivers")).unwrap();
    assert_eq!(page.title().as_deref(), Some("How Rivers Shape the Land"));
    assert_eq!(page.url(), Some("https://example.com/rivers"));
    assert_eq!(sanitize_file_stem(&page.title().unwrap()), "how_rivers_shape_the_land");
}

#[test]
fn test_invalid_page_url() {
    assert!(matches!(HtmlPage::parse("<p>x</p>", Some("not a url")), Err(GradedError::InvalidUrl(_))));
}
