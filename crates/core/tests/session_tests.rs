//! Session integration tests
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use graded_core::*;

const ARTICLE_URL: &str = "https://example.com/science/rivers";

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!("../../tests/fixtures/{}", name)).unwrap()
}

fn source_text(request: &CompletionRequest) -> &str {
    request.user.rsplit("Text:\n").next().unwrap_or_default()
}

/// Answers with the prompt's text in upper case.
#[derive(Clone)]
struct Upper;

impl CompletionBackend for Upper {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        Ok(source_text(request).to_uppercase())
    }
}

/// Always fails like a server error.
#[derive(Clone)]
struct Down;

impl CompletionBackend for Down {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
        Err(GradedError::Api { status: 500, message: "upstream unavailable".to_string() })
    }
}

/// Answers with a fixed text.
#[derive(Clone)]
struct Canned(&'static str);

impl CompletionBackend for Canned {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
        Ok(self.0.to_string())
    }
}

/// Earlier requests take longer to answer than later ones.
#[derive(Clone, Default)]
struct SlowFirst {
    calls: Arc<AtomicUsize>,
}

impl CompletionBackend for SlowFirst {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) as u64;
        tokio::time::sleep(Duration::from_millis(40u64.saturating_sub(n * 10))).await;
        Ok(source_text(request).to_uppercase())
    }
}

/// Hands out the same backend for any non-blank key.
struct Fixed<B>(B);

impl<B: CompletionBackend + Clone> Connector for Fixed<B> {
    type Backend = B;

    fn connect(&self, api_key: &str) -> Result<B> {
        if api_key.trim().is_empty() {
            return Err(GradedError::MissingApiKey);
        }
        Ok(self.0.clone())
    }
}

fn session<B: CompletionBackend + Clone>(page: &str, backend: B) -> Session<HtmlPage, Fixed<B>, MemorySink> {
    let page = HtmlPage::parse(&fixture(page), Some(ARTICLE_URL)).unwrap();
    let config = SessionConfig::builder().fade_duration(Duration::ZERO).build();
    Session::new(page, Fixed(backend), MemorySink::default(), config)
}

fn rewrite(level: CefrLevel) -> Command {
    Command::RewritePage { api_key: "sk-test".to_string(), target_level: level }
}

fn summarize(level: CefrLevel) -> Command {
    Command::SummarizePage { api_key: "sk-test".to_string(), target_level: level }
}

#[tokio::test]
async fn test_rewrite_then_reset_restores_markup() {
    let mut session = session("article.html", Upper);
    let before = session.page().markup();

    let response = session.handle(rewrite(CefrLevel::A2)).await;
    assert!(response.success, "{:?}", response.error);
    assert!(response.original_length.unwrap() > 100);
    assert!(response.new_length.is_some());
    assert!(session.is_rewritten());
    assert!(session.page().markup().contains("RIVERS ARE AMONG THE MOST POWERFUL FORCES"));
    assert_eq!(session.page().opacity(), 1.0);

    let response = session.handle(Command::ResetPage).await;
    assert!(response.success);
    assert!(!session.is_rewritten());
    assert_eq!(session.page().markup(), before);
}

#[tokio::test]
async fn test_second_rewrite_reuses_first_snapshot() {
    let mut session = session("article.html", Upper);
    let before = session.page().markup();

    assert!(session.handle(rewrite(CefrLevel::A1)).await.success);
    let captured = session.snapshot().unwrap().len();
    let first_text = session.snapshot().unwrap().get(0).unwrap().original_text.clone();
    assert!(session.handle(rewrite(CefrLevel::C1)).await.success);
    assert_eq!(session.snapshot().unwrap().len(), captured);
    assert_eq!(session.snapshot().unwrap().get(0).unwrap().original_text, first_text);
    assert_ne!(first_text, first_text.to_uppercase());

    assert!(session.handle(Command::ResetPage).await.success);
    assert_eq!(session.page().markup(), before);
}

#[tokio::test]
async fn test_reset_without_rewrite_is_noop() {
    let mut session = session("article.html", Upper);
    let before = session.page().markup();

    let response = session.handle(Command::ResetPage).await;
    assert_eq!(response, Response::reset());
    assert_eq!(session.page().markup(), before);
}

#[tokio::test]
async fn test_rewrite_api_failure_keeps_original_text() {
    let mut session = session("article.html", Down);

    let response = session.handle(rewrite(CefrLevel::B1)).await;
    assert!(response.success);
    assert!(response.error.is_none());

    let markup = session.page().markup();
    assert!(markup.contains("Rivers are among the most powerful forces on the surface of the Earth."));
    assert!(!markup.contains("RIVERS ARE AMONG"));
}

#[tokio::test]
async fn test_rewrite_outcome_counts_fallbacks() {
    let mut session = session("article.html", Down);
    let outcome = session.rewrite_page("sk-test", CefrLevel::B2).await.unwrap();
    assert_eq!(outcome.rewritten_chunks, 0);
    assert!(outcome.fallback_chunks > 0);
    assert!(outcome.report.updated > 0);
}

#[tokio::test]
async fn test_blank_api_key_fails_without_touching_page() {
    let mut session = session("article.html", Upper);
    let before = session.page().markup();

    let response = session
        .handle(Command::RewritePage { api_key: "   ".to_string(), target_level: CefrLevel::B1 })
        .await;
    assert_eq!(response, Response::failure("API key is required"));
    assert!(!session.is_rewritten());
    assert_eq!(session.page().markup(), before);
}

#[tokio::test]
async fn test_page_without_content_fails() {
    let mut session = session("nav_only.html", Upper);

    let response = session.handle(rewrite(CefrLevel::B1)).await;
    assert_eq!(response.error.as_deref(), Some("No readable content found on this page"));
    assert!(!session.is_rewritten());

    let response = session.handle(summarize(CefrLevel::B1)).await;
    assert!(!response.success);
    assert!(session.sink().artifacts.is_empty());
}

#[tokio::test]
async fn test_summarize_saves_artifact() {
    let summary = "Rivers cut valleys.\nThey also build new land.";
    let mut session = session("article.html", Canned(summary));

    let response = session.handle(summarize(CefrLevel::A2)).await;
    assert_eq!(response, Response::summarized(summary.chars().count()));

    let artifacts = &session.sink().artifacts;
    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].file_name, "how_rivers_shape_the_land_summary.html");
    assert_eq!(artifacts[0].media_type, "text/html");
    assert!(artifacts[0].body.contains("Rivers cut valleys.<br>\nThey also build new land."));
    assert!(artifacts[0].body.contains(ARTICLE_URL));
    assert!(!session.is_rewritten());
}

#[tokio::test]
async fn test_summarize_failure_skips_download() {
    let mut session = session("article.html", Down);

    let response = session.handle(summarize(CefrLevel::C2)).await;
    assert!(!response.success);
    assert!(response.error.unwrap().starts_with("Summarization failed"));
    assert!(session.sink().artifacts.is_empty());
}

#[tokio::test]
async fn test_legacy_pdf_export() {
    let page = HtmlPage::parse(&fixture("article.html"), None).unwrap();
    let config = SessionConfig::builder()
        .fade_duration(Duration::ZERO)
        .export_format(ExportFormat::LegacyPdf)
        .build();
    let mut session = Session::new(page, Fixed(Canned("Short.")), MemorySink::default(), config);

    let outcome = session.summarize_page("sk-test", CefrLevel::B1).await.unwrap();
    assert_eq!(outcome.saved_to, "how_rivers_shape_the_land_summary.pdf");
    assert_eq!(session.sink().artifacts[0].media_type, "application/pdf");
}

#[tokio::test]
async fn test_json_messages_round_trip_through_session() {
    let mut session = session("article.html", Upper);

    let command = Command::from_json(r#"{"action":"rewritePage","apiKey":"sk-test","targetLevel":"B1"}"#).unwrap();
    let json: serde_json::Value = serde_json::from_str(&session.handle(command).await.to_json()).unwrap();
    assert_eq!(json["success"], true);
    assert!(json["originalLength"].as_u64().unwrap() > 0);
    assert!(json.get("summaryLength").is_none());
}

#[tokio::test]
async fn test_rewrite_order_independent_of_latency() {
    let text = fixture("article.html");
    let extracted = extract_main_text(&text, &ExtractConfig::default()).unwrap();
    let rewrite = RewriteConfig { chunk: ChunkConfig { sentences_per_chunk: 1, ..Default::default() }, max_concurrent_requests: 4 };

    let sequential = rewrite_text(&Upper, &extracted.text, CefrLevel::B1, &rewrite, &ClientConfig::default()).await;
    let concurrent =
        rewrite_text(&SlowFirst::default(), &extracted.text, CefrLevel::B1, &rewrite, &ClientConfig::default()).await;

    assert!(concurrent.outcomes.len() > 4);
    assert_eq!(concurrent.outcomes, sequential.outcomes);
    assert_eq!(concurrent.text(), sequential.text());
}
