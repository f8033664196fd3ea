//! Library API integration tests
mod common;

use std::time::Duration;

use common::*;
use pitchlens_core::*;

const LANDING: &str = r#"<html><head><title>Acme</title></head><body>
<nav>menu</nav>
<main><h1>Great product, buy now!</h1><p>Ships in a day.</p></main>
<footer>Copyright</footer>
</body></html>"#;

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn fast_config(max_attempts: u32) -> AnalyzerConfig {
    AnalyzerConfig::builder()
        .max_attempts(max_attempts)
        .initial_delay(Duration::from_millis(100))
        .jitter(0.0)
        .build()
}

fn local_extractor() -> Extractor {
    Extractor::with_client(local_client(), FetchConfig::default())
}

#[tokio::test]
async fn test_extract_over_http() {
    let server = TestServer::start(vec![Canned::html(LANDING)]).await;

    let page = local_extractor().extract(&format!("{}/landing", server.url)).await.unwrap();

    assert!(page.text().contains("Great product, buy now!"));
    assert!(!page.text().contains("menu"));
    assert!(!page.text().contains("Copyright"));
    assert_eq!(page.title(), Some("Acme"));
    assert_eq!(page.hook_text(), "Great product, buy now! Ships in a day.");

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("GET /landing"));
    assert!(requests[0].to_lowercase().contains("user-agent: mozilla/5.0"));
}

#[tokio::test]
async fn test_extract_non_success_status() {
    let server = TestServer::start(vec![Canned::new(404, "text/html", "<h1>Not here</h1>")]).await;

    let err = local_extractor().extract(&server.url).await.unwrap_err();
    assert!(matches!(err, PitchlensError::Fetch { status: 404 }));
}

#[tokio::test]
async fn test_extract_binary_content() {
    let png = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00];
    let server = TestServer::start(vec![Canned::new(200, "image/png", png)]).await;

    let err = local_extractor().extract(&server.url).await.unwrap_err();
    assert!(matches!(err, PitchlensError::UnsupportedContent(_)));
}

#[tokio::test]
async fn test_extract_decodes_declared_charset() {
    let latin1 = b"<html><body><p>Caf\xe9 cr\xe8me</p></body></html>".to_vec();
    let server = TestServer::start(vec![Canned::new(200, "text/html; charset=iso-8859-1", latin1)]).await;

    let page = local_extractor().extract(&server.url).await.unwrap();

    assert_eq!(page.text(), "Café crème");
    assert!(!page.text().contains('\u{FFFD}'));
}

#[tokio::test]
async fn test_extract_rejects_nul_bytes() {
    let body = b"<p>looks like text\x00\x01\x02</p>".to_vec();
    let server = TestServer::start(vec![Canned::new(200, "text/html", body)]).await;

    let err = local_extractor().extract(&server.url).await.unwrap_err();
    assert!(matches!(err, PitchlensError::UnsupportedContent(_)));
}

#[tokio::test]
async fn test_extract_unreachable_host() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = local_extractor().extract(&format!("http://{}", addr)).await.unwrap_err();
    assert!(matches!(err, PitchlensError::Network(_)));
}

#[tokio::test]
async fn test_extract_timeout() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let config = FetchConfig { timeout: 1, ..FetchConfig::default() };
    let extractor = Extractor::with_client(local_client(), config);

    let err = extractor.extract(&format!("http://{}", addr)).await.unwrap_err();
    assert!(matches!(err, PitchlensError::Network(_)));
}

#[tokio::test]
async fn test_invalid_url_makes_no_request() {
    let err = local_extractor().extract("not a url").await.unwrap_err();
    assert!(matches!(err, PitchlensError::InvalidUrl(_)));
}

#[test]
fn test_extract_fixture() {
    let html = std::fs::read_to_string(get_fixture_path("landing.html")).unwrap();
    let page = extract_from_html(&html, "https://acme.example/").unwrap();

    assert!(!page.is_empty());
    assert!(!page.hook_text().is_empty());
    assert!(page.text().starts_with(page.hook_text().split(' ').next().unwrap()));
    assert!(!page.text().contains("Pricing"));
}

#[test]
fn test_extract_empty_fixture() {
    let html = std::fs::read_to_string(get_fixture_path("empty.html")).unwrap();
    let page = extract_from_html(&html, "https://acme.example/empty").unwrap();

    assert!(page.is_empty());
    assert_eq!(page.word_count(), 0);
}

#[tokio::test]
async fn test_analyze_blank_text_makes_no_call() {
    let transport = ScriptedTransport::always(Ok(VALID_ANALYSIS.to_string()));
    let analyzer = Analyzer::new(transport.clone());

    for input in ["", "   ", "\n\t"] {
        let err = analyzer.analyze(input).await.unwrap_err();
        assert!(matches!(err, PitchlensError::InvalidInput(_)), "{:?}", err);
    }
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_analyze_success() {
    let transport = ScriptedTransport::new(vec![Ok(VALID_ANALYSIS.to_string())]);
    let sleeper = RecordingSleeper::default();
    let analyzer = Analyzer::new(transport.clone()).with_sleeper(sleeper.clone());

    let result = analyzer.analyze("Leverage our synergy matrix today.").await.unwrap();

    assert!(result.hook_score() <= 100);
    assert_eq!(result.hook_score(), 42);
    assert!(!result.audience_persona().is_empty());
    assert_eq!(result.conversion_killers().len(), 3);
    assert_eq!(result.hook_rating(), HookRating::Weak);
    assert_eq!(transport.calls(), 1);
    assert!(sleeper.waits().is_empty());
}

#[tokio::test]
async fn test_analyze_recovers_from_transient_failures() {
    let transport = ScriptedTransport::new(vec![
        Err(rate_limited()),
        Err(server_error()),
        Ok(VALID_ANALYSIS.to_string()),
    ]);
    let sleeper = RecordingSleeper::default();
    let analyzer = Analyzer::with_config(transport.clone(), fast_config(5)).with_sleeper(sleeper.clone());

    let result = analyzer.analyze("Copy").await.unwrap();

    assert_eq!(result.hook_score(), 42);
    assert_eq!(transport.calls(), 3);

    let waits = sleeper.waits();
    assert_eq!(waits, vec![Duration::from_millis(100), Duration::from_millis(200)]);
    assert!(waits[1] > waits[0]);
}

#[tokio::test]
async fn test_analyze_gives_up_after_max_attempts() {
    let transport = ScriptedTransport::always(Err(rate_limited()));
    let sleeper = RecordingSleeper::default();
    let analyzer = Analyzer::with_config(transport.clone(), fast_config(4)).with_sleeper(sleeper.clone());

    let err = analyzer.analyze("Copy").await.unwrap_err();

    match err {
        PitchlensError::ServiceUnavailable { attempts, source } => {
            assert_eq!(attempts, 4);
            assert!(matches!(source, ServiceError::RateLimited { .. }));
        }
        other => panic!("expected ServiceUnavailable, got {:?}", other),
    }
    assert_eq!(transport.calls(), 4);
    assert_eq!(sleeper.waits().len(), 3);
}

#[tokio::test]
async fn test_analyze_auth_failure_is_not_retried() {
    let transport = ScriptedTransport::always(Err(ServiceError::Auth("API key not valid".to_string())));
    let sleeper = RecordingSleeper::default();
    let analyzer = Analyzer::new(transport.clone()).with_sleeper(sleeper.clone());

    let err = analyzer.analyze("Copy").await.unwrap_err();

    assert!(matches!(err, PitchlensError::Auth(_)));
    assert_eq!(transport.calls(), 1);
    assert!(sleeper.waits().is_empty());
}

#[tokio::test]
async fn test_analyze_bad_request_is_not_retried() {
    let transport = ScriptedTransport::always(Err(ServiceError::BadRequest {
        status: 400,
        message: "Invalid JSON payload received".to_string(),
    }));
    let analyzer = Analyzer::new(transport.clone()).with_sleeper(RecordingSleeper::default());

    let err = analyzer.analyze("Copy").await.unwrap_err();

    assert!(matches!(err, PitchlensError::MalformedRequest(_)));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_analyze_rejects_schema_violations_without_retry() {
    let two_killers = r#"{"hook_score": 70, "audience_persona": "Founders.", "conversion_killers": ["a", "b"]}"#;
    let transport = ScriptedTransport::always(Ok(two_killers.to_string()));
    let sleeper = RecordingSleeper::default();
    let analyzer = Analyzer::new(transport.clone()).with_sleeper(sleeper.clone());

    let err = analyzer.analyze("Copy").await.unwrap_err();

    assert!(matches!(err, PitchlensError::SchemaValidation(_)));
    assert_eq!(transport.calls(), 1);
    assert!(sleeper.waits().is_empty());
}

#[tokio::test]
async fn test_analyzer_is_shareable() {
    let transport = ScriptedTransport::always(Ok(VALID_ANALYSIS.to_string()));
    let analyzer = std::sync::Arc::new(Analyzer::new(transport.clone()));

    let first = tokio::spawn({
        let analyzer = analyzer.clone();
        async move { analyzer.analyze("First page").await }
    });
    let second = tokio::spawn({
        let analyzer = analyzer.clone();
        async move { analyzer.analyze("Second page").await }
    });

    assert!(first.await.unwrap().is_ok());
    assert!(second.await.unwrap().is_ok());
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_extract_then_analyze() {
    let server = TestServer::start(vec![Canned::html(LANDING)]).await;
    let page = local_extractor().extract(&server.url).await.unwrap();

    let transport = ScriptedTransport::always(Ok(VALID_ANALYSIS.to_string()));
    let analyzer = Analyzer::new(transport.clone());

    let result = analyzer.analyze_page(&page).await.unwrap();
    assert_eq!(result.conversion_killers()[0], "synergy matrix");
    assert_eq!(transport.calls(), 1);
}
