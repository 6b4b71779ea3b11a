use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use tubesearch_api::{
    api::{create_router, AppState},
    db::MemoryCache,
    models::RawCandidate,
    services::{SearchService, SearchSettings, UpstreamResolver},
};

/// Resolver double that counts calls and can be made slow or failing
struct FakeResolver {
    calls: AtomicUsize,
    delay: Duration,
    fail_with: Option<String>,
    candidates: Vec<RawCandidate>,
}

impl FakeResolver {
    fn returning(candidates: Vec<RawCandidate>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            fail_with: None,
            candidates,
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::returning(vec![RawCandidate::new("late")])
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::returning(Vec::new())
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl UpstreamResolver for FakeResolver {
    async fn resolve(&self, _query: &str) -> anyhow::Result<Vec<RawCandidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.fail_with {
            Some(message) => Err(anyhow::anyhow!(message.clone())),
            None => Ok(self.candidates.clone()),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

fn create_test_server(resolver: Arc<FakeResolver>, settings: SearchSettings) -> TestServer {
    let cache = Arc::new(MemoryCache::new(100));
    let service = SearchService::new(resolver, cache, settings);
    let app = create_router(AppState::new(service));
    TestServer::new(app).unwrap()
}

fn sample_candidates() -> Vec<RawCandidate> {
    vec![
        RawCandidate::new("abc123").with_title("Foo").with_thumbnail(""),
        RawCandidate::default().with_title("No id, dropped"),
        RawCandidate::new("def456")
            .with_title("Bar")
            .with_thumbnail("https://i.ytimg.com/vi/def456/hq720.jpg"),
    ]
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(Arc::new(FakeResolver::returning(vec![])), SearchSettings::default());

    for path in ["/", "/health"] {
        let response = server.get(path).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
    }
}

#[tokio::test]
async fn test_search_returns_normalized_results() {
    let resolver = Arc::new(FakeResolver::returning(sample_candidates()));
    let server = create_test_server(resolver.clone(), SearchSettings::default());

    let response = server.get("/search").add_query_param("query", "foo").await;
    response.assert_status_ok();

    let body: Value = response.json();
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(
        results[0],
        json!({
            "title": "Foo",
            "url": "https://www.youtube.com/watch?v=abc123",
            "thumbnail": "https://i.ytimg.com/vi/abc123/mqdefault.jpg"
        })
    );
    assert_eq!(results[1]["thumbnail"], "https://i.ytimg.com/vi/def456/hq720.jpg");
    assert!(results.iter().all(|r| !r["url"].as_str().unwrap().is_empty()));
}

#[tokio::test]
async fn test_equivalent_queries_hit_cache() {
    let resolver = Arc::new(FakeResolver::returning(sample_candidates()));
    let server = create_test_server(resolver.clone(), SearchSettings::default());

    let first = server.get("/search").add_query_param("query", "Lofi Beats").await;
    let second = server.get("/search").add_query_param("query", "  lofi BEATS ").await;

    first.assert_status_ok();
    second.assert_status_ok();
    assert_eq!(first.text(), second.text());
    assert_eq!(resolver.calls(), 1);
}

#[tokio::test]
async fn test_empty_query_is_bad_request() {
    let resolver = Arc::new(FakeResolver::returning(sample_candidates()));
    let server = create_test_server(resolver.clone(), SearchSettings::default());

    let missing = server.get("/search").await;
    missing.assert_status(StatusCode::BAD_REQUEST);
    assert!(missing.json::<Value>()["error"].is_string());

    for query in ["", "   "] {
        let response = server.get("/search").add_query_param("query", query).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(response.json::<Value>()["error"].is_string());
    }

    assert_eq!(resolver.calls(), 0);
}

#[tokio::test]
async fn test_slow_resolver_times_out() {
    let resolver = Arc::new(FakeResolver::slow(Duration::from_secs(10)));
    let settings = SearchSettings {
        resolve_timeout: Duration::from_millis(200),
        ..SearchSettings::default()
    };
    let server = create_test_server(resolver.clone(), settings);

    let started = Instant::now();
    let response = server.get("/search").add_query_param("query", "slow").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("timed out"));
    assert!(started.elapsed() < Duration::from_millis(1200));
}

#[tokio::test]
async fn test_upstream_failure_hides_raw_error() {
    let resolver = Arc::new(FakeResolver::failing("ERROR: [youtube] Sign in to confirm you're not a bot"));
    let server = create_test_server(resolver.clone(), SearchSettings::default());

    let response = server.get("/search").add_query_param("query", "blocked").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json();
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("try again later"));
    assert!(!message.contains("Sign in"));

    // Failed attempts are never cached.
    server.get("/search").add_query_param("query", "blocked").await;
    assert_eq!(resolver.calls(), 2);
}

#[tokio::test]
async fn test_empty_results_are_cached() {
    let resolver = Arc::new(FakeResolver::returning(Vec::new()));
    let server = create_test_server(resolver.clone(), SearchSettings::default());

    for _ in 0..3 {
        let response = server.get("/search").add_query_param("query", "qwertyuiopasdf").await;
        response.assert_status_ok();
        response.assert_json(&json!({ "results": [] }));
    }

    assert_eq!(resolver.calls(), 1);
}

#[tokio::test]
async fn test_responses_carry_request_id_and_cors() {
    let server = create_test_server(Arc::new(FakeResolver::returning(vec![])), SearchSettings::default());

    let response = server
        .get("/health")
        .add_header(header::ORIGIN, HeaderValue::from_static("https://example.com"))
        .await;

    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server(Arc::new(FakeResolver::returning(vec![])), SearchSettings::default());

    let response = server
        .get("/health")
        .add_header(
            header::HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("6f1c2a9e-3b4d-4e5f-8a7b-9c0d1e2f3a4b"),
        )
        .await;

    assert_eq!(
        response.header("x-request-id"),
        "6f1c2a9e-3b4d-4e5f-8a7b-9c0d1e2f3a4b"
    );
}
