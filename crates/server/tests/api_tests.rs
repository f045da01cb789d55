//! Router-level API tests with mock-wired application state.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::util::ServiceExt;

use debridarr_core::config::{DebridConfig, ProxyConfig};
use debridarr_core::testing::{
    fixtures, MockDebridProvider, MockIndexerRegistry, MockMetadataService, MockTorrentFetcher,
};
use debridarr_core::{
    load_config_from_str, Aggregator, IndexerHealth, MemoryCache,
};

// The server crate is a binary; pull its modules in for router tests.
#[path = "../src/api/mod.rs"]
mod api;
#[path = "../src/metrics.rs"]
mod metrics;
#[path = "../src/state.rs"]
mod state;

use state::AppState;

struct TestServer {
    registry: Arc<MockIndexerRegistry>,
    fetcher: Arc<MockTorrentFetcher>,
    provider: Arc<MockDebridProvider>,
    router: axum::Router,
}

fn build_server(config_toml: &str) -> TestServer {
    let config = load_config_from_str(config_toml).unwrap();

    let registry = Arc::new(MockIndexerRegistry::new());
    let metadata = Arc::new(MockMetadataService::new());
    let fetcher = Arc::new(MockTorrentFetcher::new());
    let provider = Arc::new(MockDebridProvider::new());

    metadata.set_title("tt0133093", "The Matrix", Some(1999));

    let aggregator = Arc::new(Aggregator::new(
        Arc::clone(&registry) as Arc<dyn debridarr_core::IndexerRegistry>,
        metadata as Arc<dyn debridarr_core::MetadataService>,
        Arc::clone(&fetcher) as Arc<dyn debridarr_core::TorrentFetcher>,
        Some(Arc::clone(&provider) as Arc<dyn debridarr_core::DebridProvider>),
        Arc::new(MemoryCache::new()),
        Arc::new(IndexerHealth::default()),
        ProxyConfig::default(),
        DebridConfig::default(),
    ));

    let state = Arc::new(AppState::new(config, aggregator));
    let router = api::create_router(state);

    TestServer {
        registry,
        fetcher,
        provider,
        router,
    }
}

async fn get(router: &axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let server = build_server("");
    let (status, body) = get(&server.router, "/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn config_endpoint_redacts_secrets() {
    let server = build_server(
        r#"
[search]
url = "http://localhost:9117"
api_key = "supersecret"

[preferences]
passkey = "a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5d6"
"#,
    );
    let (status, body) = get(&server.router, "/api/v1/config").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["search"]["api_key_configured"], true);
    assert!(body.to_string().find("supersecret").is_none());
    assert_eq!(body["preferences"]["passkey_configured"], true);
}

#[tokio::test]
async fn unknown_media_type_is_rejected() {
    let server = build_server("");
    let (status, _) = get(&server.router, "/stream/music/tt0133093").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stream_listing_without_indexers_is_unavailable() {
    let server = build_server("");
    let (status, _) = get(&server.router, "/stream/movie/tt0133093").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn stream_listing_end_to_end() {
    let server = build_server("");
    server.registry.add_indexer("alpha", true, false).await;

    let torrent = fixtures::torrent("Matrix.1080p", "alpha", 50);
    server.fetcher.set_info(&torrent.link, fixtures::info("h1"));
    server
        .registry
        .set_movie_results("alpha", vec![torrent])
        .await;
    server
        .provider
        .add_cached("h1", vec![fixtures::video_file("matrix.mkv")]);

    let (status, body) = get(&server.router, "/stream/movie/tt0133093.json").await;
    assert_eq!(status, StatusCode::OK);

    let streams = body["streams"].as_array().unwrap();
    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0]["name"], "MD+ 1080p");
    assert!(streams[0]["url"]
        .as_str()
        .unwrap()
        .contains("/download/movie/tt0133093/"));
}

#[tokio::test]
async fn download_redirects_to_resolved_url() {
    let server = build_server("");
    server.registry.add_indexer("alpha", true, false).await;

    let torrent = fixtures::torrent("Matrix.1080p", "alpha", 50);
    server.fetcher.set_info(&torrent.link, fixtures::info("h1"));
    server
        .registry
        .set_movie_results("alpha", vec![torrent.clone()])
        .await;
    server
        .provider
        .add_cached("h1", vec![fixtures::video_file("matrix.mkv")]);

    let uri = format!("/download/movie/tt0133093/{}", torrent.id);
    let response = server
        .router
        .clone()
        .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers().get("location").unwrap();
    assert_eq!(location, "http://provider.example/dl/matrix.mkv");
}

#[tokio::test]
async fn metrics_endpoint_serves_prometheus_text() {
    let server = build_server("");
    let response = server
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("debridarr_http_requests_total"));
}
