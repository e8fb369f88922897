//! Integration tests for discovery with a real browser.
//!
//! These tests launch a headless Chrome/Chromium instance via CDP against a
//! small local documentation site. They are `#[ignore]` by default because
//! they require a Chrome/Chromium binary installed.
//!
//! Run with:
//!   cargo test -p mcp-swagger-core --test discovery_browser -- --ignored

use axum::{http::header, response::Html, routing::get, Router};
use mcp_swagger_core::browser::{BrowserManager, BrowserManagerConfig};
use mcp_swagger_core::discovery::DiscoveryConfig;
use mcp_swagger_core::projection::ExploreOptions;
use mcp_swagger_core::{Error, Explorer};
use std::net::SocketAddr;
use std::sync::Arc;

const FETCHING_PAGE: &str = r#"<!doctype html>
<html><body>
<div id="swagger-ui"></div>
<script>fetch('/openapi.json').then(r => r.json()).then(spec => { window.loaded = spec; });</script>
</body></html>"#;

const YAML_PAGE: &str = r#"<!doctype html>
<html><body>
<script>fetch('/swagger.yaml').then(r => r.text());</script>
</body></html>"#;

const INLINE_PAGE: &str = r#"<!doctype html>
<html><body>
<script>window.ui = { spec: { json: { swagger: "2.0", definitions: { Order: {}, Customer: {} } } } };</script>
</body></html>"#;

const EMPTY_PAGE: &str = "<!doctype html><html><body><h1>No docs here</h1></body></html>";

const OPENAPI_JSON: &str = r#"{"openapi":"3.0.0","paths":{"/pets":{"get":{},"post":{}}}}"#;

const SWAGGER_YAML: &str = "swagger: '2.0'\npaths:\n  /orders:\n    get:\n      responses:\n        200:\n          description: ok\n";

/// Serve the fixture site on an ephemeral port.
async fn serve_site() -> SocketAddr {
    let app = Router::new()
        .route("/docs", get(|| async { Html(FETCHING_PAGE) }))
        .route("/yaml-docs", get(|| async { Html(YAML_PAGE) }))
        .route("/inline-docs", get(|| async { Html(INLINE_PAGE) }))
        .route("/empty", get(|| async { Html(EMPTY_PAGE) }))
        .route(
            "/openapi.json",
            get(|| async { ([(header::CONTENT_TYPE, "application/json")], OPENAPI_JSON) }),
        )
        .route(
            "/swagger.yaml",
            get(|| async { ([(header::CONTENT_TYPE, "application/yaml")], SWAGGER_YAML) }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn test_explorer() -> (Explorer, Arc<BrowserManager>) {
    let manager = Arc::new(
        BrowserManager::launch(BrowserManagerConfig::default())
            .await
            .expect("browser launch"),
    );
    let explorer = Explorer::new(manager.clone(), DiscoveryConfig::default());
    (explorer, manager)
}

fn all() -> ExploreOptions {
    ExploreOptions {
        paths: true,
        schemas: true,
        method_filter: None,
    }
}

#[tokio::test]
#[ignore]
async fn test_spec_captured_from_network() {
    let addr = serve_site().await;
    let (explorer, manager) = test_explorer().await;

    let result = explorer
        .explore(&format!("http://{}/docs", addr), &all())
        .await
        .expect("explore should succeed");

    let paths = result.paths.unwrap();
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].path, "/pets");
    assert_eq!(paths[0].methods, vec!["get", "post"]);

    manager.shutdown().await;
}

#[tokio::test]
#[ignore]
async fn test_yaml_spec_captured_from_network() {
    let addr = serve_site().await;
    let (explorer, manager) = test_explorer().await;

    let responses = explorer
        .response_schemas(&format!("http://{}/yaml-docs", addr), "/orders", "get")
        .await
        .expect("response schemas should succeed");

    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].code, "200");
    assert_eq!(responses[0].description, "ok");

    manager.shutdown().await;
}

#[tokio::test]
#[ignore]
async fn test_spec_read_from_page_state() {
    let addr = serve_site().await;
    let (explorer, manager) = test_explorer().await;

    let result = explorer
        .explore(&format!("http://{}/inline-docs", addr), &all())
        .await
        .expect("explore should succeed");

    assert_eq!(
        result.schemas,
        Some(vec!["Order".to_string(), "Customer".to_string()])
    );

    manager.shutdown().await;
}

#[tokio::test]
#[ignore]
async fn test_page_without_spec() {
    let addr = serve_site().await;
    let (explorer, manager) = test_explorer().await;

    let err = explorer
        .explore(&format!("http://{}/empty", addr), &all())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound));

    manager.shutdown().await;
}
