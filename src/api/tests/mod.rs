use super::*;
use crate::downloader::test_helpers::Step;
use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use axum::response::Response;
use std::time::Duration;
use tower::ServiceExt;

mod system;

/// Helper to create a test MediaDownloader instance wrapped in Arc
fn create_test_downloader(steps: Vec<Step>) -> (Arc<MediaDownloader>, tempfile::TempDir) {
    let (downloader, temp_dir) = crate::downloader::test_helpers::create_test_downloader(steps);
    (Arc::new(downloader), temp_dir)
}

/// Router over a downloader using its own configuration
fn app_for(downloader: &Arc<MediaDownloader>) -> Router {
    create_router(downloader.clone(), downloader.config.clone())
}

/// Send one request through a fresh router
async fn send(downloader: &Arc<MediaDownloader>, request: Request<Body>) -> Response {
    app_for(downloader).oneshot(request).await.unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn json_body(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_api_server_spawns() {
    let (downloader, _temp_dir) = create_test_downloader(vec![]);

    // Port 0 = OS assigns a free port
    let mut config = (*downloader.config).clone();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let api_handle = tokio::spawn({
        let downloader = downloader.clone();
        let config = config.clone();
        async move { start_api_server(downloader, config).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!api_handle.is_finished(), "server should still be running");
    api_handle.abort();
}

#[tokio::test]
async fn test_graceful_shutdown_stops_the_server() {
    let (downloader, _temp_dir) = create_test_downloader(vec![]);

    let mut config = (*downloader.config).clone();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let api_handle = tokio::spawn(start_api_server_with_shutdown(
        downloader,
        config,
        async move {
            stop_rx.await.ok();
        },
    ));

    tokio::time::sleep(Duration::from_millis(50)).await;
    stop_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), api_handle)
        .await
        .expect("server should stop after the shutdown signal")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_bind_failure_is_an_io_error() {
    let (downloader, _temp_dir) = create_test_downloader(vec![]);

    let blocker = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let mut config = (*downloader.config).clone();
    config.api.bind_address = blocker.local_addr().unwrap();

    let err = start_api_server(downloader, Arc::new(config))
        .await
        .unwrap_err();
    assert!(matches!(err, crate::Error::Io(_)));
}

/// Router with CORS enabled for `origins`
fn cors_app(downloader: &Arc<MediaDownloader>, origins: &[&str]) -> Router {
    let mut config = (*downloader.config).clone();
    config.api.cors_enabled = true;
    config.api.cors_origins = origins.iter().map(|o| o.to_string()).collect();
    create_router(downloader.clone(), Arc::new(config))
}

fn get_from(uri: &str, origin: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Origin", origin)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_cors_disabled_by_default() {
    let (downloader, _temp_dir) = create_test_downloader(vec![]);
    std::fs::write(downloader.download_root().join("private.mp4"), b"private").unwrap();

    let response = send(
        &downloader,
        get_from("/files/private.mp4", "https://evil.example"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin"),
        "default configuration must not grant cross-origin reads"
    );
}

#[tokio::test]
async fn test_cors_wildcard_when_enabled() {
    let (downloader, _temp_dir) = create_test_downloader(vec![]);

    let response = cors_app(&downloader, &["*"])
        .oneshot(get_from("/health", "http://localhost:3000"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let (downloader, _temp_dir) = create_test_downloader(vec![]);

    let response = cors_app(&downloader, &["http://localhost:3000"])
        .oneshot(get_from("/health", "http://localhost:3000"))
        .await
        .unwrap();
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:3000"
    );

    let response = cors_app(&downloader, &["http://localhost:3000"])
        .oneshot(get_from("/list_downloads", "https://evil.example"))
        .await
        .unwrap();
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_cors_enabled_without_origins_allows_none() {
    let (downloader, _temp_dir) = create_test_downloader(vec![]);

    let response = cors_app(&downloader, &[])
        .oneshot(get_from("/health", "http://localhost:3000"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_swagger_ui_toggle() {
    let (downloader, _temp_dir) = create_test_downloader(vec![]);

    let response = send(&downloader, get("/swagger-ui/")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut config = (*downloader.config).clone();
    config.api.swagger_ui = false;
    let app = create_router(downloader, Arc::new(config));
    let response = app.oneshot(get("/swagger-ui/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_spawn_api_server_method() {
    let (downloader, _temp_dir) = create_test_downloader(vec![]);

    // Default port may be taken on the test host; only the spawn path is exercised
    let api_handle = downloader.spawn_api_server();
    tokio::time::sleep(Duration::from_millis(50)).await;
    api_handle.abort();
}
