use super::*;
use tokio_stream::StreamExt;

#[tokio::test]
async fn test_health_endpoint() {
    let (downloader, _temp_dir) = create_test_downloader(vec![]);

    let response = send(&downloader, get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_openapi_endpoint_lists_routes() {
    let (downloader, _temp_dir) = create_test_downloader(vec![]);

    let response = send(&downloader, get("/openapi.json")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["info"]["title"], "mediadl REST API");
    let paths = body["paths"].as_object().unwrap();
    for path in [
        "/download",
        "/status/{task_id}",
        "/files/{path}",
        "/list_downloads",
        "/open_downloads",
        "/reveal/{path}",
    ] {
        assert!(paths.contains_key(path), "missing {}", path);
    }
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (downloader, _temp_dir) = create_test_downloader(vec![]);

    let response = send(&downloader, get("/api/v1/downloads")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_event_stream_delivers_task_events() {
    let (downloader, _temp_dir) = create_test_downloader(vec![Step::WaitForRelease]);

    let response = send(&downloader, get("/events")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream")
    );

    // The subscription exists once the handler has returned
    let task_id = downloader
        .dispatch("https://example.com/live", Default::default())
        .unwrap();

    let mut stream = response.into_body().into_data_stream();
    let mut received = String::new();
    let found = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(chunk) = stream.next().await {
            received.push_str(&String::from_utf8_lossy(&chunk.unwrap()));
            if received.contains("event: task_created") && received.contains(task_id.as_str()) {
                return true;
            }
        }
        false
    })
    .await
    .unwrap_or(false);

    assert!(found, "stream did not carry task_created: {:?}", received);
}
