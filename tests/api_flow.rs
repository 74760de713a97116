//! End-to-end flow through the public API with a stand-in engine
//!
//! The engine below behaves like a well-behaved yt-dlp run: it reports
//! progress, writes its output into the requested directory and announces
//! the final path through the post-processor hook.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use mediadl::engine::{
    EngineEvent, EngineObserver, EngineRequest, PostProcessorEvent, PostProcessorStatus,
    ProgressEvent, ProgressStatus,
};
use mediadl::{Config, DownloadEngine, Event, MediaDownloader, PlatformOpener, TaskStatus};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

struct FakeEngine;

#[async_trait]
impl DownloadEngine for FakeEngine {
    async fn download(
        &self,
        request: &EngineRequest,
        observer: Arc<dyn EngineObserver>,
    ) -> mediadl::Result<()> {
        for (index, url) in request.urls.iter().enumerate() {
            if url.contains("broken") {
                return Err(mediadl::Error::Engine(format!(
                    "ERROR: Unsupported URL: {}",
                    url
                )));
            }

            let name = format!("video-{}.mp4", index);
            let mut progress = ProgressEvent::new(ProgressStatus::Downloading);
            progress.downloaded_bytes = Some(512);
            progress.total_bytes = Some(1024);
            progress.filename = Some(name.clone());
            observer.on_event(EngineEvent::Progress(progress));

            let path = request.output_dir.join(&name);
            tokio::fs::write(&path, vec![0u8; 1024]).await?;

            let mut finished = ProgressEvent::new(ProgressStatus::Finished);
            finished.filename = Some(name);
            observer.on_event(EngineEvent::Progress(finished));

            observer.on_event(EngineEvent::PostProcessor(PostProcessorEvent {
                status: PostProcessorStatus::Finished,
                postprocessor: "MoveFiles".to_string(),
                filepath: Some(path),
                filename: None,
            }));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

fn downloader() -> (Arc<MediaDownloader>, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.download.download_dir = temp_dir.path().join("media");
    config.file_manager.enabled = false;

    let downloader = MediaDownloader::with_engine(config, Arc::new(FakeEngine))
        .unwrap()
        .with_opener(PlatformOpener::Disabled);
    (Arc::new(downloader), temp_dir)
}

async fn call(
    downloader: &Arc<MediaDownloader>,
    request: Request<Body>,
) -> (StatusCode, serde_json::Value) {
    let app = mediadl::api::create_router(downloader.clone(), Arc::new(downloader.config().clone()));
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, body)
}

async fn submit(downloader: &Arc<MediaDownloader>, url: &str) -> String {
    let request = Request::builder()
        .method("POST")
        .uri("/download")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::json!({ "url": url }).to_string()))
        .unwrap();
    let (status, body) = call(downloader, request).await;
    assert_eq!(status, StatusCode::OK);
    body["task_id"].as_str().unwrap().to_string()
}

async fn poll(downloader: &Arc<MediaDownloader>, task_id: &str) -> serde_json::Value {
    for _ in 0..500 {
        let request = Request::builder()
            .uri(format!("/status/{}", task_id))
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(downloader, request).await;
        assert_eq!(status, StatusCode::OK);
        if body["status"] != "running" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("task {} never finished", task_id);
}

#[tokio::test]
async fn multi_url_job_produces_downloadable_files() {
    let (downloader, _temp_dir) = downloader();

    let task_id = submit(
        &downloader,
        "https://example.com/a\nhttps://example.com/b",
    )
    .await;
    let status = poll(&downloader, &task_id).await;

    assert_eq!(status["status"], "completed");
    assert_eq!(
        status["files"],
        serde_json::json!(["video-0.mp4", "video-1.mp4"])
    );
    assert_eq!(status["last_progress"]["status"], "finished");
    // One downloading snapshot per URL; finish records only replace last_progress
    assert_eq!(status["progress_total"], 2);
    assert_eq!(status["progress"].as_array().unwrap().len(), 2);
    assert_eq!(status["last_progress"]["filename"], "video-1.mp4");

    let request = Request::builder()
        .uri("/files/video-1.mp4")
        .body(Body::empty())
        .unwrap();
    let app = mediadl::api::create_router(downloader.clone(), Arc::new(downloader.config().clone()));
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(bytes.len(), 1024);

    let request = Request::builder()
        .uri("/list_downloads")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(&downloader, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["files"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn failing_job_keeps_files_written_before_the_error() {
    let (downloader, _temp_dir) = downloader();

    let task_id = submit(&downloader, "https://example.com/ok\nhttps://example.com/broken").await;
    let status = poll(&downloader, &task_id).await;

    assert_eq!(status["status"], "error");
    assert!(
        status["error"]
            .as_str()
            .unwrap()
            .contains("Unsupported URL")
    );
    assert_eq!(status["files"], serde_json::json!(["video-0.mp4"]));
}

#[tokio::test]
async fn deleted_output_disappears_from_status() {
    let (downloader, _temp_dir) = downloader();

    let task_id = submit(&downloader, "https://example.com/a").await;
    let status = poll(&downloader, &task_id).await;
    assert_eq!(status["files"], serde_json::json!(["video-0.mp4"]));

    std::fs::remove_file(downloader.download_root().join("video-0.mp4")).unwrap();

    let status = poll(&downloader, &task_id).await;
    assert_eq!(status["files"], serde_json::json!([]));
}

#[tokio::test]
async fn library_api_reports_lifecycle_events() {
    let (downloader, _temp_dir) = downloader();
    let mut events = downloader.subscribe();

    let task_id = downloader
        .dispatch("https://example.com/a", Default::default())
        .unwrap();

    let mut seen = Vec::new();
    let finished = tokio::time::timeout(Duration::from_secs(5), async {
        while let Ok(event) = events.recv().await {
            let done = matches!(event, Event::TaskCompleted { .. } | Event::TaskFailed { .. });
            seen.push(event);
            if done {
                return true;
            }
        }
        false
    })
    .await
    .unwrap_or(false);
    assert!(finished, "no terminal event, saw {:?}", seen);

    assert!(matches!(&seen[0], Event::TaskCreated { id, .. } if *id == task_id));
    assert!(
        seen.iter()
            .any(|e| matches!(e, Event::FileAdded { file, .. } if file == "video-0.mp4"))
    );

    let snapshot = downloader.status(&task_id).unwrap();
    assert_eq!(snapshot.status, TaskStatus::Completed);
}
