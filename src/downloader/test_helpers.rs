//! Shared test helpers: a scripted engine and MediaDownloader construction.

use crate::config::Config;
use crate::downloader::MediaDownloader;
use crate::engine::{
    DownloadEngine, EngineEvent, EngineObserver, EngineRequest, PostProcessorEvent,
    PostProcessorStatus,
};
use crate::error::{Error, Result};
use crate::opener::PlatformOpener;
use crate::registry::{Task, TaskRegistry};
use crate::types::TaskId;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tempfile::{TempDir, tempdir};
use tokio::sync::watch;

/// One scripted engine action
#[derive(Debug, Clone)]
pub(crate) enum Step {
    /// Push an event to the observer
    Emit(EngineEvent),
    /// Write a file into the output directory, then report it as moved
    WriteFile { name: String, bytes: Vec<u8> },
    /// Stop and fail the job with an engine error
    Fail(String),
    /// Block until [`ScriptedEngine::release`] is called
    WaitForRelease,
}

/// Engine that replays a fixed list of steps for every job
pub(crate) struct ScriptedEngine {
    steps: Vec<Step>,
    requests: Mutex<Vec<EngineRequest>>,
    release: watch::Sender<bool>,
}

impl ScriptedEngine {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        let (release, _) = watch::channel(false);
        Self {
            steps,
            requests: Mutex::new(Vec::new()),
            release,
        }
    }

    /// Requests received so far
    pub(crate) fn requests(&self) -> Vec<EngineRequest> {
        self.requests.lock().clone()
    }

    /// Unblock every current and future `WaitForRelease` step
    pub(crate) fn release(&self) {
        self.release.send_replace(true);
    }
}

#[async_trait]
impl DownloadEngine for ScriptedEngine {
    async fn download(
        &self,
        request: &EngineRequest,
        observer: Arc<dyn EngineObserver>,
    ) -> Result<()> {
        self.requests.lock().push(request.clone());

        for step in &self.steps {
            match step {
                Step::Emit(event) => observer.on_event(event.clone()),
                Step::WriteFile { name, bytes } => {
                    let path = request.output_dir.join(name);
                    tokio::fs::write(&path, bytes).await?;
                    observer.on_event(EngineEvent::PostProcessor(PostProcessorEvent {
                        status: PostProcessorStatus::Finished,
                        postprocessor: "MoveFiles".to_string(),
                        filepath: Some(path),
                        filename: None,
                    }));
                }
                Step::Fail(message) => return Err(Error::Engine(message.clone())),
                Step::WaitForRelease => {
                    let mut rx = self.release.subscribe();
                    while !*rx.borrow_and_update() {
                        rx.changed()
                            .await
                            .map_err(|e| Error::Other(e.to_string()))?;
                    }
                }
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Poll until the task leaves `running` (panics after 5 seconds)
pub(crate) async fn wait_for_terminal(registry: &TaskRegistry, id: &TaskId) -> Task {
    for _ in 0..500 {
        let task = registry.get(id).unwrap();
        if task.status.is_terminal() {
            return task;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("task {} did not finish in time", id);
}

/// Config rooted in a fresh temp directory
pub(crate) fn test_config(temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.download.download_dir = temp_dir.path().join("downloads");
    config.file_manager.enabled = false;
    config
}

/// Create a MediaDownloader running `steps` for every job.
/// Returns the downloader and the tempdir (which must be kept alive).
pub(crate) fn create_test_downloader(steps: Vec<Step>) -> (MediaDownloader, TempDir) {
    let temp_dir = tempdir().unwrap();
    let config = test_config(&temp_dir);
    let downloader = MediaDownloader::with_engine(config, Arc::new(ScriptedEngine::new(steps)))
        .unwrap()
        .with_opener(PlatformOpener::Disabled);
    (downloader, temp_dir)
}
