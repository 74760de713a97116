//! Job dispatch
//!
//! [`Dispatcher::dispatch`] validates the submitted URL text, registers a
//! running task and launches one tokio task per job. It returns the task id
//! before the engine starts. The job's outcome is written back to the
//! registry by a catch-all handler: an engine error or a panic inside the
//! engine both end as `status = error`, never as a crash.

use crate::config::Config;
use crate::engine::{DownloadEngine, EngineRequest};
use crate::error::{Error, Result};
use crate::file_guard::FileGuard;
use crate::hooks::TaskHooks;
use crate::registry::{Task, TaskRegistry};
use crate::types::{DownloadOptions, Event, LogLevel, TaskId};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, broadcast};

/// Split newline-separated URL text into trimmed, non-blank entries
pub fn split_urls(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Launches download jobs and records their outcome
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<TaskRegistry>,
    guard: Arc<FileGuard>,
    engine: Arc<dyn DownloadEngine>,
    event_tx: broadcast::Sender<Event>,
    config: Arc<Config>,
    /// Bounds running engine invocations when `max_concurrent_jobs` is set
    limiter: Option<Arc<Semaphore>>,
    /// Jobs currently waiting for a permit
    waiting: Arc<AtomicUsize>,
}

impl Dispatcher {
    /// Create a dispatcher sharing the registry, guard and event channel
    pub fn new(
        registry: Arc<TaskRegistry>,
        guard: Arc<FileGuard>,
        engine: Arc<dyn DownloadEngine>,
        event_tx: broadcast::Sender<Event>,
        config: Arc<Config>,
    ) -> Self {
        let limiter = config
            .download
            .max_concurrent_jobs
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));

        Self {
            registry,
            guard,
            engine,
            event_tx,
            config,
            limiter,
            waiting: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of jobs waiting for a concurrency slot
    pub fn queue_depth(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    /// Name of the engine jobs run on
    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Register a task for `url_text` and start its job
    ///
    /// Must be called from within a tokio runtime. Fails with
    /// [`Error::Validation`] when no URL remains after trimming; no task is
    /// created in that case.
    pub fn dispatch(&self, url_text: &str, options: DownloadOptions) -> Result<TaskId> {
        let urls = split_urls(url_text);
        if urls.is_empty() {
            return Err(Error::Validation("Missing url".to_string()));
        }

        let id = TaskId::generate();
        self.registry.create(Task::new(
            id.clone(),
            urls.clone(),
            &self.config.retention,
        ))?;

        tracing::info!(task_id = %id, urls = urls.len(), engine = self.engine.name(), "Task dispatched");
        // No subscribers is fine
        let _ = self.event_tx.send(Event::TaskCreated {
            id: id.clone(),
            urls: urls.clone(),
        });

        let request = EngineRequest {
            urls,
            output_dir: self.guard.root().to_path_buf(),
            output_template: self.config.download.output_template.clone(),
            options,
        };

        let job = self.clone();
        let job_id = id.clone();
        tokio::spawn(async move {
            job.run(job_id, request).await;
        });

        Ok(id)
    }

    async fn run(self, id: TaskId, request: EngineRequest) {
        let _permit = match self.acquire_slot(&id).await {
            Ok(permit) => permit,
            Err(e) => {
                self.finish(&id, Err(e.to_string()));
                return;
            }
        };

        let hooks = Arc::new(TaskHooks::new(
            id.clone(),
            self.registry.clone(),
            self.guard.clone(),
            self.event_tx.clone(),
        ));
        let engine = self.engine.clone();

        tracing::debug!(task_id = %id, "Engine started");

        // A separate task so a panicking engine surfaces as a JoinError
        let handle = tokio::spawn(async move { engine.download(&request, hooks).await });

        let outcome = match handle.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(join_error) => Err(panic_message(join_error)),
        };

        self.finish(&id, outcome);
    }

    /// Wait for a concurrency slot, marking the task queued meanwhile
    async fn acquire_slot(&self, id: &TaskId) -> Result<Option<OwnedSemaphorePermit>> {
        let Some(limiter) = self.limiter.clone() else {
            return Ok(None);
        };

        if let Ok(permit) = limiter.clone().try_acquire_owned() {
            return Ok(Some(permit));
        }

        self.waiting.fetch_add(1, Ordering::SeqCst);
        let _ = self.registry.mutate(id, |task| task.queued = true);
        tracing::debug!(task_id = %id, queue_depth = self.queue_depth(), "Task queued");

        let permit = limiter.acquire_owned().await;

        self.waiting.fetch_sub(1, Ordering::SeqCst);
        let _ = self.registry.mutate(id, |task| task.queued = false);

        permit
            .map(Some)
            .map_err(|_| Error::Other("job limiter closed".to_string()))
    }

    /// Record the job outcome; terminal tasks are left untouched
    fn finish(&self, id: &TaskId, outcome: std::result::Result<(), String>) {
        match outcome {
            Ok(()) => {
                let result = self.registry.mutate(id, |task| {
                    task.complete().then(|| task.files.clone())
                });
                if let Ok(Some(files)) = result {
                    tracing::info!(task_id = %id, files = files.len(), "Task completed");
                    let _ = self.event_tx.send(Event::TaskCompleted {
                        id: id.clone(),
                        files,
                    });
                }
            }
            Err(message) => {
                let result = self.registry.mutate(id, |task| {
                    let changed = task.fail(message.clone());
                    if changed {
                        task.append_log(LogLevel::Error, message.clone());
                    }
                    changed
                });
                if let Ok(true) = result {
                    tracing::warn!(task_id = %id, error = %message, "Task failed");
                    let _ = self.event_tx.send(Event::TaskFailed {
                        id: id.clone(),
                        error: message,
                    });
                }
            }
        }
    }
}

fn panic_message(join_error: tokio::task::JoinError) -> String {
    if !join_error.is_panic() {
        return format!("download job was cancelled: {}", join_error);
    }
    let payload = join_error.into_panic();
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("download engine panicked: {}", detail)
}
