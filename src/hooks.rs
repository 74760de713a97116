//! Engine event adapter
//!
//! [`TaskHooks`] is the [`EngineObserver`] bound to one task at dispatch time.
//! It turns engine events into registry mutations and never lets a failure
//! travel back into the engine: errors are logged at debug level and panics
//! are caught at the boundary.

use crate::engine::{
    EngineEvent, EngineObserver, PostProcessorEvent, PostProcessorStatus, ProgressEvent,
    ProgressStatus,
};
use crate::error::Result;
use crate::file_guard::FileGuard;
use crate::registry::TaskRegistry;
use crate::types::{Event, LogLevel, ProgressPhase, ProgressSnapshot, TaskId};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Observer that records one task's engine activity
#[derive(Clone)]
pub struct TaskHooks {
    task_id: TaskId,
    registry: Arc<TaskRegistry>,
    guard: Arc<FileGuard>,
    event_tx: broadcast::Sender<Event>,
}

impl TaskHooks {
    /// Bind hooks to a registered task
    pub fn new(
        task_id: TaskId,
        registry: Arc<TaskRegistry>,
        guard: Arc<FileGuard>,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            task_id,
            registry,
            guard,
            event_tx,
        }
    }

    /// Task these hooks write to
    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    fn handle(&self, event: EngineEvent) -> Result<()> {
        match event {
            EngineEvent::Progress(progress) => self.on_progress(progress),
            EngineEvent::PostProcessor(pp) => self.on_postprocessor(pp),
            EngineEvent::Log { level, message } => self.on_log(level, message),
        }
    }

    fn on_progress(&self, progress: ProgressEvent) -> Result<()> {
        match progress.status {
            ProgressStatus::Downloading => {
                let snapshot = ProgressSnapshot {
                    status: ProgressPhase::Downloading,
                    downloaded_bytes: progress.downloaded_bytes,
                    total_bytes: progress.total_bytes.or(progress.total_bytes_estimate),
                    speed: progress.speed,
                    eta: progress.eta,
                    fragment_index: progress.fragment_index,
                    filename: progress.filename,
                };
                self.registry
                    .mutate(&self.task_id, |task| task.record_progress(snapshot))
            }
            // Download-stage output may still be replaced by a merge or transcode
            ProgressStatus::Finished => self
                .registry
                .mutate(&self.task_id, |task| task.record_finished(progress.filename)),
            ProgressStatus::Error => Ok(()),
        }
    }

    fn on_postprocessor(&self, pp: PostProcessorEvent) -> Result<()> {
        if pp.status != PostProcessorStatus::Finished {
            return Ok(());
        }
        let Some(candidate) = pp.filepath.or(pp.filename) else {
            return Ok(());
        };

        let path = std::path::absolute(&candidate)?;
        if !path.exists() || !self.guard.contains(&path) {
            tracing::debug!(
                task_id = %self.task_id,
                path = %path.display(),
                "Ignoring post-processed file outside the download directory"
            );
            return Ok(());
        }

        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            return Ok(());
        };

        let added = self
            .registry
            .mutate(&self.task_id, |task| task.add_file(name.clone()))?;
        if added {
            tracing::info!(
                task_id = %self.task_id,
                file = %name,
                postprocessor = %pp.postprocessor,
                "File added"
            );
            // No subscribers is fine
            let _ = self.event_tx.send(Event::FileAdded {
                id: self.task_id.clone(),
                file: name,
            });
        }
        Ok(())
    }

    fn on_log(&self, level: LogLevel, message: String) -> Result<()> {
        match level {
            LogLevel::Debug => tracing::debug!(task_id = %self.task_id, "{}", message),
            LogLevel::Info => tracing::info!(task_id = %self.task_id, "{}", message),
            LogLevel::Warning => tracing::warn!(task_id = %self.task_id, "{}", message),
            LogLevel::Error => tracing::error!(task_id = %self.task_id, "{}", message),
        }
        self.registry
            .mutate(&self.task_id, |task| task.append_log(level, message))
    }
}

impl EngineObserver for TaskHooks {
    fn on_event(&self, event: EngineEvent) {
        match catch_unwind(AssertUnwindSafe(|| self.handle(event))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(task_id = %self.task_id, error = %e, "Hook update failed");
            }
            Err(_) => {
                tracing::debug!(task_id = %self.task_id, "Hook panicked");
            }
        }
    }
}
