//! In-memory task registry
//!
//! [`TaskRegistry`] is the only owner of task state. Every operation takes
//! one process-wide lock for its whole duration; critical sections are a map
//! lookup plus a field update, and the lock is never held across an await.

use crate::config::RetentionConfig;
use crate::error::{Error, Result};
use crate::types::{
    History, LogEntry, LogLevel, ProgressSnapshot, TaskId, TaskSnapshot, TaskStatus, TaskSummary,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

/// State of one dispatched job
#[derive(Debug, Clone)]
pub struct Task {
    /// Task id
    pub id: TaskId,
    /// Current status (see [`Task::complete`] / [`Task::fail`])
    pub status: TaskStatus,
    /// Input URLs, fixed at creation
    pub urls: Vec<String>,
    /// Creation time, fixed at creation
    pub created_at: DateTime<Utc>,
    /// Time of the terminal transition
    pub finished_at: Option<DateTime<Utc>>,
    /// Downloading snapshots
    pub progress: History<ProgressSnapshot>,
    /// Latest progress or finish record
    pub last_progress: Option<ProgressSnapshot>,
    /// Accepted output basenames, insertion order, no duplicates
    pub files: Vec<String>,
    /// Engine log
    pub log: History<LogEntry>,
    /// Failure message
    pub error: Option<String>,
    /// Waiting for a concurrency slot
    pub queued: bool,
}

impl Task {
    /// A fresh running task with empty history
    pub fn new(id: TaskId, urls: Vec<String>, retention: &RetentionConfig) -> Self {
        Self {
            id,
            status: TaskStatus::Running,
            urls,
            created_at: Utc::now(),
            finished_at: None,
            progress: History::with_capacity(retention.max_progress_entries),
            last_progress: None,
            files: Vec::new(),
            log: History::with_capacity(retention.max_log_entries),
            error: None,
            queued: false,
        }
    }

    /// Transition running → completed; returns false if already terminal
    pub fn complete(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = TaskStatus::Completed;
        self.finished_at = Some(Utc::now());
        self.queued = false;
        true
    }

    /// Transition running → error; returns false if already terminal
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = TaskStatus::Error;
        self.error = Some(message.into());
        self.finished_at = Some(Utc::now());
        self.queued = false;
        true
    }

    /// Append a downloading snapshot and make it the latest
    pub fn record_progress(&mut self, snapshot: ProgressSnapshot) {
        self.last_progress = Some(snapshot.clone());
        self.progress.push(snapshot);
    }

    /// Replace the latest record without appending to the history
    pub fn record_finished(&mut self, filename: Option<String>) {
        self.last_progress = Some(ProgressSnapshot::finished(filename));
    }

    /// Add an output basename; returns false if it was already recorded
    pub fn add_file(&mut self, name: String) -> bool {
        if self.files.contains(&name) {
            return false;
        }
        self.files.push(name);
        true
    }

    /// Append a timestamped log entry
    pub fn append_log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.log.push(LogEntry {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        });
    }

    /// Point-in-time view with the newest `log_tail` log entries
    ///
    /// `files` is returned as recorded; callers filter it against the disk.
    pub fn snapshot(&self, log_tail: usize) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id.clone(),
            status: self.status,
            urls: self.urls.clone(),
            created_at: self.created_at,
            finished_at: self.finished_at,
            progress: self.progress.to_vec(),
            progress_total: self.progress.total(),
            last_progress: self.last_progress.clone(),
            files: self.files.clone(),
            log: self.log.tail(log_tail),
            log_total: self.log.total(),
            error: self.error.clone(),
            queued: self.queued,
            queue_depth: 0,
        }
    }

    /// Compact description
    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id.clone(),
            status: self.status,
            urls: self.urls.clone(),
            created_at: self.created_at,
            finished_at: self.finished_at,
            file_count: self.files.len(),
        }
    }
}

/// Exclusive owner of the id → task mapping
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Mutex<HashMap<TaskId, Task>>,
}

impl TaskRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new task
    ///
    /// Fails with [`Error::Conflict`] if the id is taken; the existing task
    /// is left untouched.
    pub fn create(&self, task: Task) -> Result<()> {
        let mut tasks = self.tasks.lock();
        if tasks.contains_key(&task.id) {
            return Err(Error::Conflict(format!("task {} already exists", task.id)));
        }
        tasks.insert(task.id.clone(), task);
        Ok(())
    }

    /// Owned copy of a task
    pub fn get(&self, id: &TaskId) -> Result<Task> {
        self.tasks
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::TaskNotFound { id: id.clone() })
    }

    /// Snapshot of a task without cloning its whole log
    pub fn snapshot(&self, id: &TaskId, log_tail: usize) -> Result<TaskSnapshot> {
        self.tasks
            .lock()
            .get(id)
            .map(|task| task.snapshot(log_tail))
            .ok_or_else(|| Error::TaskNotFound { id: id.clone() })
    }

    /// Apply `f` to a task while holding the registry lock
    pub fn mutate<R>(&self, id: &TaskId, f: impl FnOnce(&mut Task) -> R) -> Result<R> {
        let mut tasks = self.tasks.lock();
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| Error::TaskNotFound { id: id.clone() })?;
        Ok(f(task))
    }

    /// Whether a task with this id exists
    pub fn contains(&self, id: &TaskId) -> bool {
        self.tasks.lock().contains_key(id)
    }

    /// Summaries of every task, newest first
    pub fn list(&self) -> Vec<TaskSummary> {
        let mut summaries: Vec<TaskSummary> =
            self.tasks.lock().values().map(Task::summary).collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        summaries
    }

    /// Number of registered tasks
    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Whether no task was ever registered
    pub fn is_empty(&self) -> bool {
        self.tasks.lock().is_empty()
    }
}
