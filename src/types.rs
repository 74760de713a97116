//! Core types for mediadl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use utoipa::ToSchema;

/// Unique identifier for a download task
///
/// 32 lowercase hex characters (a UUIDv4 in simple form). Ids are never
/// reused for the lifetime of the process.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    /// Generate a fresh random task id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task status
///
/// `Running` is the only non-terminal state. A task moves to exactly one of
/// `Completed` or `Error` and never leaves it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Engine is (or is about to be) running
    Running,
    /// Engine returned normally
    Completed,
    /// Engine failed; see the task's `error`
    Error,
}

impl TaskStatus {
    /// Whether no further status transitions are allowed
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Running)
    }
}

/// Phase of a progress snapshot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProgressPhase {
    /// Bytes are being transferred
    Downloading,
    /// The download stage for one file finished (post-processing may follow)
    Finished,
}

/// One recorded progress observation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProgressSnapshot {
    /// Phase this snapshot was taken in
    pub status: ProgressPhase,

    /// Bytes downloaded so far
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloaded_bytes: Option<u64>,

    /// Total size in bytes (exact if known, otherwise the engine's estimate)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_bytes: Option<u64>,

    /// Transfer speed in bytes per second
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,

    /// Estimated seconds remaining
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<u64>,

    /// Index of the fragment being fetched (fragmented formats only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment_index: Option<u64>,

    /// File the engine is currently writing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl ProgressSnapshot {
    /// Minimal record for a finished download stage
    pub fn finished(filename: Option<String>) -> Self {
        Self {
            status: ProgressPhase::Finished,
            downloaded_bytes: None,
            total_bytes: None,
            speed: None,
            eta: None,
            fragment_index: None,
            filename,
        }
    }
}

/// Severity of a task log entry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose engine chatter
    Debug,
    /// Normal engine output
    Info,
    /// Recoverable problems reported by the engine
    Warning,
    /// Errors reported by the engine
    Error,
}

/// One line of a task's log
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LogEntry {
    /// Arrival time
    pub timestamp: DateTime<Utc>,
    /// Severity
    pub level: LogLevel,
    /// Message text
    pub message: String,
}

/// Append-only sequence with a fixed capacity
///
/// Once full, each push evicts the oldest entry. Surviving entries are never
/// edited or reordered. `total()` counts every push, including evicted ones.
#[derive(Clone, Debug)]
pub struct History<T> {
    entries: VecDeque<T>,
    capacity: usize,
    total: u64,
}

impl<T> History<T> {
    /// Create an empty history holding at most `capacity` entries (minimum 1)
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            total: 0,
        }
    }

    /// Append an entry, evicting the oldest when full
    pub fn push(&mut self, entry: T) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        self.total += 1;
    }

    /// Number of retained entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is retained
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries ever pushed
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Retained entries, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    /// Most recently pushed entry
    pub fn last(&self) -> Option<&T> {
        self.entries.back()
    }
}

impl<T: Clone> History<T> {
    /// Clone of every retained entry
    pub fn to_vec(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }

    /// Clone of the newest `n` entries, oldest first
    pub fn tail(&self, n: usize) -> Vec<T> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }
}

/// Options controlling how the engine fetches and post-processes media
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DownloadOptions {
    /// Extract audio only (best audio, converted to mp3)
    #[serde(default)]
    pub audio_only: bool,

    /// Explicit engine format selector (ignored when `audio_only` is set)
    #[serde(default)]
    pub format: Option<String>,

    /// Download subtitles in every available language
    #[serde(default)]
    pub subtitles: bool,

    /// Embed the thumbnail into the output file
    #[serde(default)]
    pub embed_thumbnail: bool,

    /// Restrict selection to mp4 video + m4a audio when no format is given
    #[serde(default)]
    pub mp4_only: bool,
}

/// Request body for `POST /download`
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct DownloadRequest {
    /// One or more URLs, separated by newlines
    #[serde(default)]
    pub url: String,

    /// Extract audio only
    #[serde(default)]
    pub audio_only: bool,

    /// Explicit engine format selector
    #[serde(default)]
    pub format: String,

    /// Download subtitles
    #[serde(default)]
    pub subtitles: bool,

    /// Embed thumbnail
    #[serde(default)]
    pub embed_thumbnail: bool,

    /// Prefer mp4/m4a streams
    #[serde(default)]
    pub mp4_only: bool,
}

impl DownloadRequest {
    /// Engine options carried by this request
    pub fn options(&self) -> DownloadOptions {
        let format = self.format.trim();
        DownloadOptions {
            audio_only: self.audio_only,
            format: (!format.is_empty()).then(|| format.to_string()),
            subtitles: self.subtitles,
            embed_thumbnail: self.embed_thumbnail,
            mp4_only: self.mp4_only,
        }
    }
}

/// Response for `POST /download`
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DispatchResponse {
    /// Id to poll with `GET /status/{task_id}`
    pub task_id: TaskId,
}

/// Point-in-time view of a task as returned by `GET /status/{task_id}`
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskSnapshot {
    /// Task id
    pub id: TaskId,
    /// Current status
    pub status: TaskStatus,
    /// Input URLs
    pub urls: Vec<String>,
    /// When the task was dispatched
    pub created_at: DateTime<Utc>,
    /// When the task reached a terminal status
    pub finished_at: Option<DateTime<Utc>>,
    /// Retained progress snapshots, oldest first
    pub progress: Vec<ProgressSnapshot>,
    /// Number of progress snapshots ever recorded
    pub progress_total: u64,
    /// Most recent progress or finish record
    pub last_progress: Option<ProgressSnapshot>,
    /// Output files (basenames) that exist right now
    pub files: Vec<String>,
    /// Newest log entries, oldest first
    pub log: Vec<LogEntry>,
    /// Number of log entries ever recorded
    pub log_total: u64,
    /// Failure message when `status` is `error`
    pub error: Option<String>,
    /// Whether the job is still waiting for a concurrency slot
    pub queued: bool,
    /// Jobs currently waiting for a concurrency slot
    pub queue_depth: usize,
}

/// Compact description of a task for `GET /tasks`
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskSummary {
    /// Task id
    pub id: TaskId,
    /// Current status
    pub status: TaskStatus,
    /// Input URLs
    pub urls: Vec<String>,
    /// When the task was dispatched
    pub created_at: DateTime<Utc>,
    /// When the task reached a terminal status
    pub finished_at: Option<DateTime<Utc>>,
    /// Number of recorded output files
    pub file_count: usize,
}

/// A file found directly under the download directory
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListedFile {
    /// File name
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time
    pub mtime: DateTime<Utc>,
}

/// Response for `GET /list_downloads`
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ListDownloadsResponse {
    /// Files, newest first
    pub files: Vec<ListedFile>,
}

/// Result of an open/reveal request
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct OpenResponse {
    /// Whether the file manager was launched
    pub ok: bool,
    /// Failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Event emitted during a task's lifecycle
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Task registered and its job launched
    TaskCreated {
        /// Task id
        id: TaskId,
        /// Input URLs
        urls: Vec<String>,
    },

    /// A post-processed output file was accepted into the task
    FileAdded {
        /// Task id
        id: TaskId,
        /// Basename under the download directory
        file: String,
    },

    /// Engine returned normally
    TaskCompleted {
        /// Task id
        id: TaskId,
        /// Files recorded for the task
        files: Vec<String>,
    },

    /// Engine failed
    TaskFailed {
        /// Task id
        id: TaskId,
        /// Failure message
        error: String,
    },
}
