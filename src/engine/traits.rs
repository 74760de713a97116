//! Traits and types for download engines

use crate::types::{DownloadOptions, LogLevel};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// One job handed to an engine
#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// URLs to fetch, in submission order
    pub urls: Vec<String>,
    /// Directory outputs are written to
    pub output_dir: PathBuf,
    /// Output filename template, relative to `output_dir`
    pub output_template: String,
    /// Per-job options
    pub options: DownloadOptions,
}

/// Phase reported by a progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressStatus {
    /// Bytes are arriving
    Downloading,
    /// One file finished downloading (post-processing may follow)
    Finished,
    /// The engine gave up on one file
    Error,
}

/// Raw progress report from the engine
///
/// Every numeric field is optional; engines report what they know.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    /// Phase
    pub status: ProgressStatus,
    /// Bytes received so far
    pub downloaded_bytes: Option<u64>,
    /// Exact total size
    pub total_bytes: Option<u64>,
    /// Estimated total size, used when the exact size is unknown
    pub total_bytes_estimate: Option<u64>,
    /// Bytes per second
    pub speed: Option<f64>,
    /// Seconds remaining
    pub eta: Option<u64>,
    /// Current fragment for segmented streams
    pub fragment_index: Option<u64>,
    /// File being written
    pub filename: Option<String>,
}

impl ProgressEvent {
    /// Event with only a status set
    pub fn new(status: ProgressStatus) -> Self {
        Self {
            status,
            downloaded_bytes: None,
            total_bytes: None,
            total_bytes_estimate: None,
            speed: None,
            eta: None,
            fragment_index: None,
            filename: None,
        }
    }
}

/// Phase reported by a post-processor event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcessorStatus {
    /// Post-processor began
    Started,
    /// Post-processor is running
    Processing,
    /// Post-processor finished; the output path is final
    Finished,
}

/// Post-processing stage report
#[derive(Debug, Clone, PartialEq)]
pub struct PostProcessorEvent {
    /// Phase
    pub status: PostProcessorStatus,
    /// Post-processor name (e.g. "MoveFiles", "FFmpegExtractAudio")
    pub postprocessor: String,
    /// Final output path
    pub filepath: Option<PathBuf>,
    /// Fallback output path when `filepath` is absent
    pub filename: Option<PathBuf>,
}

/// Everything an engine can report while a job runs
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Download progress
    Progress(ProgressEvent),
    /// Post-processing stage
    PostProcessor(PostProcessorEvent),
    /// Engine diagnostic line
    Log {
        /// Severity
        level: LogLevel,
        /// Message text
        message: String,
    },
}

/// Receives engine events
///
/// Called synchronously from the engine's context, possibly from several
/// threads. Implementations must not fail or block for long.
pub trait EngineObserver: Send + Sync {
    /// Handle one event
    fn on_event(&self, event: EngineEvent);
}

impl<F> EngineObserver for F
where
    F: Fn(EngineEvent) + Send + Sync,
{
    fn on_event(&self, event: EngineEvent) {
        self(event)
    }
}

/// Trait for media download engines
///
/// # Examples
///
/// ```no_run
/// use mediadl::engine::{DownloadEngine, EngineEvent, EngineRequest, YtDlpEngine};
/// use mediadl::types::DownloadOptions;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = YtDlpEngine::from_path().expect("yt-dlp not found");
/// let request = EngineRequest {
///     urls: vec!["https://example.com/watch?v=abc".into()],
///     output_dir: "./downloads".into(),
///     output_template: "%(title)s.%(ext)s".into(),
///     options: DownloadOptions::default(),
/// };
/// engine
///     .download(&request, Arc::new(|event: EngineEvent| println!("{:?}", event)))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait DownloadEngine: Send + Sync {
    /// Run one job to completion
    ///
    /// Returns `Ok(())` when the engine finished normally. Any error fails the
    /// task with the error's message.
    async fn download(
        &self,
        request: &EngineRequest,
        observer: Arc<dyn EngineObserver>,
    ) -> crate::Result<()>;

    /// Name of this implementation, for logging
    fn name(&self) -> &'static str;
}
