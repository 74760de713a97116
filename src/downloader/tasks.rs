//! Dispatching jobs and reading task state.

use crate::error::Result;
use crate::types::{DownloadOptions, DownloadRequest, TaskId, TaskSnapshot, TaskSummary};

use super::MediaDownloader;

impl MediaDownloader {
    /// Start a download job for newline-separated `url_text`
    ///
    /// Returns the new task id as soon as the task is registered; the job
    /// runs in the background. Fails with a validation error when no URL
    /// is left after trimming.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mediadl::{Config, MediaDownloader, DownloadOptions};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let downloader = MediaDownloader::new(Config::default())?;
    ///     let id = downloader.dispatch(
    ///         "https://example.com/watch?v=abc\nhttps://example.com/watch?v=def",
    ///         DownloadOptions { audio_only: true, ..Default::default() },
    ///     )?;
    ///
    ///     let status = downloader.status(&id)?;
    ///     println!("{} is {:?}", id, status.status);
    ///     Ok(())
    /// }
    /// ```
    pub fn dispatch(&self, url_text: &str, options: DownloadOptions) -> Result<TaskId> {
        self.dispatcher.dispatch(url_text, options)
    }

    /// Start a download job from an API request body
    pub fn submit(&self, request: &DownloadRequest) -> Result<TaskId> {
        self.dispatch(&request.url, request.options())
    }

    /// Point-in-time view of a task
    ///
    /// `files` only lists outputs that exist on disk right now, and `log` is
    /// limited to the newest `retention.log_tail` entries.
    pub fn status(&self, id: &TaskId) -> Result<TaskSnapshot> {
        let mut snapshot = self
            .registry
            .snapshot(id, self.config.retention.log_tail)?;

        // Disk checks happen outside the registry lock
        snapshot.files = self.guard.filter_existing(&snapshot.files);
        snapshot.queue_depth = self.dispatcher.queue_depth();
        Ok(snapshot)
    }

    /// Summaries of every task since startup, newest first
    pub fn list_tasks(&self) -> Vec<TaskSummary> {
        self.registry.list()
    }

    /// Number of jobs waiting for a concurrency slot
    pub fn queue_depth(&self) -> usize {
        self.dispatcher.queue_depth()
    }
}
