//! Core downloader implementation split into focused submodules.
//!
//! The `MediaDownloader` struct and its methods are organized by domain:
//! - [`tasks`] - Dispatching jobs and reading task state
//! - [`files`] - Download directory access and file manager integration
//! - [`services`] - API server startup

mod files;
mod services;
mod tasks;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::engine::{DownloadEngine, engine_from_config};
use crate::error::Result;
use crate::file_guard::FileGuard;
use crate::opener::PlatformOpener;
use crate::registry::TaskRegistry;
use crate::types::Event;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the lifecycle event channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct MediaDownloader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Every task dispatched since startup
    pub(crate) registry: Arc<TaskRegistry>,
    /// Containment rule for the download directory
    pub(crate) guard: Arc<FileGuard>,
    /// Job launcher bound to the engine
    pub(crate) dispatcher: Dispatcher,
    /// File manager strategy for open/reveal
    pub(crate) opener: PlatformOpener,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
}

impl MediaDownloader {
    /// Create a downloader using the engine selected by `config.engine`
    ///
    /// The download directory is created if it does not exist.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mediadl::{Config, MediaDownloader};
    ///
    /// # fn main() -> mediadl::Result<()> {
    /// let downloader = MediaDownloader::new(Config::default())?;
    /// println!("saving to {}", downloader.download_root().display());
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: Config) -> Result<Self> {
        let engine = engine_from_config(&config.engine);
        Self::with_engine(config, engine)
    }

    /// Create a downloader with an explicit engine implementation
    pub fn with_engine(config: Config, engine: Arc<dyn DownloadEngine>) -> Result<Self> {
        let guard = Arc::new(FileGuard::new(config.download_dir())?);
        let opener = PlatformOpener::detect(&config.file_manager);
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let registry = Arc::new(TaskRegistry::new());
        let config = Arc::new(config);

        let dispatcher = Dispatcher::new(
            registry.clone(),
            guard.clone(),
            engine,
            event_tx.clone(),
            config.clone(),
        );

        tracing::info!(
            download_dir = %guard.root().display(),
            engine = dispatcher.engine_name(),
            max_concurrent_jobs = ?config.download.max_concurrent_jobs,
            opener = ?opener,
            "Media downloader initialized"
        );

        Ok(Self {
            config,
            registry,
            guard,
            dispatcher,
            opener,
            event_tx,
        })
    }

    /// Replace the file manager strategy
    pub fn with_opener(mut self, opener: PlatformOpener) -> Self {
        self.opener = opener;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Canonical download directory
    pub fn download_root(&self) -> &Path {
        self.guard.root()
    }

    /// Subscribe to lifecycle events
    ///
    /// Receivers that fall more than the channel capacity behind observe
    /// `RecvError::Lagged` and skip ahead.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }
}
