//! # mediadl
//!
//! Pollable background media downloads behind a small REST API.
//!
//! A client submits one or more URLs, gets a task id back immediately and
//! polls for progress, logs and the files the job produced. Jobs run the
//! yt-dlp engine in the background; every produced file is confined to the
//! configured download directory, which the API also lists and serves.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mediadl::{Config, DownloadOptions, MediaDownloader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = MediaDownloader::new(Config::default())?;
//!
//!     // Subscribe to lifecycle events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let task_id = downloader.dispatch(
//!         "https://example.com/watch?v=abc",
//!         DownloadOptions::default(),
//!     )?;
//!     println!("status: {:?}", downloader.status(&task_id)?.status);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Job launching and admission control
pub mod dispatcher;
/// Service facade tying the registry, engine and API together
pub mod downloader;
/// Download engine abstraction and the yt-dlp implementation
pub mod engine;
/// Error types
pub mod error;
/// Download directory containment
pub mod file_guard;
/// Engine callbacks bound to a task
pub mod hooks;
/// Platform file manager integration
pub mod opener;
/// In-memory task registry
pub mod registry;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use downloader::MediaDownloader;
pub use engine::{DownloadEngine, NoOpEngine, YtDlpEngine};
pub use error::{ApiError, Error, ErrorDetail, Result, ToHttpStatus};
pub use opener::PlatformOpener;
pub use types::{
    DownloadOptions, DownloadRequest, Event, ListedFile, LogLevel, TaskId, TaskSnapshot,
    TaskStatus, TaskSummary,
};

/// Helper function to serve the REST API until a termination signal arrives.
///
/// Running jobs are not waited for; the engine child processes are killed
/// when the runtime shuts down.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use mediadl::{MediaDownloader, Config, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let downloader = MediaDownloader::new(Config::default())?;
///
///     // Serve until SIGTERM/SIGINT
///     run_with_shutdown(downloader).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(downloader: MediaDownloader) -> Result<()> {
    let config = downloader.config.clone();
    api::start_api_server_with_shutdown(std::sync::Arc::new(downloader), config, shutdown_signal())
        .await
}

/// Resolve once the process receives SIGTERM or SIGINT
///
/// A signal whose handler cannot be installed is logged and never fires, so
/// the other one still stops the server.
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    async fn wait_for(kind: SignalKind, name: &'static str) -> &'static str {
        match signal(kind) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(signal = name, error = %e, "Signal handler unavailable");
                std::future::pending::<()>().await;
            }
        }
        name
    }

    let name = tokio::select! {
        name = wait_for(SignalKind::terminate(), "SIGTERM") => name,
        name = wait_for(SignalKind::interrupt(), "SIGINT") => name,
    };
    tracing::info!(signal = name, "Shutdown requested");
}

/// Resolve once the process receives Ctrl+C
#[cfg(not(unix))]
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!(signal = "ctrl-c", "Shutdown requested"),
        Err(e) => {
            tracing::warn!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    }
}
