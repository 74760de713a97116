//! Download engine abstraction
//!
//! This module provides a trait-based architecture for running media download
//! jobs. The dispatcher only talks to [`DownloadEngine`]; engines report what
//! they are doing through an [`EngineObserver`] as typed [`EngineEvent`]s.
//!
//! ## Architecture
//!
//! - [`YtDlpEngine`]: drives an external `yt-dlp` binary and turns its
//!   output into events
//! - [`NoOpEngine`]: stand-in when no binary is available; every job fails
//!
//! ## Usage
//!
//! ```no_run
//! use mediadl::config::EngineConfig;
//! use mediadl::engine::engine_from_config;
//!
//! let engine = engine_from_config(&EngineConfig::default());
//! println!("using {}", engine.name());
//! ```

mod cli;
mod noop;
pub mod parser;
mod traits;

pub use cli::YtDlpEngine;
pub use noop::NoOpEngine;
pub use traits::{
    DownloadEngine, EngineEvent, EngineObserver, EngineRequest, PostProcessorEvent,
    PostProcessorStatus, ProgressEvent, ProgressStatus,
};

use crate::config::EngineConfig;
use std::sync::Arc;

/// Pick the engine implementation for a configuration
///
/// An explicit `ytdlp_path` wins; otherwise PATH is searched when
/// `search_path` is set. Falls back to [`NoOpEngine`].
pub fn engine_from_config(config: &EngineConfig) -> Arc<dyn DownloadEngine> {
    let engine: Arc<dyn DownloadEngine> = if let Some(ref path) = config.ytdlp_path {
        Arc::new(YtDlpEngine::new(path.clone()).with_extra_args(config.extra_args.clone()))
    } else if config.search_path {
        YtDlpEngine::from_path()
            .map(|e| {
                Arc::new(e.with_extra_args(config.extra_args.clone())) as Arc<dyn DownloadEngine>
            })
            .unwrap_or_else(|| Arc::new(NoOpEngine))
    } else {
        Arc::new(NoOpEngine)
    };

    tracing::info!(engine = engine.name(), "Download engine initialized");
    engine
}
