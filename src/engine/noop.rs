//! No-op engine used when yt-dlp is unavailable

use super::traits::{DownloadEngine, EngineObserver, EngineRequest};
use async_trait::async_trait;
use std::sync::Arc;

/// Engine used when no yt-dlp binary is available or configured
///
/// The service still starts and accepts requests; every job fails with
/// `Error::NotSupported`, which the task records as its error message.
///
/// # Examples
///
/// ```
/// use mediadl::engine::{DownloadEngine, EngineEvent, EngineRequest, NoOpEngine};
/// use mediadl::types::DownloadOptions;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() {
/// let request = EngineRequest {
///     urls: vec!["https://example.com/v".into()],
///     output_dir: "./downloads".into(),
///     output_template: "%(id)s.%(ext)s".into(),
///     options: DownloadOptions::default(),
/// };
/// let result = NoOpEngine
///     .download(&request, Arc::new(|_: EngineEvent| {}))
///     .await;
/// assert!(result.is_err());
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEngine;

#[async_trait]
impl DownloadEngine for NoOpEngine {
    async fn download(
        &self,
        _request: &EngineRequest,
        _observer: Arc<dyn EngineObserver>,
    ) -> crate::Result<()> {
        Err(crate::Error::NotSupported(
            "media downloads require the yt-dlp binary. \
             Configure engine.ytdlp_path (MEDIADL_YTDLP_PATH) or ensure yt-dlp is in PATH."
                .into(),
        ))
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
