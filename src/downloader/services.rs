//! API server startup.

use crate::error::Result;

use super::MediaDownloader;

impl MediaDownloader {
    /// Spawn the REST API server in a background task
    ///
    /// This method spawns the API server as a separate async task using
    /// `tokio::spawn`. It listens on `api.bind_address` (default:
    /// 127.0.0.1:8080) until the process stops.
    pub fn spawn_api_server(self: &std::sync::Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let downloader = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(downloader, config).await })
    }
}
