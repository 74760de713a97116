//! Download directory access and file manager integration.

use crate::error::Result;
use crate::types::ListedFile;
use crate::utils::list_download_dir;
use std::path::PathBuf;

use super::MediaDownloader;

impl MediaDownloader {
    /// Resolve a client-supplied path to an existing file under the root
    ///
    /// Fails with `ForbiddenPath` when the path escapes the download
    /// directory and `NotFound` when it is not a regular file.
    pub fn file_path(&self, relative: &str) -> Result<PathBuf> {
        self.guard.existing_file(relative)
    }

    /// Files directly under the download directory, newest first
    ///
    /// `limit` defaults to `retention.default_list_limit`.
    pub async fn list_downloads(&self, limit: Option<usize>) -> Result<Vec<ListedFile>> {
        let limit = limit.unwrap_or(self.config.retention.default_list_limit);
        list_download_dir(self.guard.root(), limit).await
    }

    /// Open the download directory in the platform file manager
    pub async fn open_downloads(&self) -> Result<()> {
        let root = self.guard.root();
        tracing::info!(path = %root.display(), "Opening download directory");
        self.opener.open(root, false).await
    }

    /// Reveal a file under the download directory in the file manager
    ///
    /// The containment check runs before anything is launched.
    pub async fn reveal(&self, relative: &str) -> Result<()> {
        let path = self.guard.resolve(relative)?;
        tracing::info!(path = %path.display(), "Revealing file");
        self.opener.open(&path, true).await
    }
}
