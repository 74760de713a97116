//! Utility functions for the download directory

use crate::error::Result;
use crate::types::ListedFile;
use chrono::{DateTime, Utc};
use std::path::Path;

/// List regular, non-hidden files directly under `root`
///
/// Entries are sorted newest modification time first (ties by name) and
/// truncated to `limit`. A missing `root` yields an empty list. Symlinks and
/// directories are skipped.
///
/// # Examples
///
/// ```no_run
/// use mediadl::utils::list_download_dir;
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> mediadl::Result<()> {
/// for file in list_download_dir(Path::new("./downloads"), 10).await? {
///     println!("{} ({} bytes)", file.name, file.size);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn list_download_dir(root: &Path, limit: usize) -> Result<Vec<ListedFile>> {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }

        // The file may vanish between listing and stat
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }

        let mtime = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_default();

        files.push(ListedFile {
            name,
            size: metadata.len(),
            mtime,
        });
    }

    files.sort_by(|a, b| b.mtime.cmp(&a.mtime).then_with(|| a.name.cmp(&b.name)));
    files.truncate(limit);
    Ok(files)
}
