//! CLI-based engine using an external yt-dlp binary

use super::parser::{artifact_template, parse_line, progress_template};
use super::traits::{DownloadEngine, EngineEvent, EngineObserver, EngineRequest};
use crate::types::{DownloadOptions, LogLevel};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// Format selector used for `audio_only` jobs
pub const AUDIO_FORMAT: &str = "bestaudio/best";

/// Format selector used for `mp4_only` jobs without an explicit format
pub const MP4_FORMAT: &str = "bv*[ext=mp4]+ba[ext=m4a]/b[ext=mp4]";

/// Engine that runs `yt-dlp` as a child process
///
/// Progress and final output paths are requested in a machine-readable form
/// (see [`super::parser`]); both stdout and stderr are parsed line by line
/// and forwarded to the observer as they arrive.
///
/// # Examples
///
/// ```no_run
/// use mediadl::engine::YtDlpEngine;
/// use std::path::PathBuf;
///
/// // Explicit path
/// let engine = YtDlpEngine::new(PathBuf::from("/usr/local/bin/yt-dlp"));
///
/// // Or auto-discover from PATH
/// let engine = YtDlpEngine::from_path().expect("yt-dlp not found in PATH");
/// ```
#[derive(Debug, Clone)]
pub struct YtDlpEngine {
    binary_path: PathBuf,
    extra_args: Vec<String>,
}

impl YtDlpEngine {
    /// Create an engine with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            extra_args: Vec::new(),
        }
    }

    /// Attempt to find yt-dlp in PATH
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Append arguments to every invocation (placed before the URLs)
    pub fn with_extra_args(mut self, extra_args: Vec<String>) -> Self {
        self.extra_args = extra_args;
        self
    }

    /// Command line for one job, without the program name
    pub fn build_args(&self, request: &EngineRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--paths".into(),
            request.output_dir.clone().into_os_string(),
            "--output".into(),
            request.output_template.clone().into(),
            "--newline".into(),
            "--progress".into(),
            "--no-simulate".into(),
            "--progress-template".into(),
            progress_template().into(),
            "--print".into(),
            artifact_template().into(),
            // --print implies --quiet; verbose output keeps the narration lines
            "--verbose".into(),
        ];

        args.extend(option_args(&request.options).into_iter().map(OsString::from));
        args.extend(self.extra_args.iter().map(OsString::from));

        args.push("--".into());
        args.extend(request.urls.iter().map(OsString::from));
        args
    }
}

/// Arguments derived from the per-job options
///
/// `audio_only` takes precedence over an explicit format, which takes
/// precedence over `mp4_only`.
fn option_args(options: &DownloadOptions) -> Vec<String> {
    let mut args = Vec::new();

    if options.audio_only {
        args.extend(
            [
                "--format",
                AUDIO_FORMAT,
                "--extract-audio",
                "--audio-format",
                "mp3",
                "--audio-quality",
                "0",
            ]
            .map(String::from),
        );
    } else if let Some(ref format) = options.format {
        args.push("--format".to_string());
        args.push(format.clone());
    } else if options.mp4_only {
        args.push("--format".to_string());
        args.push(MP4_FORMAT.to_string());
    }

    if options.subtitles {
        args.extend(["--write-subs", "--sub-langs", "all"].map(String::from));
    }

    if options.embed_thumbnail {
        args.push("--embed-thumbnail".to_string());
    }

    args
}

/// Forward every parsed line to the observer; returns the last error line
async fn pump_lines<R>(reader: R, observer: &dyn EngineObserver) -> Option<String>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut last_error = None;

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(event) = parse_line(&line) {
                    if let EngineEvent::Log {
                        level: LogLevel::Error,
                        ref message,
                    } = event
                    {
                        last_error = Some(message.clone());
                    }
                    observer.on_event(event);
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "Stopped reading engine output");
                break;
            }
        }
    }

    last_error
}

#[async_trait]
impl DownloadEngine for YtDlpEngine {
    async fn download(
        &self,
        request: &EngineRequest,
        observer: Arc<dyn EngineObserver>,
    ) -> crate::Result<()> {
        let args = self.build_args(request);
        tracing::debug!(
            binary = %self.binary_path.display(),
            urls = request.urls.len(),
            "Spawning yt-dlp"
        );

        let mut child = Command::new(&self.binary_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| crate::Error::Engine(format!("Failed to execute yt-dlp: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| crate::Error::Engine("yt-dlp stdout was not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| crate::Error::Engine("yt-dlp stderr was not captured".into()))?;

        let (stdout_error, stderr_error) = tokio::join!(
            pump_lines(stdout, observer.as_ref()),
            pump_lines(stderr, observer.as_ref())
        );

        let status = child
            .wait()
            .await
            .map_err(|e| crate::Error::Engine(format!("Failed to wait for yt-dlp: {}", e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(crate::Error::Engine(
                stderr_error
                    .or(stdout_error)
                    .unwrap_or_else(|| format!("yt-dlp exited with {}", status)),
            ))
        }
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}
