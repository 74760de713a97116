//! Platform file manager integration
//!
//! Opening the download directory or revealing a file is a fire-and-check
//! launch of the platform's file manager. The strategy is chosen once at
//! startup from the target OS and [`FileManagerConfig`].

use crate::config::FileManagerConfig;
use crate::error::{Error, Result};
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// How open/reveal requests reach the file manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformOpener {
    /// `open <path>` / `open -R <path>`
    MacOs,
    /// `explorer <path>` / `explorer /select, <path>`
    Windows,
    /// `<program> <path>`; reveal opens the containing directory
    Generic {
        /// Opener executable (e.g. "xdg-open")
        program: String,
    },
    /// Requests are refused
    Disabled,
}

impl PlatformOpener {
    /// Strategy for the current OS, honoring configuration overrides
    pub fn detect(config: &FileManagerConfig) -> Self {
        if !config.enabled {
            return Self::Disabled;
        }
        if let Some(ref program) = config.command {
            return Self::Generic {
                program: program.clone(),
            };
        }
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(windows) {
            Self::Windows
        } else {
            Self::Generic {
                program: "xdg-open".to_string(),
            }
        }
    }

    /// Program and arguments for a request, `None` when disabled
    pub fn command_for(&self, path: &Path, reveal: bool) -> Option<(String, Vec<OsString>)> {
        let path = path.as_os_str().to_os_string();
        match self {
            Self::MacOs => {
                let args = if reveal {
                    vec!["-R".into(), path]
                } else {
                    vec![path]
                };
                Some(("open".to_string(), args))
            }
            Self::Windows => {
                let args = if reveal {
                    vec!["/select,".into(), path]
                } else {
                    vec![path]
                };
                Some(("explorer".to_string(), args))
            }
            Self::Generic { program } => {
                // No standard reveal; open the directory holding the file
                let target = if reveal {
                    match Path::new(&path).parent() {
                        Some(parent) if !parent.as_os_str().is_empty() => {
                            parent.as_os_str().to_os_string()
                        }
                        _ => OsString::from("."),
                    }
                } else {
                    path
                };
                Some((program.clone(), vec![target]))
            }
            Self::Disabled => None,
        }
    }

    /// Open a directory, or reveal a file when `reveal` is set
    pub async fn open(&self, path: &Path, reveal: bool) -> Result<()> {
        let Some((program, args)) = self.command_for(path, reveal) else {
            return Err(Error::Platform(
                "file manager integration is disabled".to_string(),
            ));
        };

        tracing::debug!(program = %program, path = %path.display(), reveal, "Launching file manager");

        let status = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| Error::Platform(format!("failed to launch {}: {}", program, e)))?;

        // explorer.exe reports failure even when the window opened
        if !status.success() && *self != Self::Windows {
            return Err(Error::Platform(format!("{} exited with {}", program, status)));
        }
        Ok(())
    }
}
