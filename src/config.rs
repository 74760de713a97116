//! Configuration types for mediadl

use serde::{Deserialize, Serialize};
use std::{
    net::{IpAddr, SocketAddr, ToSocketAddrs},
    path::PathBuf,
};
use utoipa::ToSchema;

use crate::error::{Error, Result};

/// Environment variable overriding [`DownloadConfig::download_dir`]
pub const ENV_DOWNLOAD_DIR: &str = "MEDIADL_DOWNLOAD_DIR";
/// Environment variable overriding the bind host (IP literal or hostname)
pub const ENV_HOST: &str = "MEDIADL_HOST";
/// Environment variable overriding the bind port
pub const ENV_PORT: &str = "MEDIADL_PORT";
/// Environment variable setting [`DownloadConfig::max_concurrent_jobs`]
pub const ENV_MAX_CONCURRENT_JOBS: &str = "MEDIADL_MAX_CONCURRENT_JOBS";
/// Environment variable enabling CORS for a comma-separated origin list
pub const ENV_CORS_ORIGINS: &str = "MEDIADL_CORS_ORIGINS";
/// Environment variable setting [`EngineConfig::ytdlp_path`]
pub const ENV_YTDLP_PATH: &str = "MEDIADL_YTDLP_PATH";

/// Download behavior configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadConfig {
    /// Directory every produced file must live in (default: "./downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Engine output template, relative to `download_dir`
    #[serde(default = "default_output_template")]
    pub output_template: String,

    /// Maximum engine invocations running at once (None = unbounded)
    ///
    /// Jobs beyond the limit stay `running` with `queued = true` until a
    /// slot frees up.
    #[serde(default)]
    pub max_concurrent_jobs: Option<usize>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            output_template: default_output_template(),
            max_concurrent_jobs: None,
        }
    }
}

/// Download engine (yt-dlp) configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct EngineConfig {
    /// Path to the yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Whether to search PATH for yt-dlp if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Extra arguments appended to every engine invocation
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            search_path: true,
            extra_args: Vec::new(),
        }
    }
}

/// In-memory retention limits for task history
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RetentionConfig {
    /// Progress snapshots kept per task (default: 10000)
    #[serde(default = "default_max_progress_entries")]
    pub max_progress_entries: usize,

    /// Log entries kept per task (default: 2000)
    #[serde(default = "default_max_log_entries")]
    pub max_log_entries: usize,

    /// Log entries returned by a status query (default: 200)
    #[serde(default = "default_log_tail")]
    pub log_tail: usize,

    /// Default `limit` for directory listings (default: 200)
    #[serde(default = "default_list_limit")]
    pub default_list_limit: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_progress_entries: default_max_progress_entries(),
            max_log_entries: default_max_log_entries(),
            log_tail: default_log_tail(),
            default_list_limit: default_list_limit(),
        }
    }
}

/// Platform file manager integration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FileManagerConfig {
    /// Allow open/reveal requests to launch a file manager (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Override the opener command (generic strategy, e.g. "nautilus")
    #[serde(default)]
    pub command: Option<String>,
}

impl Default for FileManagerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: None,
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:8080)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: false)
    ///
    /// The API has no authentication, so cross-origin reads stay blocked
    /// unless explicitly enabled.
    #[serde(default)]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: none; "*" allows any origin)
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: false,
            cors_origins: Vec::new(),
            swagger_ui: true,
        }
    }
}

/// Main configuration for [`MediaDownloader`](crate::MediaDownloader)
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Download directory and concurrency
    #[serde(default)]
    pub download: DownloadConfig,

    /// Engine binary and arguments
    #[serde(default)]
    pub engine: EngineConfig,

    /// Per-task history limits
    #[serde(default)]
    pub retention: RetentionConfig,

    /// File manager integration
    #[serde(default)]
    pub file_manager: FileManagerConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Download directory
    pub fn download_dir(&self) -> &PathBuf {
        &self.download.download_dir
    }

    /// Defaults overridden by `MEDIADL_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (empty values are ignored)
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get(ENV_DOWNLOAD_DIR) {
            self.download.download_dir = PathBuf::from(dir);
        }

        if let Some(host) = get(ENV_HOST) {
            let ip = resolve_host(host.trim())?;
            self.api.bind_address.set_ip(ip);
        }

        if let Some(port) = get(ENV_PORT) {
            let port = port.trim().parse::<u16>().map_err(|e| Error::Config {
                message: format!("invalid port '{}': {}", port, e),
                key: Some(ENV_PORT.to_string()),
            })?;
            self.api.bind_address.set_port(port);
        }

        if let Some(limit) = get(ENV_MAX_CONCURRENT_JOBS) {
            let limit = limit.trim().parse::<usize>().map_err(|e| Error::Config {
                message: format!("invalid job limit '{}': {}", limit, e),
                key: Some(ENV_MAX_CONCURRENT_JOBS.to_string()),
            })?;
            self.download.max_concurrent_jobs = (limit > 0).then_some(limit);
        }

        if let Some(origins) = get(ENV_CORS_ORIGINS) {
            self.api.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
            self.api.cors_enabled = !self.api.cors_origins.is_empty();
        }

        if let Some(path) = get(ENV_YTDLP_PATH) {
            self.engine.ytdlp_path = Some(PathBuf::from(path));
        }

        Ok(())
    }
}

/// IP literal as-is, otherwise the first address the resolver returns
fn resolve_host(host: &str) -> Result<IpAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    let invalid = |message: String| Error::Config {
        message,
        key: Some(ENV_HOST.to_string()),
    };
    (host, 0)
        .to_socket_addrs()
        .map_err(|e| invalid(format!("invalid host '{}': {}", host, e)))?
        .next()
        .map(|addr| addr.ip())
        .ok_or_else(|| invalid(format!("host '{}' did not resolve to any address", host)))
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_output_template() -> String {
    "%(title).200B-%(id)s.%(ext)s".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_progress_entries() -> usize {
    10_000
}

fn default_max_log_entries() -> usize {
    2_000
}

fn default_log_tail() -> usize {
    200
}

fn default_list_limit() -> usize {
    200
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}
