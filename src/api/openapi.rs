//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the mediadl REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the mediadl REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "mediadl REST API",
        version = "0.1.0",
        description = "Dispatch media downloads as background jobs, poll their progress and fetch the produced files",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        // Tasks
        crate::api::routes::start_download,
        crate::api::routes::get_status,
        crate::api::routes::list_tasks,

        // Files
        crate::api::routes::get_file,
        crate::api::routes::list_downloads,
        crate::api::routes::open_downloads,
        crate::api::routes::reveal_file,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::TaskId,
        crate::types::TaskStatus,
        crate::types::ProgressPhase,
        crate::types::ProgressSnapshot,
        crate::types::LogLevel,
        crate::types::LogEntry,
        crate::types::DownloadOptions,
        crate::types::DownloadRequest,
        crate::types::DispatchResponse,
        crate::types::TaskSnapshot,
        crate::types::TaskSummary,
        crate::types::ListedFile,
        crate::types::ListDownloadsResponse,
        crate::types::OpenResponse,
        crate::types::Event,

        // Config types from config.rs
        crate::config::Config,
        crate::config::DownloadConfig,
        crate::config::EngineConfig,
        crate::config::RetentionConfig,
        crate::config::FileManagerConfig,
        crate::config::ApiConfig,

        // API request types from routes
        crate::api::routes::ListDownloadsQuery,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "tasks", description = "Download jobs - Dispatch downloads and poll their progress"),
        (name = "files", description = "Downloaded files - Fetch, list and reveal files in the download directory"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec, events"),
    )
)]
pub struct ApiDoc;
