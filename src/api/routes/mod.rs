//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`tasks`] - Dispatching jobs and polling their state
//! - [`files`] - Serving, listing and revealing downloaded files
//! - [`system`] - Health, events, OpenAPI

use serde::{Deserialize, Serialize};

mod files;
mod system;
mod tasks;

// Re-export all handlers so `routes::function_name` continues to work
pub use files::*;
pub use system::*;
pub use tasks::*;

/// Query parameters for GET /list_downloads
#[derive(Debug, Default, Deserialize, Serialize, utoipa::IntoParams, utoipa::ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ListDownloadsQuery {
    /// Maximum number of files to return (default: 200)
    pub limit: Option<usize>,
}
