//! API route handlers - maps HTTP endpoints to history operations.
//!
//! Each submodule defines routes for a feature area:
//! - `commits`: Commit ids and full commit history of a file
//! - `content`: File contents at a commit
//! - `diff`: HTML diff of a file between two commits
//!
//! Engine calls block on the query tool, so they run on the blocking pool.

pub mod commits;
pub mod content;
pub mod diff;

use axum::Router;

use crate::error::{AppError, Result};
use crate::git::{HistoryService, SharedService};

pub fn create_router(service: SharedService) -> Router {
    Router::new()
        .merge(commits::routes(service.clone()))
        .merge(content::routes(service.clone()))
        .merge(diff::routes(service))
}

async fn run_blocking<F, T>(service: SharedService, f: F) -> Result<T>
where
    F: FnOnce(&HistoryService) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&service))
        .await
        .map_err(|e| AppError::Internal(format!("Worker task failed: {}", e)))?
}
