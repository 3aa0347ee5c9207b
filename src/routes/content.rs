//! File content endpoint.
//!
//! GET /api/v1/repositories/{repo}/content?commit=<id>&path=<path>

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::git::SharedService;
use crate::models::ContentResponse;
use crate::routes::run_blocking;

pub fn routes(service: SharedService) -> Router {
    Router::new()
        .route("/api/v1/repositories/{repo}/content", get(get_content))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
struct ContentQuery {
    commit: String,
    path: String,
}

async fn get_content(
    State(service): State<SharedService>,
    Path(repo): Path<String>,
    Query(query): Query<ContentQuery>,
) -> Result<Json<ContentResponse>> {
    let (r, c, p) = (repo.clone(), query.commit.clone(), query.path.clone());
    let contents = run_blocking(service, move |s| s.content_at_commit(&c, &p, &r)).await?;
    Ok(Json(ContentResponse {
        repository: repo,
        path: query.path,
        commit: query.commit,
        contents,
    }))
}
