use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::git::SharedService;
use crate::models::{CommitIdListResponse, HistoryResponse};
use crate::routes::run_blocking;

pub fn routes(service: SharedService) -> Router {
    Router::new()
        .route("/api/v1/repositories/{repo}/commits", get(get_commit_ids))
        .route("/api/v1/repositories/{repo}/history", get(get_history))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
struct FileQuery {
    path: String,
}

async fn get_commit_ids(
    State(service): State<SharedService>,
    Path(repo): Path<String>,
    Query(query): Query<FileQuery>,
) -> Result<Json<CommitIdListResponse>> {
    let (r, p) = (repo.clone(), query.path.clone());
    let commits = run_blocking(service, move |s| s.list_commits_for_file(&p, &r)).await?;
    Ok(Json(CommitIdListResponse {
        repository: repo,
        path: query.path,
        commits,
    }))
}

async fn get_history(
    State(service): State<SharedService>,
    Path(repo): Path<String>,
    Query(query): Query<FileQuery>,
) -> Result<Json<HistoryResponse>> {
    let (r, p) = (repo.clone(), query.path.clone());
    let commits = run_blocking(service, move |s| s.history(&p, &r)).await?;
    Ok(Json(HistoryResponse {
        repository: repo,
        path: query.path,
        commits,
    }))
}
