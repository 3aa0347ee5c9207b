use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::git::SharedService;
use crate::models::DiffResponse;
use crate::routes::run_blocking;

pub fn routes(service: SharedService) -> Router {
    Router::new()
        .route("/api/v1/repositories/{repo}/diff", get(get_diff))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
struct DiffQuery {
    from: String,
    to: String,
    path: String,
}

async fn get_diff(
    State(service): State<SharedService>,
    Path(repo): Path<String>,
    Query(query): Query<DiffQuery>,
) -> Result<Json<DiffResponse>> {
    let (r, from, to, p) = (
        repo.clone(),
        query.from.clone(),
        query.to.clone(),
        query.path.clone(),
    );
    let html = run_blocking(service, move |s| s.diff(&from, &to, &p, &r)).await?;
    Ok(Json(DiffResponse {
        repository: repo,
        path: query.path,
        from_commit: query.from,
        to_commit: query.to,
        html,
    }))
}
