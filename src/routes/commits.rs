//! Per-branch commit list endpoints.
//!
//! Commit history is too expensive to derive for every branch on every
//! refresh, so it lives in a sub-cache inside the snapshot record, filled
//! in branch by branch as the UI asks for it.
//!
//! - GET /api/v1/repository/commits?path=&branch=&limit=
//!   Serves the cached list when present, otherwise fetches it from the
//!   adapter and merges it into the cached snapshot.
//!
//! - DELETE /api/v1/repository/commits?path=&branch=
//!   Drops one branch's cached list (e.g. after the branch is deleted).

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::context::SharedContext;
use crate::error::Result;
use crate::git::sync::normalize_identity;
use crate::models::CommitSummary;

const DEFAULT_COMMIT_LIMIT: usize = 200;

pub fn routes(ctx: SharedContext) -> Router {
    Router::new()
        .route(
            "/api/v1/repository/commits",
            get(get_branch_commits).delete(delete_branch_commits),
        )
        .with_state(ctx)
}

#[derive(Debug, Deserialize)]
struct CommitsQuery {
    path: String,
    branch: String,
    limit: Option<usize>,
}

async fn get_branch_commits(
    State(ctx): State<SharedContext>,
    Query(query): Query<CommitsQuery>,
) -> Result<Json<Vec<CommitSummary>>> {
    let identity = normalize_identity(&query.path)?;

    if let Some(snapshot) = ctx.cache.load(&identity) {
        if let Some(commits) = snapshot.branch_commits.get(&query.branch) {
            return Ok(Json(commits.clone()));
        }
    }

    let adapter = ctx.backend.open(&identity).await?;
    let limit = query.limit.unwrap_or(DEFAULT_COMMIT_LIMIT);
    let commits = ctx
        .tracker
        .track(
            &format!("git log {}", query.branch),
            adapter.log_commits(&query.branch, limit),
        )
        .await?;
    ctx.cache
        .merge_branch_commits(&identity, &query.branch, commits.clone())?;
    Ok(Json(commits))
}

#[derive(Debug, Deserialize)]
struct DeleteCommitsQuery {
    path: String,
    branch: String,
}

async fn delete_branch_commits(
    State(ctx): State<SharedContext>,
    Query(query): Query<DeleteCommitsQuery>,
) -> Result<Json<()>> {
    let identity = normalize_identity(&query.path)?;
    ctx.cache.remove_branch_commits(&identity, &query.branch)?;
    Ok(Json(()))
}
