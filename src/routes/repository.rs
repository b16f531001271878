//! Repository open/refresh endpoints.
//!
//! - GET /api/v1/repository?path=
//!   Opens a repository and returns its snapshot, served from the cache
//!   when a valid record exists. `from_cache` tells the UI whether it is
//!   looking at cached or freshly derived state.
//!
//! - POST /api/v1/repository/refresh { path }
//!   Forces a recomputation, bypassing the cache.
//!
//! - POST /api/v1/repository/clone { url, parent_dir, name }
//! - POST /api/v1/repository/init { path }

use std::path::PathBuf;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::context::SharedContext;
use crate::error::Result;
use crate::git::sync::{self, normalize_identity};
use crate::models::RepoView;

pub fn routes(ctx: SharedContext) -> Router {
    Router::new()
        .route("/api/v1/repository", get(get_repository))
        .route("/api/v1/repository/refresh", post(refresh_repository))
        .route("/api/v1/repository/clone", post(clone_repository))
        .route("/api/v1/repository/init", post(init_repository))
        .with_state(ctx)
}

#[derive(Debug, Deserialize)]
struct RepoQuery {
    path: String,
}

async fn get_repository(
    State(ctx): State<SharedContext>,
    Query(query): Query<RepoQuery>,
) -> Result<Json<RepoView>> {
    let identity = normalize_identity(&query.path)?;
    let adapter = ctx.backend.open(&identity).await?;
    let view = sync::refresh(&ctx, &adapter, &identity, false).await?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
struct RefreshRequest {
    path: String,
}

async fn refresh_repository(
    State(ctx): State<SharedContext>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<RepoView>> {
    let identity = normalize_identity(&request.path)?;
    let adapter = ctx.backend.open(&identity).await?;
    let view = sync::refresh(&ctx, &adapter, &identity, true).await?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
struct CloneRequest {
    url: String,
    parent_dir: PathBuf,
    name: String,
}

async fn clone_repository(
    State(ctx): State<SharedContext>,
    Json(request): Json<CloneRequest>,
) -> Result<Json<()>> {
    ctx.tracker
        .track(
            &format!("git clone {}", request.url),
            ctx.backend
                .clone_repo(&request.url, &request.parent_dir, &request.name),
        )
        .await?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
struct InitRequest {
    path: PathBuf,
}

async fn init_repository(
    State(ctx): State<SharedContext>,
    Json(request): Json<InitRequest>,
) -> Result<Json<()>> {
    ctx.tracker
        .track("git init", ctx.backend.init_repo(&request.path))
        .await?;
    Ok(Json(()))
}
