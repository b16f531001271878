//! Snapshot cache invalidation endpoints.
//!
//! - DELETE /api/v1/cache?path=
//!   Removes one repository's cached snapshot. The path is canonicalized
//!   when it still exists on disk and used as-is otherwise, so a deleted
//!   repository's record can still be cleared.
//!
//! - DELETE /api/v1/cache
//!   Removes every cached snapshot, best-effort.

use axum::{
    extract::{Query, State},
    routing::delete,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::context::SharedContext;
use crate::error::Result;
use crate::git::sync::normalize_identity_lossy;

pub fn routes(ctx: SharedContext) -> Router {
    Router::new()
        .route("/api/v1/cache", delete(clear_cache))
        .with_state(ctx)
}

#[derive(Debug, Deserialize)]
struct ClearQuery {
    path: Option<String>,
}

#[derive(Debug, Serialize)]
struct ClearResponse {
    cleared: usize,
}

async fn clear_cache(
    State(ctx): State<SharedContext>,
    Query(query): Query<ClearQuery>,
) -> Result<Json<ClearResponse>> {
    let cleared = match query.path {
        Some(path) => {
            let identity = normalize_identity_lossy(&path);
            ctx.cache.clear(&identity)?;
            1
        }
        None => ctx.cache.clear_all()?,
    };
    Ok(Json(ClearResponse { cleared }))
}
