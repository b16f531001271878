//! Settings endpoints.
//!
//! - GET  /api/v1/settings         Current settings (defaults when absent)
//! - PUT  /api/v1/settings         Replace and persist settings
//! - POST /api/v1/settings/reset   Restore and persist defaults

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::context::SharedContext;
use crate::error::Result;
use crate::models::Settings;

pub fn routes(ctx: SharedContext) -> Router {
    Router::new()
        .route("/api/v1/settings", get(get_settings).put(put_settings))
        .route("/api/v1/settings/reset", post(reset_settings))
        .with_state(ctx)
}

async fn get_settings(State(ctx): State<SharedContext>) -> Result<Json<Settings>> {
    Ok(Json(ctx.settings.load()))
}

async fn put_settings(
    State(ctx): State<SharedContext>,
    Json(settings): Json<Settings>,
) -> Result<Json<Settings>> {
    ctx.settings.save(&settings)?;
    Ok(Json(settings))
}

async fn reset_settings(State(ctx): State<SharedContext>) -> Result<Json<Settings>> {
    Ok(Json(ctx.settings.reset()?))
}
