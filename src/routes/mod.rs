//! API route handlers - the cross-process surface the UI shell talks to.
//!
//! Each submodule defines routes for a feature area:
//! - `repository`: open/refresh a repository, clone, init
//! - `commits`: the lazily-populated per-branch commit lists
//! - `cache`: explicit snapshot-cache invalidation
//! - `settings`: read/update/reset the settings envelope
//! - `events`: SSE stream of command start/finish events

pub mod cache;
pub mod commits;
pub mod events;
pub mod repository;
pub mod settings;

use axum::Router;

use crate::context::SharedContext;

pub fn create_router(ctx: SharedContext) -> Router {
    Router::new()
        .merge(repository::routes(ctx.clone()))
        .merge(commits::routes(ctx.clone()))
        .merge(cache::routes(ctx.clone()))
        .merge(settings::routes(ctx.clone()))
        .merge(events::routes(ctx))
}
