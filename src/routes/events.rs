//! Command lifecycle event stream.
//!
//! GET /api/v1/events
//!
//! Server-sent events, one JSON-encoded `CommandEvent` per message. Any
//! number of clients can subscribe; each gets its own broadcast receiver.
//! A client that falls too far behind skips the missed events and keeps
//! receiving from there.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::Stream;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::context::SharedContext;

pub fn routes(ctx: SharedContext) -> Router {
    Router::new()
        .route("/api/v1/events", get(subscribe_events))
        .with_state(ctx)
}

async fn subscribe_events(
    State(ctx): State<SharedContext>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(ctx.tracker.subscribe()).filter_map(|event| {
        let event = event.ok()?;
        let json = serde_json::to_string(&event).ok()?;
        Some(Ok(Event::default().data(json)))
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
