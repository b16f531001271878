//! Git execution backends and the synchronization core.
//!
//! - `backend`: backend selection plus the uniform adapter surface
//! - `cli`: subprocess backend (one spawned `git` per call)
//! - `native`: libgit2 backend (blocking calls on the tokio blocking pool)
//! - `tracker`: start/finish lifecycle events around every adapter call
//! - `sync`: cache-or-recompute orchestration producing snapshots

pub mod backend;
pub mod cli;
pub mod native;
pub mod sync;
pub mod tracker;

pub use backend::{BackendKind, GitAdapter};
pub use tracker::CommandTracker;
