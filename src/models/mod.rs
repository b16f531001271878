//! Data transfer objects (DTOs) for API responses and cached state.
//!
//! These structs are serialized to JSON for frontend consumption and for
//! the on-disk snapshot cache.
//! - `snapshot`: Snapshot, RemoteInfo, BranchDivergence, StashEntry,
//!   CommitSummary, RepoView
//! - `status`: FileEntry, FileStatus, raw porcelain status types
//! - `command`: CommandEvent lifecycle messages for the event stream
//! - `settings`: Settings envelope contents and branch-pattern matching

pub mod command;
pub mod settings;
pub mod snapshot;
pub mod status;

pub use command::*;
pub use settings::*;
pub use snapshot::*;
pub use status::*;
