//! Snapshot DTOs.
//!
//! - `Snapshot`: the derived view of one repository, written once per
//!   successful refresh and superseded (never edited) by the next one
//! - `RepoView`: a snapshot plus its provenance flag (`from_cache`)
//! - `BranchDivergence`: ahead/behind counts; in-sync branches are omitted
//!   from the snapshot entirely
//! - `CommitSummary`: one row of the lazily-populated per-branch commit list

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::status::FileEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub current_branch: String,
    pub origin_url: Option<String>,
    pub unstaged: Vec<FileEntry>,
    pub staged: Vec<FileEntry>,
    /// Distinct changed paths across both lists.
    pub modified_count: usize,
    pub branches: Vec<String>,
    pub remotes: Vec<RemoteInfo>,
    /// Only branches with nonzero divergence appear here.
    pub divergence: HashMap<String, BranchDivergence>,
    pub stashes: Vec<StashEntry>,
    /// Per-branch commit lists, filled in lazily by the commits endpoint
    /// and carried across refreshes untouched.
    #[serde(default)]
    pub branch_commits: HashMap<String, Vec<CommitSummary>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteInfo {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchDivergence {
    pub ahead: usize,
    pub behind: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StashEntry {
    pub index: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub oid: String,
    pub message: String,
    pub author: String,
    pub timestamp: i64,
}

/// What the refresh surface returns: the snapshot and whether it was served
/// from the cache or freshly computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoView {
    pub snapshot: Snapshot,
    pub from_cache: bool,
}
