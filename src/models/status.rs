//! File status DTOs and the porcelain code classification table.
//!
//! Both git backends report working-tree state as two porcelain-style
//! columns (index, worktree) per path. Classification into `FileStatus`
//! happens once, here, so the backends cannot drift apart.

use serde::{Deserialize, Serialize};

/// One path from `git status`, still carrying the raw porcelain columns.
/// A blank (space) column means "nothing in that column".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStatusEntry {
    pub path: String,
    pub index: char,
    pub worktree: char,
}

/// Adapter-level status result: the checked-out branch plus raw entries.
#[derive(Debug, Clone)]
pub struct RawStatus {
    pub current_branch: String,
    pub entries: Vec<RawStatusEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Unmodified,
    Modified,
    Created,
    Deleted,
    Renamed,
    Conflict,
}

impl FileStatus {
    /// Maps one porcelain column to a classification. Codes outside the
    /// table fall back to `Modified`.
    pub fn from_code(code: char) -> Self {
        match code {
            ' ' => FileStatus::Unmodified,
            'M' => FileStatus::Modified,
            'A' | '?' => FileStatus::Created,
            'D' => FileStatus::Deleted,
            'R' => FileStatus::Renamed,
            'U' => FileStatus::Conflict,
            _ => FileStatus::Modified,
        }
    }
}

/// The column pairs git documents as merge conflicts. A pair on this list
/// is a conflict no matter which column a caller is interested in.
const CONFLICT_PAIRS: [(char, char); 7] = [
    ('A', 'A'),
    ('D', 'D'),
    ('U', 'U'),
    ('A', 'U'),
    ('U', 'A'),
    ('D', 'U'),
    ('U', 'D'),
];

pub fn is_conflict_pair(index: char, worktree: char) -> bool {
    CONFLICT_PAIRS.contains(&(index, worktree))
}

/// A classified path, as stored in snapshots and served to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    pub status: FileStatus,
}
