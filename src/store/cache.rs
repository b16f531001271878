//! Disk-backed snapshot cache.
//!
//! One JSON file per repository identity under `<data_dir>/snapshots/`,
//! wrapping the snapshot in a versioned, timestamped envelope. A record is
//! served only when its schema version, embedded identity, and age all
//! check out; anything else is a miss, never an error. Writes go through a
//! temp file and rename so a crashed write can't be read back as valid.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::models::{CommitSummary, Snapshot};
use crate::store::cache_key;

/// Bumped whenever the snapshot schema changes shape; older records are
/// discarded on read.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Records older than this are treated as absent.
pub const MAX_SNAPSHOT_AGE_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// On-disk envelope around one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    pub repo_path: String,
    /// Epoch milliseconds at write time.
    pub timestamp: i64,
    pub version: u32,
    pub data: Snapshot,
}

#[derive(Debug, Clone)]
pub struct SnapshotCache {
    dir: PathBuf,
}

impl SnapshotCache {
    pub fn new(data_dir: &Path) -> Result<Self> {
        let dir = data_dir.join("snapshots");
        fs::create_dir_all(&dir).map_err(|e| {
            AppError::Config(format!("cannot create cache directory {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    fn file_for(&self, identity: &str) -> PathBuf {
        self.dir.join(format!("{}.json", cache_key(identity)))
    }

    /// Returns the cached snapshot for `identity`, or `None` for missing,
    /// unreadable, version-mismatched, mismatched-identity, or stale
    /// records.
    pub fn load(&self, identity: &str) -> Option<Snapshot> {
        self.load_at(identity, Utc::now().timestamp_millis())
    }

    fn load_at(&self, identity: &str, now_ms: i64) -> Option<Snapshot> {
        Some(self.read_record(identity, now_ms)?.data)
    }

    fn read_record(&self, identity: &str, now_ms: i64) -> Option<CacheRecord> {
        let path = self.file_for(identity);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => return None,
        };
        let record: CacheRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!("discarding unreadable cache record {}: {}", path.display(), e);
                return None;
            }
        };
        if record.version != SNAPSHOT_VERSION {
            warn!(
                "discarding cache record {} with schema version {} (expected {})",
                path.display(),
                record.version,
                SNAPSHOT_VERSION
            );
            return None;
        }
        if record.repo_path != identity {
            warn!(
                "cache record {} belongs to {:?}, not {:?}",
                path.display(),
                record.repo_path,
                identity
            );
            return None;
        }
        if now_ms - record.timestamp > MAX_SNAPSHOT_AGE_MS {
            debug!("cache record {} is stale", path.display());
            return None;
        }
        Some(record)
    }

    /// Overwrites the record for `identity` unconditionally. Last writer
    /// wins; concurrent refreshes for the same identity are tolerated.
    pub fn save(&self, identity: &str, snapshot: &Snapshot) -> Result<()> {
        self.write_record(&CacheRecord {
            repo_path: identity.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            version: SNAPSHOT_VERSION,
            data: snapshot.clone(),
        })
    }

    fn write_record(&self, record: &CacheRecord) -> Result<()> {
        let path = self.file_for(&record.repo_path);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_string(record).map_err(|e| AppError::Internal(e.to_string()))?;
        fs::write(&tmp, body)
            .map_err(|e| AppError::Internal(format!("cache write to {} failed: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &path)
            .map_err(|e| AppError::Internal(format!("cache rename to {} failed: {}", path.display(), e)))?;
        Ok(())
    }

    pub fn clear(&self, identity: &str) -> Result<()> {
        let path = self.file_for(identity);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Internal(format!("cannot remove {}: {}", path.display(), e))),
        }
    }

    /// Removes every record, best-effort: individual failures are logged
    /// and the sweep continues. Returns how many files were removed.
    pub fn clear_all(&self) -> Result<usize> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| AppError::Internal(format!("cannot read {}: {}", self.dir.display(), e)))?;
        let mut removed = 0;
        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!("skipping unreadable cache entry: {}", e);
                    continue;
                }
            };
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => warn!("could not remove {}: {}", path.display(), e),
            }
        }
        Ok(removed)
    }

    /// Replaces one branch's commit list inside the cached record, leaving
    /// every other field and the record timestamp untouched. A missing or
    /// unreadable record makes this a no-op.
    pub fn merge_branch_commits(
        &self,
        identity: &str,
        branch: &str,
        commits: Vec<CommitSummary>,
    ) -> Result<()> {
        self.update_record(identity, |record| {
            record.data.branch_commits.insert(branch.to_string(), commits);
        })
    }

    /// Drops one branch's commit list from the cached record.
    pub fn remove_branch_commits(&self, identity: &str, branch: &str) -> Result<()> {
        self.update_record(identity, |record| {
            record.data.branch_commits.remove(branch);
        })
    }

    fn update_record(&self, identity: &str, apply: impl FnOnce(&mut CacheRecord)) -> Result<()> {
        let Some(mut record) = self.read_record(identity, Utc::now().timestamp_millis()) else {
            return Ok(());
        };
        apply(&mut record);
        self.write_record(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    use crate::models::{BranchDivergence, FileEntry, FileStatus, RemoteInfo, StashEntry};

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            current_branch: "main".to_string(),
            origin_url: Some("git@example.com:demo/repo.git".to_string()),
            unstaged: vec![FileEntry {
                path: "src/lib.rs".to_string(),
                status: FileStatus::Modified,
            }],
            staged: vec![FileEntry {
                path: "README.md".to_string(),
                status: FileStatus::Created,
            }],
            modified_count: 2,
            branches: vec!["main".to_string(), "feature".to_string()],
            remotes: vec![RemoteInfo {
                name: "origin".to_string(),
                url: "git@example.com:demo/repo.git".to_string(),
            }],
            divergence: HashMap::from([(
                "feature".to_string(),
                BranchDivergence { ahead: 2, behind: 1 },
            )]),
            stashes: vec![StashEntry {
                index: 0,
                message: "WIP on main".to_string(),
            }],
            branch_commits: HashMap::new(),
        }
    }

    fn cache() -> (TempDir, SnapshotCache) {
        let dir = TempDir::new().unwrap();
        let cache = SnapshotCache::new(dir.path()).unwrap();
        (dir, cache)
    }

    #[test]
    fn save_then_load_round_trips() {
        let (_dir, cache) = cache();
        let snapshot = sample_snapshot();
        cache.save("/home/u/repo", &snapshot).unwrap();
        assert_eq!(cache.load("/home/u/repo"), Some(snapshot));
    }

    #[test]
    fn missing_record_is_absent() {
        let (_dir, cache) = cache();
        assert_eq!(cache.load("/nowhere"), None);
    }

    #[test]
    fn corrupt_record_is_absent() {
        let (_dir, cache) = cache();
        cache.save("/repo", &sample_snapshot()).unwrap();
        fs::write(cache.file_for("/repo"), "{not json").unwrap();
        assert_eq!(cache.load("/repo"), None);
    }

    #[test]
    fn version_mismatch_is_absent() {
        let (_dir, cache) = cache();
        let record = CacheRecord {
            repo_path: "/repo".to_string(),
            timestamp: Utc::now().timestamp_millis(),
            version: SNAPSHOT_VERSION + 1,
            data: sample_snapshot(),
        };
        cache.write_record(&record).unwrap();
        assert_eq!(cache.load("/repo"), None);
    }

    #[test]
    fn identity_mismatch_is_absent() {
        let (_dir, cache) = cache();
        cache.save("/repo-a", &sample_snapshot()).unwrap();
        // plant repo-a's record under repo-b's filename
        fs::copy(cache.file_for("/repo-a"), cache.file_for("/repo-b")).unwrap();
        assert_eq!(cache.load("/repo-b"), None);
        assert!(cache.load("/repo-a").is_some());
    }

    #[test]
    fn staleness_bound_is_a_hard_edge() {
        let (_dir, cache) = cache();
        let now = Utc::now().timestamp_millis();
        let mut record = CacheRecord {
            repo_path: "/repo".to_string(),
            timestamp: now - MAX_SNAPSHOT_AGE_MS + 1_000,
            version: SNAPSHOT_VERSION,
            data: sample_snapshot(),
        };
        cache.write_record(&record).unwrap();
        assert!(cache.load_at("/repo", now).is_some(), "just under the bound");

        record.timestamp = now - MAX_SNAPSHOT_AGE_MS - 1_000;
        cache.write_record(&record).unwrap();
        assert_eq!(cache.load_at("/repo", now), None, "just over the bound");
    }

    #[test]
    fn last_save_wins() {
        let (_dir, cache) = cache();
        let first = sample_snapshot();
        let mut second = sample_snapshot();
        second.current_branch = "feature".to_string();
        second.stashes.clear();

        cache.save("/repo", &first).unwrap();
        cache.save("/repo", &second).unwrap();
        assert_eq!(cache.load("/repo"), Some(second));
    }

    #[test]
    fn clear_removes_one_identity() {
        let (_dir, cache) = cache();
        cache.save("/a", &sample_snapshot()).unwrap();
        cache.save("/b", &sample_snapshot()).unwrap();
        cache.clear("/a").unwrap();
        assert_eq!(cache.load("/a"), None);
        assert!(cache.load("/b").is_some());
        // clearing an already-absent identity is fine
        cache.clear("/a").unwrap();
    }

    #[test]
    fn clear_all_removes_everything() {
        let (_dir, cache) = cache();
        cache.save("/a", &sample_snapshot()).unwrap();
        cache.save("/b", &sample_snapshot()).unwrap();
        let removed = cache.clear_all().unwrap();
        assert_eq!(removed, 2);
        assert_eq!(cache.load("/a"), None);
        assert_eq!(cache.load("/b"), None);
    }

    #[test]
    fn merge_branch_commits_leaves_rest_of_record_alone() {
        let (_dir, cache) = cache();
        cache.save("/repo", &sample_snapshot()).unwrap();
        let before: CacheRecord =
            serde_json::from_str(&fs::read_to_string(cache.file_for("/repo")).unwrap()).unwrap();

        let commits = vec![CommitSummary {
            oid: "abc123".to_string(),
            message: "add parser".to_string(),
            author: "dev".to_string(),
            timestamp: 1_700_000_000,
        }];
        cache.merge_branch_commits("/repo", "feature", commits.clone()).unwrap();

        let after: CacheRecord =
            serde_json::from_str(&fs::read_to_string(cache.file_for("/repo")).unwrap()).unwrap();
        assert_eq!(after.timestamp, before.timestamp, "merge must not refresh the record");
        assert_eq!(after.data.branch_commits.get("feature"), Some(&commits));
        assert_eq!(after.data.current_branch, before.data.current_branch);
        assert_eq!(after.data.unstaged, before.data.unstaged);
    }

    #[test]
    fn remove_branch_commits_drops_one_branch() {
        let (_dir, cache) = cache();
        let mut snapshot = sample_snapshot();
        snapshot.branch_commits.insert(
            "feature".to_string(),
            vec![CommitSummary {
                oid: "abc".to_string(),
                message: "m".to_string(),
                author: "a".to_string(),
                timestamp: 0,
            }],
        );
        snapshot.branch_commits.insert("main".to_string(), Vec::new());
        cache.save("/repo", &snapshot).unwrap();

        cache.remove_branch_commits("/repo", "feature").unwrap();
        let loaded = cache.load("/repo").unwrap();
        assert!(!loaded.branch_commits.contains_key("feature"));
        assert!(loaded.branch_commits.contains_key("main"));
    }

    #[test]
    fn merge_into_missing_record_is_a_noop() {
        let (_dir, cache) = cache();
        cache.merge_branch_commits("/repo", "feature", Vec::new()).unwrap();
        assert_eq!(cache.load("/repo"), None);
    }
}
