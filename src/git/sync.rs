//! Repository synchronizer.
//!
//! Serves a valid cached snapshot when one exists, otherwise recomputes one
//! through tracked adapter calls: status, origin url, and the branch list
//! come first, the per-branch divergence queries fan out concurrently over
//! all local branches, and assembly waits on every issued call. One failed
//! divergence query fails the whole refresh; no partial results are cached.
//! The remote listing is the only degradable step, because remotes are
//! supplementary display data.

use std::collections::{HashMap, HashSet};
use std::fs;

use futures::future::join_all;
use tracing::warn;

use crate::context::AppContext;
use crate::error::{AppError, Result};
use crate::git::backend::GitAdapter;
use crate::models::{
    BranchDivergence, FileEntry, FileStatus, RawStatusEntry, RemoteInfo, RepoView, Snapshot,
    is_conflict_pair,
};

/// Canonicalizes a caller-supplied path into a repository identity. The
/// canonical form is the cache key, so two spellings of one directory hit
/// the same record.
pub fn normalize_identity(path: &str) -> Result<String> {
    let canonical = fs::canonicalize(path).map_err(|_| AppError::RepoNotFound(path.to_string()))?;
    Ok(canonical.to_string_lossy().into_owned())
}

/// Like `normalize_identity`, but keeps the raw spelling when the path no
/// longer exists on disk. Used for cache clearing, where the repository
/// may already be gone.
pub fn normalize_identity_lossy(path: &str) -> String {
    fs::canonicalize(path)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| path.to_string())
}

pub async fn refresh(
    ctx: &AppContext,
    adapter: &GitAdapter,
    identity: &str,
    force: bool,
) -> Result<RepoView> {
    if !force {
        if let Some(snapshot) = ctx.cache.load(identity) {
            return Ok(RepoView {
                snapshot,
                from_cache: true,
            });
        }
    }

    let status = ctx.tracker.track("git status", adapter.status()).await?;
    let origin_url = ctx
        .tracker
        .track("git remote get-url origin", adapter.origin_url())
        .await?;
    let branches = ctx.tracker.track("git branch", adapter.branch_local()).await?;

    // supplementary display data: a failed listing degrades to no remotes
    let remotes = match ctx
        .tracker
        .track("git remote -v", adapter.raw(&["remote", "-v"]))
        .await
    {
        Ok(out) => parse_remotes(&out),
        Err(e) => {
            warn!("remote listing failed for {}: {}", identity, e);
            Vec::new()
        }
    };

    // fan out divergence queries across all local branches and join on all
    // of them; any single failure aborts the refresh
    let queries = branches.iter().map(|branch| async move {
        let upstream = format!("origin/{}", branch);
        let counts = ctx
            .tracker
            .track(
                &format!("git rev-list --count {}...{}", upstream, branch),
                adapter.ahead_behind(branch, &upstream),
            )
            .await?;
        Ok::<_, AppError>((branch.clone(), counts))
    });
    let counts = join_all(queries)
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()?;
    let divergence = collect_divergence(counts);

    let stashes = ctx.tracker.track("git stash list", adapter.stash_list()).await?;

    let (unstaged, staged) = split_entries(&status.entries);
    let modified_count = count_changed_paths(&unstaged, &staged);

    let mut snapshot = Snapshot {
        current_branch: status.current_branch,
        origin_url,
        unstaged,
        staged,
        modified_count,
        branches,
        remotes,
        divergence,
        stashes,
        branch_commits: HashMap::new(),
    };
    // commit lists refresh incrementally through the commits endpoint, so
    // carry the previously-cached map forward untouched
    if let Some(previous) = ctx.cache.load(identity) {
        snapshot.branch_commits = previous.branch_commits;
    }
    ctx.cache.save(identity, &snapshot)?;

    Ok(RepoView {
        snapshot,
        from_cache: false,
    })
}

/// Splits raw status entries into unstaged and staged lists. A path lands
/// in exactly one list: a non-blank worktree column wins, otherwise a
/// non-blank, non-untracked index column means staged.
fn split_entries(entries: &[RawStatusEntry]) -> (Vec<FileEntry>, Vec<FileEntry>) {
    let mut unstaged = Vec::new();
    let mut staged = Vec::new();
    for entry in entries {
        if entry.worktree != ' ' {
            let status = if is_conflict_pair(entry.index, entry.worktree) {
                FileStatus::Conflict
            } else {
                FileStatus::from_code(entry.worktree)
            };
            unstaged.push(FileEntry {
                path: entry.path.clone(),
                status,
            });
        } else if entry.index != ' ' && entry.index != '?' {
            let status = if is_conflict_pair(entry.index, entry.worktree) {
                FileStatus::Conflict
            } else {
                FileStatus::from_code(entry.index)
            };
            staged.push(FileEntry {
                path: entry.path.clone(),
                status,
            });
        }
    }
    (unstaged, staged)
}

/// Distinct changed paths across both lists; a path present in both counts
/// once.
fn count_changed_paths(unstaged: &[FileEntry], staged: &[FileEntry]) -> usize {
    unstaged
        .iter()
        .chain(staged)
        .map(|entry| entry.path.as_str())
        .collect::<HashSet<_>>()
        .len()
}

/// Keeps only branches that have actually diverged. In-sync branches carry
/// no information worth caching.
fn collect_divergence(
    counts: impl IntoIterator<Item = (String, (usize, usize))>,
) -> HashMap<String, BranchDivergence> {
    counts
        .into_iter()
        .filter(|(_, (ahead, behind))| *ahead > 0 || *behind > 0)
        .map(|(branch, (ahead, behind))| (branch, BranchDivergence { ahead, behind }))
        .collect()
}

/// Parses `git remote -v` output: name, whitespace, url. Lines that don't
/// match are skipped; fetch/push duplicates collapse to one entry.
fn parse_remotes(out: &str) -> Vec<RemoteInfo> {
    let mut seen = HashSet::new();
    let mut remotes = Vec::new();
    for line in out.lines() {
        let mut fields = line.split_whitespace();
        let (Some(name), Some(url)) = (fields.next(), fields.next()) else {
            continue;
        };
        if seen.insert(name.to_string()) {
            remotes.push(RemoteInfo {
                name: name.to_string(),
                url: url.to_string(),
            });
        }
    }
    remotes
}
