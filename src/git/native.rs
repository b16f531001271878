//! Native libgit2 backend.
//!
//! Blocking libgit2 calls run on the tokio blocking pool; the repository
//! handle lives behind a mutex because libgit2 handles are not thread-safe
//! to share. Status flags are projected onto the same two porcelain columns
//! the subprocess backend reports, so both variants feed the classifier
//! identical codes.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use git2::{BranchType, ErrorCode, Repository, Sort, StatusOptions};
use tokio::process::Command;
use tokio::task;

use crate::error::{AppError, Result};
use crate::models::{CommitSummary, RawStatus, RawStatusEntry, StashEntry};

pub struct NativeBackend {
    repo: Arc<Mutex<Repository>>,
    path: PathBuf,
}

impl NativeBackend {
    pub async fn open(identity: &str) -> Result<Self> {
        let path = PathBuf::from(identity);
        let opened = {
            let path = path.clone();
            task::spawn_blocking(move || Repository::open(path))
                .await
                .map_err(|e| AppError::Internal(format!("git task join failure: {}", e)))?
        };
        let repo = opened.map_err(|_| AppError::RepoNotFound(identity.to_string()))?;
        Ok(Self {
            repo: Arc::new(Mutex::new(repo)),
            path,
        })
    }

    async fn with_repo<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Repository) -> Result<T> + Send + 'static,
    {
        let repo = Arc::clone(&self.repo);
        task::spawn_blocking(move || {
            let mut repo = repo
                .lock()
                .map_err(|_| AppError::Internal("repository handle poisoned".to_string()))?;
            f(&mut repo)
        })
        .await
        .map_err(|e| AppError::Internal(format!("git task join failure: {}", e)))?
    }

    pub async fn status(&self) -> Result<RawStatus> {
        self.with_repo(|repo| {
            let current_branch = head_branch_name(repo);
            let mut opts = StatusOptions::new();
            opts.include_untracked(true)
                .recurse_untracked_dirs(true)
                .renames_head_to_index(true);
            let statuses = repo.statuses(Some(&mut opts))?;
            let mut entries = Vec::new();
            for entry in statuses.iter() {
                let Some(path) = entry.path() else { continue };
                let (index, worktree) = porcelain_columns(entry.status());
                if index == ' ' && worktree == ' ' {
                    continue;
                }
                entries.push(RawStatusEntry {
                    path: path.to_string(),
                    index,
                    worktree,
                });
            }
            Ok(RawStatus {
                current_branch,
                entries,
            })
        })
        .await
    }

    pub async fn branch_local(&self) -> Result<Vec<String>> {
        self.with_repo(|repo| {
            let mut names = Vec::new();
            for branch in repo.branches(Some(BranchType::Local))? {
                let (branch, _) = branch?;
                if let Some(name) = branch.name()? {
                    names.push(name.to_string());
                }
            }
            Ok(names)
        })
        .await
    }

    pub async fn ahead_behind(&self, branch: &str, upstream: &str) -> Result<(usize, usize)> {
        let branch = branch.to_string();
        let upstream = upstream.to_string();
        self.with_repo(move |repo| {
            let local = repo.revparse_single(&branch)?.id();
            let remote = match repo.revparse_single(&upstream) {
                Ok(obj) => obj.id(),
                // no upstream counterpart, nothing to diverge from
                Err(e) if e.code() == ErrorCode::NotFound => return Ok((0, 0)),
                Err(e) => return Err(e.into()),
            };
            Ok(repo.graph_ahead_behind(local, remote)?)
        })
        .await
    }

    pub async fn stash_list(&self) -> Result<Vec<StashEntry>> {
        self.with_repo(|repo| {
            let mut stashes = Vec::new();
            repo.stash_foreach(|index, message, _oid| {
                stashes.push(StashEntry {
                    index,
                    message: message.to_string(),
                });
                true
            })?;
            Ok(stashes)
        })
        .await
    }

    pub async fn origin_url(&self) -> Result<Option<String>> {
        self.with_repo(|repo| match repo.find_remote("origin") {
            Ok(remote) => Ok(remote.url().map(|url| url.to_string())),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        })
        .await
    }

    /// Verbatim argv has no libgit2 equivalent and the adapter contract
    /// pins its output to what the git binary prints, so this variant
    /// delegates raw calls to a subprocess.
    pub async fn raw(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.path)
            .output()
            .await
            .map_err(|e| AppError::Adapter(format!("failed to spawn git: {}", e)))?;
        if !output.status.success() {
            return Err(AppError::Adapter(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    pub async fn log_commits(&self, branch: &str, limit: usize) -> Result<Vec<CommitSummary>> {
        let branch = branch.to_string();
        self.with_repo(move |repo| {
            let tip = repo.revparse_single(&branch)?.id();
            let mut revwalk = repo.revwalk()?;
            revwalk.set_sorting(Sort::TIME)?;
            revwalk.push(tip)?;

            let mut commits = Vec::new();
            for oid in revwalk.take(limit) {
                let oid = oid?;
                let commit = repo.find_commit(oid)?;
                commits.push(CommitSummary {
                    oid: oid.to_string(),
                    message: commit.summary().unwrap_or("").to_string(),
                    author: commit.author().name().unwrap_or("Unknown").to_string(),
                    timestamp: commit.time().seconds(),
                });
            }
            Ok(commits)
        })
        .await
    }

    pub async fn clone_repo(url: &str, parent_dir: &Path, name: &str) -> Result<()> {
        let url = url.to_string();
        let target = parent_dir.join(name);
        task::spawn_blocking(move || {
            Repository::clone(&url, &target)?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(format!("git task join failure: {}", e)))?
    }

    pub async fn init_repo(path: &Path) -> Result<()> {
        let path = path.to_path_buf();
        task::spawn_blocking(move || {
            Repository::init(&path)?;
            Ok(())
        })
        .await
        .map_err(|e| AppError::Internal(format!("git task join failure: {}", e)))?
    }
}

fn head_branch_name(repo: &Repository) -> String {
    if let Ok(head) = repo.head() {
        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return name.to_string();
            }
        }
        return "HEAD".to_string();
    }
    // an unborn HEAD still names its target branch symbolically
    repo.find_reference("HEAD")
        .ok()
        .and_then(|r| {
            r.symbolic_target()
                .map(|t| t.trim_start_matches("refs/heads/").to_string())
        })
        .unwrap_or_else(|| "HEAD".to_string())
}

/// Projects libgit2 status flags onto the two porcelain columns.
fn porcelain_columns(status: git2::Status) -> (char, char) {
    if status.is_conflicted() {
        return ('U', 'U');
    }
    if status.is_wt_new() {
        return ('?', '?');
    }
    let index = if status.is_index_new() {
        'A'
    } else if status.is_index_modified() {
        'M'
    } else if status.is_index_deleted() {
        'D'
    } else if status.is_index_renamed() {
        'R'
    } else if status.is_index_typechange() {
        'T'
    } else {
        ' '
    };
    let worktree = if status.is_wt_modified() {
        'M'
    } else if status.is_wt_deleted() {
        'D'
    } else if status.is_wt_renamed() {
        'R'
    } else if status.is_wt_typechange() {
        'T'
    } else {
        ' '
    };
    (index, worktree)
}
