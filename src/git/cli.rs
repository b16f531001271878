//! Subprocess git backend.
//!
//! Every call spawns one `git` process in the repository's working
//! directory and parses its porcelain output. A nonzero exit status becomes
//! an adapter error carrying git's stderr verbatim.

use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::error::{AppError, Result};
use crate::models::{CommitSummary, RawStatus, RawStatusEntry, StashEntry};

pub struct CliBackend {
    workdir: PathBuf,
}

impl CliBackend {
    pub async fn open(identity: &str) -> Result<Self> {
        let backend = Self {
            workdir: PathBuf::from(identity),
        };
        // rev-parse both validates the path and confirms git sees a repo there
        backend
            .run(&["rev-parse", "--git-dir"])
            .await
            .map_err(|_| AppError::RepoNotFound(identity.to_string()))?;
        Ok(backend)
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        run_git_in(&self.workdir, args).await
    }

    pub async fn status(&self) -> Result<RawStatus> {
        // symbolic-ref names the branch even before its first commit;
        // it fails when HEAD is detached
        let current_branch = match self.run(&["symbolic-ref", "--short", "-q", "HEAD"]).await {
            Ok(out) if !out.trim().is_empty() => out.trim().to_string(),
            _ => "HEAD".to_string(),
        };
        let porcelain = self.run(&["status", "--porcelain"]).await?;
        Ok(RawStatus {
            current_branch,
            entries: parse_porcelain(&porcelain),
        })
    }

    pub async fn branch_local(&self) -> Result<Vec<String>> {
        let out = self
            .run(&["for-each-ref", "refs/heads", "--format=%(refname:short)"])
            .await?;
        Ok(out
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }

    pub async fn ahead_behind(&self, branch: &str, upstream: &str) -> Result<(usize, usize)> {
        if self.run(&["rev-parse", "--verify", "--quiet", upstream]).await.is_err() {
            // no upstream counterpart, nothing to diverge from
            return Ok((0, 0));
        }
        let range = format!("{}...{}", upstream, branch);
        let out = self.run(&["rev-list", "--left-right", "--count", &range]).await?;
        parse_ahead_behind(&out)
    }

    pub async fn stash_list(&self) -> Result<Vec<StashEntry>> {
        let out = self.run(&["stash", "list", "--format=%gd%x09%gs"]).await?;
        Ok(parse_stash_list(&out))
    }

    pub async fn origin_url(&self) -> Result<Option<String>> {
        // a repository without an origin remote is a normal state
        match self.run(&["remote", "get-url", "origin"]).await {
            Ok(out) => {
                let url = out.trim();
                Ok((!url.is_empty()).then(|| url.to_string()))
            }
            Err(_) => Ok(None),
        }
    }

    pub async fn raw(&self, args: &[&str]) -> Result<String> {
        self.run(args).await
    }

    pub async fn log_commits(&self, branch: &str, limit: usize) -> Result<Vec<CommitSummary>> {
        let max_count = format!("--max-count={}", limit);
        let out = self
            .run(&["log", branch, &max_count, "--format=%H%x09%an%x09%at%x09%s"])
            .await?;
        Ok(parse_log(&out))
    }

    pub async fn clone_repo(url: &str, parent_dir: &Path, name: &str) -> Result<()> {
        run_git_in(parent_dir, &["clone", url, name]).await?;
        Ok(())
    }

    pub async fn init_repo(path: &Path) -> Result<()> {
        let parent = path.parent().unwrap_or(Path::new("."));
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| AppError::Internal(format!("invalid init path {}", path.display())))?;
        run_git_in(parent, &["init", &name]).await?;
        Ok(())
    }
}

async fn run_git_in(workdir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(workdir)
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

/// Parses `git status --porcelain` v1: two status columns, a space, then
/// the path. Renames carry "old -> new"; the new path is the one reported.
fn parse_porcelain(out: &str) -> Vec<RawStatusEntry> {
    let mut entries = Vec::new();
    for line in out.lines() {
        let bytes = line.as_bytes();
        if bytes.len() < 4 {
            continue;
        }
        let index = bytes[0] as char;
        let worktree = bytes[1] as char;
        let rest = &line[3..];
        let path = match rest.split_once(" -> ") {
            Some((_, new_path)) => new_path,
            None => rest,
        };
        entries.push(RawStatusEntry {
            path: path.to_string(),
            index,
            worktree,
        });
    }
    entries
}

/// `rev-list --left-right --count upstream...branch` prints
/// "<only-in-upstream>\t<only-in-branch>", i.e. "behind ahead".
fn parse_ahead_behind(out: &str) -> Result<(usize, usize)> {
    let mut fields = out.split_whitespace();
    let behind = fields.next().and_then(|v| v.parse().ok());
    let ahead = fields.next().and_then(|v| v.parse().ok());
    match (ahead, behind) {
        (Some(ahead), Some(behind)) => Ok((ahead, behind)),
        _ => Err(AppError::Adapter(format!(
            "unexpected rev-list output: {:?}",
            out.trim()
        ))),
    }
}

fn parse_stash_list(out: &str) -> Vec<StashEntry> {
    out.lines()
        .filter_map(|line| {
            let (selector, message) = line.split_once('\t')?;
            let index = selector
                .strip_prefix("stash@{")?
                .strip_suffix('}')?
                .parse()
                .ok()?;
            Some(StashEntry {
                index,
                message: message.to_string(),
            })
        })
        .collect()
}

fn parse_log(out: &str) -> Vec<CommitSummary> {
    out.lines()
        .filter_map(|line| {
            let mut fields = line.splitn(4, '\t');
            let oid = fields.next()?;
            let author = fields.next()?;
            let timestamp = fields.next()?.parse().ok()?;
            let message = fields.next().unwrap_or("");
            Some(CommitSummary {
                oid: oid.to_string(),
                message: message.to_string(),
                author: author.to_string(),
                timestamp,
            })
        })
        .collect()
}
