//! Backend selection and adapter dispatch.
//!
//! The adapter capability surface is one enum with a variant per git
//! execution technology. Callers hold a `GitAdapter` and never learn which
//! technology is behind it; both variants must classify files, count
//! divergence, and list stashes identically, because the active variant can
//! change between application runs via `--git-backend`.

use std::path::Path;

use tracing::warn;

use crate::error::Result;
use crate::models::{CommitSummary, RawStatus, StashEntry};

use super::cli::CliBackend;
use super::native::NativeBackend;

/// Which git execution technology backs adapter calls. Resolved once per
/// process from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Cli,
    Native,
}

impl BackendKind {
    /// Maps a configuration name onto a backend, falling back to the
    /// subprocess backend on anything unrecognized.
    pub fn from_name(name: &str) -> Self {
        match name {
            "cli" | "subprocess" => BackendKind::Cli,
            "native" | "git2" | "libgit2" => BackendKind::Native,
            other => {
                warn!("unknown git backend {:?}, falling back to cli", other);
                BackendKind::Cli
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Cli => "cli",
            BackendKind::Native => "native",
        }
    }

    /// Constructs a fresh adapter bound to one repository identity.
    /// Adapters are never shared across repositories; opening a second
    /// identity means a second, independent instance.
    pub async fn open(self, identity: &str) -> Result<GitAdapter> {
        match self {
            BackendKind::Cli => Ok(GitAdapter::Cli(CliBackend::open(identity).await?)),
            BackendKind::Native => Ok(GitAdapter::Native(NativeBackend::open(identity).await?)),
        }
    }

    /// Clones `url` into `parent_dir/name`.
    pub async fn clone_repo(self, url: &str, parent_dir: &Path, name: &str) -> Result<()> {
        match self {
            BackendKind::Cli => CliBackend::clone_repo(url, parent_dir, name).await,
            BackendKind::Native => NativeBackend::clone_repo(url, parent_dir, name).await,
        }
    }

    /// Initializes a new repository at `path`.
    pub async fn init_repo(self, path: &Path) -> Result<()> {
        match self {
            BackendKind::Cli => CliBackend::init_repo(path).await,
            BackendKind::Native => NativeBackend::init_repo(path).await,
        }
    }
}

/// Uniform capability surface over one open repository.
pub enum GitAdapter {
    Cli(CliBackend),
    Native(NativeBackend),
}

impl GitAdapter {
    /// Current branch plus raw two-column status entries.
    pub async fn status(&self) -> Result<RawStatus> {
        match self {
            GitAdapter::Cli(b) => b.status().await,
            GitAdapter::Native(b) => b.status().await,
        }
    }

    /// Local branch names, short form.
    pub async fn branch_local(&self) -> Result<Vec<String>> {
        match self {
            GitAdapter::Cli(b) => b.branch_local().await,
            GitAdapter::Native(b) => b.branch_local().await,
        }
    }

    /// Commit counts `(ahead, behind)` of `branch` relative to `upstream`.
    /// A missing upstream is zero divergence, not a failure.
    pub async fn ahead_behind(&self, branch: &str, upstream: &str) -> Result<(usize, usize)> {
        match self {
            GitAdapter::Cli(b) => b.ahead_behind(branch, upstream).await,
            GitAdapter::Native(b) => b.ahead_behind(branch, upstream).await,
        }
    }

    pub async fn stash_list(&self) -> Result<Vec<StashEntry>> {
        match self {
            GitAdapter::Cli(b) => b.stash_list().await,
            GitAdapter::Native(b) => b.stash_list().await,
        }
    }

    /// URL of the `origin` remote, or `None` when no origin is configured.
    pub async fn origin_url(&self) -> Result<Option<String>> {
        match self {
            GitAdapter::Cli(b) => b.origin_url().await,
            GitAdapter::Native(b) => b.origin_url().await,
        }
    }

    /// Verbatim git invocation; output is whatever the git binary prints.
    pub async fn raw(&self, args: &[&str]) -> Result<String> {
        match self {
            GitAdapter::Cli(b) => b.raw(args).await,
            GitAdapter::Native(b) => b.raw(args).await,
        }
    }

    /// Newest-first commit summaries reachable from `branch`.
    pub async fn log_commits(&self, branch: &str, limit: usize) -> Result<Vec<CommitSummary>> {
        match self {
            GitAdapter::Cli(b) => b.log_commits(branch, limit).await,
            GitAdapter::Native(b) => b.log_commits(branch, limit).await,
        }
    }
}
