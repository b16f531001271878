//! End-to-end tests for the libgit2 backend and the synchronizer, against
//! throwaway repositories built with git2 (no network, no user config).

use std::path::Path;

use tempfile::TempDir;

use git_syncd::context::AppContext;
use git_syncd::git::sync;
use git_syncd::git::BackendKind;
use git_syncd::models::FileStatus;

/// Creates a repository with one commit containing README.md.
fn scratch_repo() -> (TempDir, String) {
    let dir = TempDir::new().unwrap();
    let repo = git2::Repository::init(dir.path()).unwrap();
    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Test User").unwrap();
    config.set_str("user.email", "test@example.com").unwrap();

    std::fs::write(dir.path().join("README.md"), "hello\n").unwrap();
    commit_all(&repo, "initial");

    let identity = dir.path().to_string_lossy().into_owned();
    (dir, identity)
}

fn commit_all(repo: &git2::Repository, message: &str) -> git2::Oid {
    let sig = git2::Signature::now("Test User", "test@example.com").unwrap();
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

#[tokio::test]
async fn status_classifies_worktree_and_index_changes() {
    let (dir, identity) = scratch_repo();

    // one modified, one untracked, one staged
    std::fs::write(dir.path().join("README.md"), "changed\n").unwrap();
    std::fs::write(dir.path().join("scratch.txt"), "tmp\n").unwrap();
    std::fs::write(dir.path().join("staged.txt"), "staged\n").unwrap();
    let repo = git2::Repository::open(dir.path()).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new("staged.txt")).unwrap();
    index.write().unwrap();

    let adapter = BackendKind::Native.open(&identity).await.unwrap();
    let status = adapter.status().await.unwrap();

    let by_path = |p: &str| status.entries.iter().find(|e| e.path == p).unwrap().clone();
    let readme = by_path("README.md");
    assert_eq!((readme.index, readme.worktree), (' ', 'M'));
    let scratch = by_path("scratch.txt");
    assert_eq!((scratch.index, scratch.worktree), ('?', '?'));
    let staged = by_path("staged.txt");
    assert_eq!((staged.index, staged.worktree), ('A', ' '));

    // the checked-out branch is the one and only local branch
    let branches = adapter.branch_local().await.unwrap();
    assert_eq!(branches, vec![status.current_branch]);
}

#[tokio::test]
async fn clean_repo_has_empty_status_and_stashes() {
    let (_dir, identity) = scratch_repo();
    let adapter = BackendKind::Native.open(&identity).await.unwrap();

    assert!(adapter.status().await.unwrap().entries.is_empty());
    assert!(adapter.stash_list().await.unwrap().is_empty());
    assert_eq!(adapter.origin_url().await.unwrap(), None);
}

#[tokio::test]
async fn missing_upstream_means_zero_divergence() {
    let (_dir, identity) = scratch_repo();
    let adapter = BackendKind::Native.open(&identity).await.unwrap();

    let branch = &adapter.branch_local().await.unwrap()[0];
    let upstream = format!("origin/{}", branch);
    assert_eq!(adapter.ahead_behind(branch, &upstream).await.unwrap(), (0, 0));
}

#[tokio::test]
async fn log_commits_returns_newest_first() {
    let (dir, identity) = scratch_repo();
    let repo = git2::Repository::open(dir.path()).unwrap();
    std::fs::write(dir.path().join("lib.rs"), "fn main() {}\n").unwrap();
    commit_all(&repo, "second");

    let adapter = BackendKind::Native.open(&identity).await.unwrap();
    let branch = adapter.branch_local().await.unwrap()[0].clone();
    let commits = adapter.log_commits(&branch, 10).await.unwrap();

    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].message, "second");
    assert_eq!(commits[1].message, "initial");
    assert_eq!(commits[0].author, "Test User");
}

#[tokio::test]
async fn opening_a_non_repository_fails() {
    let dir = TempDir::new().unwrap();
    let identity = dir.path().to_string_lossy().into_owned();
    assert!(BackendKind::Native.open(&identity).await.is_err());
}

#[tokio::test]
async fn refresh_computes_then_serves_from_cache() {
    let (dir, identity) = scratch_repo();
    std::fs::write(dir.path().join("extra.txt"), "x\n").unwrap();

    let data_dir = TempDir::new().unwrap();
    let ctx = AppContext::new(data_dir.path().to_path_buf(), BackendKind::Native).unwrap();
    let adapter = ctx.backend.open(&identity).await.unwrap();

    let first = sync::refresh(&ctx, &adapter, &identity, false).await.unwrap();
    assert!(!first.from_cache);
    assert_eq!(first.snapshot.modified_count, 1);
    assert_eq!(first.snapshot.unstaged.len(), 1);
    assert_eq!(first.snapshot.unstaged[0].status, FileStatus::Created);
    assert!(first.snapshot.staged.is_empty());
    assert!(first.snapshot.divergence.is_empty());
    assert!(first.snapshot.stashes.is_empty());

    // second read is served from the cache even though the tree changed
    std::fs::write(dir.path().join("another.txt"), "y\n").unwrap();
    let second = sync::refresh(&ctx, &adapter, &identity, false).await.unwrap();
    assert!(second.from_cache);
    assert_eq!(second.snapshot, first.snapshot);

    // a forced refresh bypasses the cache and sees the new file
    let third = sync::refresh(&ctx, &adapter, &identity, true).await.unwrap();
    assert!(!third.from_cache);
    assert_eq!(third.snapshot.modified_count, 2);
}

#[tokio::test]
async fn refresh_carries_branch_commit_cache_forward() {
    let (_dir, identity) = scratch_repo();

    let data_dir = TempDir::new().unwrap();
    let ctx = AppContext::new(data_dir.path().to_path_buf(), BackendKind::Native).unwrap();
    let adapter = ctx.backend.open(&identity).await.unwrap();

    sync::refresh(&ctx, &adapter, &identity, false).await.unwrap();

    let branch = adapter.branch_local().await.unwrap()[0].clone();
    let commits = adapter.log_commits(&branch, 10).await.unwrap();
    ctx.cache
        .merge_branch_commits(&identity, &branch, commits.clone())
        .unwrap();

    let refreshed = sync::refresh(&ctx, &adapter, &identity, true).await.unwrap();
    assert_eq!(refreshed.snapshot.branch_commits.get(&branch), Some(&commits));
}
