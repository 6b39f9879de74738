//! Worktree strategy: merge inside a disposable secondary checkout.
//!
//! The primary working tree is never touched. A sibling directory is bound
//! to the target branch, the merge happens there, and the directory is torn
//! down on every exit path except an unresolved conflict, where it is
//! deliberately preserved so the user can finish by hand.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::git::GitRunner;
use crate::monitor::MonitorConfig;
use crate::progress::ProgressCallback;
use crate::strategy::{pull_and_merge, MergeStrategy};
use crate::types::MergeSession;

/// Dependency cache directory linked into the worktree so tooling there
/// does not re-fetch everything.
const DEP_CACHE_DIR: &str = "node_modules";

/// Merges inside an isolated worktree.
#[derive(Debug, Clone)]
pub struct WorktreeStrategy {
    monitor: MonitorConfig,
}

impl WorktreeStrategy {
    /// Create the strategy with the given monitor timing.
    #[must_use]
    pub const fn new(monitor: MonitorConfig) -> Self {
        Self { monitor }
    }

    async fn merge_in_worktree(
        &self,
        session: &MergeSession,
        progress: &dyn ProgressCallback,
    ) -> Result<()> {
        let git = GitRunner::new(&session.work_dir);
        pull_and_merge(&git, session, &self.monitor, progress).await?;

        progress
            .on_message(&format!("Pushing {}", session.target_branch))
            .await;
        let push = git.run_streamed(&["push"]);
        if !push.success {
            // The merge commit already exists on the local target branch and
            // survives worktree removal.
            progress
                .on_warning(&format!(
                    "Push failed; the merge commit exists locally on {}",
                    session.target_branch
                ))
                .await;
            progress
                .on_message(&format!(
                    "Push it manually with: git checkout {} && git push",
                    session.target_branch
                ))
                .await;
        }
        push.into_result("push")?;
        Ok(())
    }
}

#[async_trait]
impl MergeStrategy for WorktreeStrategy {
    async fn execute(
        &self,
        session: &MergeSession,
        progress: &dyn ProgressCallback,
    ) -> Result<()> {
        let repo_git = GitRunner::new(&session.repo_root);
        let dir = session.work_dir.to_string_lossy().into_owned();

        progress
            .on_message(&format!(
                "Creating worktree for {} at {dir}",
                session.target_branch
            ))
            .await;
        repo_git
            .run(&["worktree", "add", &dir, &session.target_branch])
            .into_result("worktree add")?;

        let cache_link = link_dependency_cache(session, progress).await;

        let result = self.merge_in_worktree(session, progress).await;

        // Finalization runs on every exit path. The one exception is an
        // unresolved conflict wait: the worktree is kept so the user can
        // resume where the merge stopped.
        match &result {
            Err(e) if e.preserves_merge_state() => {
                progress
                    .on_warning(&format!("Worktree preserved at {dir}"))
                    .await;
                progress.on_message("Finish the merge manually:").await;
                progress.on_message(&format!("  cd {dir}")).await;
                progress
                    .on_message("  git commit --no-edit && git push")
                    .await;
                progress
                    .on_message(&format!(
                        "  cd {} && git worktree remove --force {dir}",
                        session.repo_root.display()
                    ))
                    .await;
            }
            _ => remove_worktree(&repo_git, session, cache_link, progress).await,
        }

        result
    }
}

/// Symlink the repository root's dependency cache into the worktree.
///
/// Non-fatal: a conflicting entry or a failed link only produces a warning.
async fn link_dependency_cache(
    session: &MergeSession,
    progress: &dyn ProgressCallback,
) -> Option<PathBuf> {
    let source = session.repo_root.join(DEP_CACHE_DIR);
    if !source.is_dir() {
        return None;
    }

    let link = session.work_dir.join(DEP_CACHE_DIR);
    if link.symlink_metadata().is_ok() {
        progress
            .on_warning(&format!(
                "{DEP_CACHE_DIR} already exists in the worktree; leaving it alone"
            ))
            .await;
        return None;
    }

    match make_symlink(&source, &link) {
        Ok(()) => {
            progress
                .on_message(&format!("Linked {DEP_CACHE_DIR} from the repository root"))
                .await;
            Some(link)
        }
        Err(e) => {
            progress
                .on_warning(&format!("Could not link {DEP_CACHE_DIR}: {e}"))
                .await;
            None
        }
    }
}

/// Tear down the worktree: drop the cache symlink, then force-remove the
/// directory. Failures are warnings naming the leftover path, never errors.
async fn remove_worktree(
    repo_git: &GitRunner,
    session: &MergeSession,
    cache_link: Option<PathBuf>,
    progress: &dyn ProgressCallback,
) {
    if let Some(link) = cache_link {
        if let Err(e) = fs::remove_file(&link) {
            warn!(link = %link.display(), "failed to remove cache symlink: {e}");
            progress
                .on_warning(&format!("Could not remove {}: {e}", link.display()))
                .await;
        }
    }

    let dir = session.work_dir.to_string_lossy().into_owned();
    let out = repo_git.run(&["worktree", "remove", "--force", &dir]);
    if out.success {
        progress.on_message(&format!("Removed worktree {dir}")).await;
    } else {
        let message = out
            .error_message
            .unwrap_or_else(|| "unknown error".to_string());
        warn!(dir = %dir, "failed to remove worktree: {message}");
        progress
            .on_warning(&format!(
                "Could not remove the worktree ({message}); delete it by hand: git worktree remove --force {dir}"
            ))
            .await;
    }
}

#[cfg(unix)]
fn make_symlink(source: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, link)
}

#[cfg(windows)]
fn make_symlink(source: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(source, link)
}
