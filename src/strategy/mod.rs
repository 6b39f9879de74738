//! Merge execution strategies
//!
//! Two interchangeable ways to carry out the same merge: an isolated
//! secondary worktree, or an in-place checkout of the target branch. The
//! orchestrator depends only on the [`MergeStrategy`] capability, never on
//! a concrete variant.

mod checkout;
mod worktree;

pub use checkout::CheckoutStrategy;
pub use worktree::WorktreeStrategy;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::git::GitRunner;
use crate::monitor::{await_resolution, MonitorConfig, MonitorOutcome, RepoStateProbe};
use crate::progress::ProgressCallback;
use crate::types::{MergeSession, StrategyKind};

/// A way to execute one merge session end to end.
#[async_trait]
pub trait MergeStrategy: Send + Sync {
    /// Run the merge described by `session`. Fatal errors abort the
    /// invocation; recovery guidance is narrated through `progress` before
    /// returning.
    async fn execute(&self, session: &MergeSession, progress: &dyn ProgressCallback)
        -> Result<()>;
}

/// Construct the strategy variant for `kind`.
#[must_use]
pub fn create_strategy(kind: StrategyKind, monitor: MonitorConfig) -> Box<dyn MergeStrategy> {
    match kind {
        StrategyKind::Worktree => Box::new(WorktreeStrategy::new(monitor)),
        StrategyKind::Checkout => Box::new(CheckoutStrategy::new(monitor)),
    }
}

/// Shared merge shell: pull target updates, merge the current branch, and
/// on a conflicted merge hand over to the conflict monitor.
///
/// `git` must already be bound to the directory where the target branch is
/// checked out. Returns once the merge commit exists (directly, after a
/// monitored resolution plus commit, or committed externally by the user).
pub(crate) async fn pull_and_merge(
    git: &GitRunner,
    session: &MergeSession,
    monitor: &MonitorConfig,
    progress: &dyn ProgressCallback,
) -> Result<()> {
    progress
        .on_message(&format!("Pulling latest {}", session.target_branch))
        .await;
    git.run_streamed(&["pull"]).into_result("pull")?;

    progress
        .on_message(&format!(
            "Merging {} into {}",
            session.current_branch, session.target_branch
        ))
        .await;
    let merge = git.run_streamed(&["merge", "--no-edit", &session.current_branch]);
    if merge.success {
        return Ok(());
    }

    let probe = RepoStateProbe::new(git.work_dir())?;
    match await_resolution(&probe, monitor, progress).await? {
        MonitorOutcome::ResolvedPending => {
            // Reuses the merge message the tool already prepared.
            git.run(&["commit", "--no-edit"]).into_result("commit")?;
            Ok(())
        }
        MonitorOutcome::ResolvedCommitted => Ok(()),
        MonitorOutcome::Aborted => Err(Error::MergeAborted(format!(
            "merge of {} into {} was aborted or never started",
            session.current_branch, session.target_branch
        ))),
    }
}
