//! Checkout strategy: merge in place on the primary working tree.
//!
//! Checks out the target branch, merges, pushes, and switches back. When a
//! conflict wait ends without a resolution the tree is left exactly where
//! it stands, since the user needs it in place to finish resolving.

use async_trait::async_trait;

use crate::error::Result;
use crate::git::GitRunner;
use crate::monitor::MonitorConfig;
use crate::progress::ProgressCallback;
use crate::strategy::{pull_and_merge, MergeStrategy};
use crate::types::MergeSession;

/// Merges by checking out the target branch in place.
#[derive(Debug, Clone)]
pub struct CheckoutStrategy {
    monitor: MonitorConfig,
}

impl CheckoutStrategy {
    /// Create the strategy with the given monitor timing.
    #[must_use]
    pub const fn new(monitor: MonitorConfig) -> Self {
        Self { monitor }
    }

    async fn merge_in_place(
        &self,
        git: &GitRunner,
        session: &MergeSession,
        progress: &dyn ProgressCallback,
    ) -> Result<()> {
        progress
            .on_message(&format!("Checking out {}", session.target_branch))
            .await;
        git.run(&["checkout", &session.target_branch])
            .into_result("checkout")?;

        pull_and_merge(git, session, &self.monitor, progress).await?;

        progress
            .on_message(&format!("Pushing {}", session.target_branch))
            .await;
        let push = git.run_streamed(&["push"]);
        if !push.success {
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

        // The merge itself succeeded; failing to switch back is only a warning.
        let back = git.run(&["checkout", &session.current_branch]);
        if back.success {
            progress
                .on_message(&format!("Switched back to {}", session.current_branch))
                .await;
        } else {
            progress
                .on_warning(&format!(
                    "Merge pushed, but could not switch back to {}: {}",
                    session.current_branch,
                    back.error_message.unwrap_or_else(|| "unknown error".to_string())
                ))
                .await;
        }

        Ok(())
    }
}

#[async_trait]
impl MergeStrategy for CheckoutStrategy {
    async fn execute(
        &self,
        session: &MergeSession,
        progress: &dyn ProgressCallback,
    ) -> Result<()> {
        let git = GitRunner::new(&session.work_dir);
        let result = self.merge_in_place(&git, session, progress).await;

        if let Err(e) = &result {
            if e.preserves_merge_state() {
                // Leave the tree mid-merge; the user needs it in place.
                progress
                    .on_warning(&format!(
                        "The working tree is left on {} with the merge unfinished",
                        session.target_branch
                    ))
                    .await;
                progress
                    .on_message("Finish manually: resolve the conflicts, then run:")
                    .await;
                progress.on_message("  git commit --no-edit && git push").await;
                progress
                    .on_message(&format!("  git checkout {}", session.current_branch))
                    .await;
            } else {
                // Best-effort return to the original branch so the user is
                // not stranded on the target.
                let _ = git.run(&["checkout", &session.current_branch]);
            }
        }

        result
    }
}
