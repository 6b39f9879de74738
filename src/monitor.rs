//! Conflict resolution monitor
//!
//! After a merge command reports failure, this monitor decides whether the
//! failure is a genuine content conflict and, if so, polls repository state
//! until a human resolves it, aborts it, or a hard ceiling elapses. The
//! wait is a cooperative suspend point: nothing else proceeds, and the only
//! exits are external repository mutation or the timeout.

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};
use crate::git::GitRunner;
use crate::inventory;
use crate::progress::ProgressCallback;
use crate::types::ConflictState;

/// Seconds between repository-state samples.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Emit a progress line every this many ticks (~20s at the default interval).
pub const PROGRESS_EVERY_TICKS: u32 = 10;

/// Hard ceiling on the total wait before giving up.
pub const WAIT_CEILING: Duration = Duration::from_secs(3600);

/// Two-letter porcelain status codes that mark a path as unmerged.
const CONFLICT_CODES: [&str; 7] = ["DD", "AU", "UD", "UA", "DU", "AA", "UU"];

/// Timing knobs for the poll loop.
///
/// Defaults mirror the module constants; tests inject faster values.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Time between samples
    pub poll_interval: Duration,
    /// Progress-line cadence, in ticks
    pub progress_every_ticks: u32,
    /// Total wait ceiling
    pub wait_ceiling: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            progress_every_ticks: PROGRESS_EVERY_TICKS,
            wait_ceiling: WAIT_CEILING,
        }
    }
}

/// How the wait ended (short of a timeout, which is an error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// Conflicts were cleared but the merge commit is still pending; the
    /// caller must finalize with a commit.
    ResolvedPending,
    /// The merge marker disappeared after having been observed: the user
    /// completed the merge themselves.
    ResolvedCommitted,
    /// The marker was absent on the very first sample. Treated as an abort;
    /// a merge resolved within the first poll interval is indistinguishable
    /// from one that never started (see DESIGN.md).
    Aborted,
}

/// Samples the repository's merge-progress state.
///
/// The production implementation queries git; tests script a sequence.
pub trait MergeStateProbe: Send + Sync {
    /// Derive the current [`ConflictState`]. Never cached.
    fn sample(&self) -> Result<ConflictState>;
}

/// Probe backed by real repository queries.
#[derive(Debug)]
pub struct RepoStateProbe {
    git: GitRunner,
    merge_head: PathBuf,
}

impl RepoStateProbe {
    /// Bind a probe to the working tree at `work_dir`.
    ///
    /// Resolves the metadata directory once; inside a secondary worktree
    /// the merge marker lives in that worktree's own metadata directory.
    pub fn new(work_dir: impl Into<PathBuf>) -> Result<Self> {
        let git = GitRunner::new(work_dir);
        let merge_head = inventory::git_dir(&git)?.join("MERGE_HEAD");
        Ok(Self { git, merge_head })
    }
}

impl MergeStateProbe for RepoStateProbe {
    fn sample(&self) -> Result<ConflictState> {
        if !self.merge_head.exists() {
            return Ok(ConflictState::NotMerging);
        }
        let status = self.git.run(&["status", "--porcelain"]).into_result("status")?;
        let staged = self
            .git
            .run(&["diff", "--cached", "--name-only"])
            .into_result("diff")?;
        Ok(classify(true, &status, &staged))
    }
}

/// Derive a [`ConflictState`] from three repository facts.
///
/// Pure so the state machine's decision table is testable without a
/// repository: marker presence, `status --porcelain` text, and the staged
/// file-name listing.
#[must_use]
pub fn classify(marker_present: bool, status_porcelain: &str, staged_names: &str) -> ConflictState {
    if !marker_present {
        return ConflictState::NotMerging;
    }
    if has_conflict_codes(status_porcelain) {
        return ConflictState::MergingUnresolved;
    }
    if staged_names.trim().is_empty() {
        ConflictState::MergingClean
    } else {
        ConflictState::MergingStaged
    }
}

fn has_conflict_codes(status_porcelain: &str) -> bool {
    status_porcelain.lines().any(|line| {
        let code = line.get(..2).unwrap_or("");
        CONFLICT_CODES.contains(&code)
    })
}

/// Poll until the merge is resolved, aborted, or the ceiling elapses.
///
/// Samples immediately, then every `config.poll_interval`, narrating every
/// `config.progress_every_ticks` ticks. Exceeding `config.wait_ceiling`
/// fails with [`Error::ConflictTimeout`].
pub async fn await_resolution(
    probe: &dyn MergeStateProbe,
    config: &MonitorConfig,
    progress: &dyn ProgressCallback,
) -> Result<MonitorOutcome> {
    let mut ticks: u32 = 0;
    let mut waited = Duration::ZERO;
    let mut observed_merging = false;

    progress
        .on_wait_started(
            "Waiting for conflicts to be resolved (resolve and stage them, or abort the merge, in another terminal)",
        )
        .await;

    loop {
        ticks += 1;
        let state = probe.sample()?;
        debug!(?state, ticks, "conflict monitor sample");

        match state {
            ConflictState::MergingUnresolved => {
                observed_merging = true;
            }
            ConflictState::MergingStaged | ConflictState::MergingClean => {
                progress
                    .on_wait_finished("Conflicts resolved; completing the merge")
                    .await;
                return Ok(MonitorOutcome::ResolvedPending);
            }
            ConflictState::NotMerging => {
                if observed_merging {
                    progress.on_wait_finished("Merge completed externally").await;
                    return Ok(MonitorOutcome::ResolvedCommitted);
                }
                progress.on_wait_finished("No merge in progress").await;
                return Ok(MonitorOutcome::Aborted);
            }
        }

        if waited >= config.wait_ceiling {
            progress
                .on_wait_finished("Gave up waiting for conflict resolution")
                .await;
            return Err(Error::ConflictTimeout {
                waited_secs: waited.as_secs(),
            });
        }

        tokio::time::sleep(config.poll_interval).await;
        waited += config.poll_interval;

        if ticks % config.progress_every_ticks == 0 {
            let minutes = waited.as_secs_f64() / 60.0;
            progress
                .on_wait_tick(&format!(
                    "Still waiting for conflict resolution ({minutes:.1}m elapsed)"
                ))
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_no_marker_is_not_merging() {
        assert_eq!(classify(false, "UU a.txt\n", ""), ConflictState::NotMerging);
    }

    #[test]
    fn test_classify_conflict_codes_are_unresolved() {
        for code in CONFLICT_CODES {
            let status = format!("{code} path.txt\n");
            assert_eq!(
                classify(true, &status, "other.txt\n"),
                ConflictState::MergingUnresolved,
                "code {code} should read as unresolved"
            );
        }
    }

    #[test]
    fn test_classify_ignores_non_conflict_status_lines() {
        // Modified, untracked, and renamed entries are not conflicts.
        let status = " M a.txt\n?? b.txt\nR  c.txt -> d.txt\n";
        assert_eq!(
            classify(true, status, "a.txt\n"),
            ConflictState::MergingStaged
        );
    }

    #[test]
    fn test_classify_staged_diff_present_is_staged() {
        assert_eq!(
            classify(true, "M  a.txt\n", "a.txt\n"),
            ConflictState::MergingStaged
        );
    }

    #[test]
    fn test_classify_clean_tree_has_nothing_to_stage() {
        assert_eq!(classify(true, "", ""), ConflictState::MergingClean);
    }

    #[test]
    fn test_classify_conflicts_win_over_staged_listing() {
        // Auto-merged paths are staged while conflicts remain unresolved.
        assert_eq!(
            classify(true, "UU a.txt\nM  b.txt\n", "b.txt\n"),
            ConflictState::MergingUnresolved
        );
    }
}
