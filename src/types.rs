//! Core types for upmerge

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Characters that are unsafe in directory names on at least one platform.
const UNSAFE_NAME_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Suffix appended to the derived isolated working directory name.
const WORKTREE_DIR_SUFFIX: &str = "worktree";

/// A logical branch, collapsed across local and remote-tracking refs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// Branch name, with any remote-alias prefix stripped
    pub name: String,
    /// Timestamp of the most recent commit observed under any ref with this name
    pub last_commit_at: DateTime<Utc>,
}

impl Branch {
    /// Unix seconds of the most recent commit.
    #[must_use]
    pub const fn last_commit_unix(&self) -> i64 {
        self.last_commit_at.timestamp()
    }
}

/// Which execution strategy carries out the merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StrategyKind {
    /// Merge inside a disposable secondary checkout, leaving the primary
    /// working tree untouched
    Worktree,
    /// Merge in place by checking out the target branch
    Checkout,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Worktree => write!(f, "worktree"),
            Self::Checkout => write!(f, "checkout"),
        }
    }
}

/// Repository merge-progress state, derived fresh from the tool each poll.
///
/// Never cached: this is a pure function of on-disk repository state at
/// sample time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictState {
    /// No merge in progress (never started, aborted, or already committed)
    NotMerging,
    /// Merge in progress with unresolved conflict paths
    MergingUnresolved,
    /// Merge in progress, conflicts resolved and staged but not committed
    MergingStaged,
    /// Merge in progress with nothing left to stage
    MergingClean,
}

/// One merge attempt: who merges into what, where, and how.
///
/// Exists only for the duration of a single invocation.
#[derive(Debug, Clone)]
pub struct MergeSession {
    /// Branch being merged (the branch the user started on)
    pub current_branch: String,
    /// Branch receiving the merge
    pub target_branch: String,
    /// Execution strategy
    pub strategy: StrategyKind,
    /// Absolute path of the repository root
    pub repo_root: PathBuf,
    /// Directory the merge runs in: `repo_root` for checkout, a derived
    /// sibling directory for worktree
    pub work_dir: PathBuf,
}

impl MergeSession {
    /// Build a session, deriving `work_dir` from the strategy.
    #[must_use]
    pub fn new(
        current_branch: impl Into<String>,
        target_branch: impl Into<String>,
        strategy: StrategyKind,
        repo_root: impl Into<PathBuf>,
    ) -> Self {
        let target_branch = target_branch.into();
        let repo_root = repo_root.into();
        let work_dir = match strategy {
            StrategyKind::Checkout => repo_root.clone(),
            StrategyKind::Worktree => worktree_dir(&repo_root, &target_branch),
        };
        Self {
            current_branch: current_branch.into(),
            target_branch,
            strategy,
            repo_root,
            work_dir,
        }
    }
}

/// Replace filesystem-unsafe characters in a branch name with `-`.
///
/// Idempotent, so already-sanitized names pass through unchanged.
#[must_use]
pub fn sanitize_branch_name(name: &str) -> String {
    name.chars()
        .map(|c| if UNSAFE_NAME_CHARS.contains(&c) { '-' } else { c })
        .collect()
}

/// Derive the isolated working directory path as a sibling of the repo root:
/// `<parent>/<root-name>-<sanitized-target>-worktree`.
fn worktree_dir(repo_root: &Path, target_branch: &str) -> PathBuf {
    let root_name = repo_root
        .file_name()
        .map_or_else(|| "repo".to_string(), |n| n.to_string_lossy().into_owned());
    let dir_name = format!(
        "{root_name}-{}-{WORKTREE_DIR_SUFFIX}",
        sanitize_branch_name(target_branch)
    );
    repo_root.parent().unwrap_or(repo_root).join(dir_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_all_unsafe_chars() {
        let out = sanitize_branch_name(r#"a/b\c:d*e?f"g<h>i|j"#);
        assert_eq!(out, "a-b-c-d-e-f-g-h-i-j");
        assert!(!out.contains(|c| UNSAFE_NAME_CHARS.contains(&c)));
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = sanitize_branch_name("feature/login?v2");
        assert_eq!(sanitize_branch_name(&once), once);
    }

    #[test]
    fn test_sanitize_leaves_safe_names_alone() {
        assert_eq!(sanitize_branch_name("main"), "main");
        assert_eq!(sanitize_branch_name("release-1.2"), "release-1.2");
    }

    #[test]
    fn test_worktree_session_derives_sibling_dir() {
        let session =
            MergeSession::new("feature/x", "main", StrategyKind::Worktree, "/r/proj");
        assert_eq!(session.work_dir, PathBuf::from("/r/proj-main-worktree"));
    }

    #[test]
    fn test_worktree_dir_sanitizes_target() {
        let session =
            MergeSession::new("dev", "feature/x", StrategyKind::Worktree, "/r/proj");
        assert_eq!(session.work_dir, PathBuf::from("/r/proj-feature-x-worktree"));
    }

    #[test]
    fn test_checkout_session_uses_repo_root() {
        let session =
            MergeSession::new("feature/x", "main", StrategyKind::Checkout, "/r/proj");
        assert_eq!(session.work_dir, PathBuf::from("/r/proj"));
    }
}
