//! Branch inventory
//!
//! One-shot enumeration of local and remote-tracking branches, collapsed to
//! logical branch names and ranked by most recent commit. Built fresh per
//! invocation; any failure here is fatal and aborts before anything mutates.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::DateTime;

use crate::error::{Error, Result};
use crate::git::GitRunner;
use crate::types::Branch;

const LOCAL_REF_PREFIX: &str = "refs/heads/";
const REMOTE_REF_PREFIX: &str = "refs/remotes/";

/// List all branches, newest commit first.
///
/// Local and remote-tracking refs sharing a logical name collapse into one
/// entry carrying the larger timestamp. The symbolic `HEAD` pseudo-ref is
/// excluded unconditionally.
pub fn list_branches(git: &GitRunner) -> Result<Vec<Branch>> {
    let out = git.run(&[
        "for-each-ref",
        "--format=%(refname)%09%(committerdate:unix)",
        LOCAL_REF_PREFIX,
        REMOTE_REF_PREFIX,
    ]);
    if !out.success {
        return Err(Error::Inventory(
            out.error_message
                .unwrap_or_else(|| "failed to enumerate refs".to_string()),
        ));
    }
    Ok(parse_ref_listing(&out.output))
}

/// Name of the branch currently checked out.
pub fn current_branch(git: &GitRunner) -> Result<String> {
    query(git, &["rev-parse", "--abbrev-ref", "HEAD"])
}

/// Absolute path of the repository root (primary working tree).
pub fn repo_root(git: &GitRunner) -> Result<PathBuf> {
    query(git, &["rev-parse", "--show-toplevel"]).map(PathBuf::from)
}

/// Absolute path of the repository metadata directory.
///
/// Inside a secondary worktree this resolves to that worktree's own
/// metadata directory, which is where its merge marker lives.
pub fn git_dir(git: &GitRunner) -> Result<PathBuf> {
    query(git, &["rev-parse", "--absolute-git-dir"]).map(PathBuf::from)
}

fn query(git: &GitRunner, args: &[&str]) -> Result<String> {
    let out = git.run(args);
    if out.success {
        Ok(out.trimmed())
    } else {
        Err(Error::Inventory(out.error_message.unwrap_or_else(|| {
            format!("git {} failed", args.join(" "))
        })))
    }
}

/// Parse `for-each-ref` output into deduplicated, ranked branches.
///
/// Expects one `<refname>\t<unix-seconds>` pair per line. Malformed lines
/// are ignored rather than failing the whole inventory.
#[must_use]
pub fn parse_ref_listing(raw: &str) -> Vec<Branch> {
    let mut by_name: HashMap<String, Branch> = HashMap::new();

    for line in raw.lines() {
        let Some((refname, timestamp)) = line.split_once('\t') else {
            continue;
        };
        let Some(name) = logical_name(refname) else {
            continue;
        };
        let Some(last_commit_at) = timestamp
            .trim()
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
        else {
            continue;
        };

        by_name
            .entry(name.to_string())
            .and_modify(|existing| {
                if last_commit_at > existing.last_commit_at {
                    existing.last_commit_at = last_commit_at;
                }
            })
            .or_insert_with(|| Branch {
                name: name.to_string(),
                last_commit_at,
            });
    }

    let mut branches: Vec<Branch> = by_name.into_values().collect();
    branches.sort_by(|a, b| b.last_commit_at.cmp(&a.last_commit_at));
    branches
}

/// Strip the ref namespace (and, for remote-tracking refs, the remote
/// alias) to get the logical branch name. Returns `None` for refs that
/// should not appear in the inventory.
fn logical_name(refname: &str) -> Option<&str> {
    let name = if let Some(rest) = refname.strip_prefix(LOCAL_REF_PREFIX) {
        rest
    } else if let Some(rest) = refname.strip_prefix(REMOTE_REF_PREFIX) {
        // "origin/feature/x" -> "feature/x"
        rest.split_once('/').map_or(rest, |(_, branch)| branch)
    } else {
        return None;
    };

    if name.is_empty() || name == "HEAD" {
        None
    } else {
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(branches: &[Branch]) -> Vec<&str> {
        branches.iter().map(|b| b.name.as_str()).collect()
    }

    #[test]
    fn test_parse_sorts_by_timestamp_descending() {
        let raw = "refs/heads/old\t100\nrefs/heads/new\t300\nrefs/heads/mid\t200\n";
        let branches = parse_ref_listing(raw);
        assert_eq!(names(&branches), vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_parse_collapses_local_and_remote_keeping_max_timestamp() {
        let raw = "refs/heads/feature/x\t100\nrefs/remotes/origin/feature/x\t250\n";
        let branches = parse_ref_listing(raw);
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].name, "feature/x");
        assert_eq!(branches[0].last_commit_unix(), 250);
    }

    #[test]
    fn test_parse_local_wins_when_newer() {
        let raw = "refs/remotes/origin/dev\t100\nrefs/heads/dev\t400\n";
        let branches = parse_ref_listing(raw);
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].last_commit_unix(), 400);
    }

    #[test]
    fn test_parse_excludes_head_pseudo_ref() {
        let raw = "refs/remotes/origin/HEAD\t500\nrefs/heads/main\t100\n";
        let branches = parse_ref_listing(raw);
        assert_eq!(names(&branches), vec!["main"]);
    }

    #[test]
    fn test_parse_strips_only_the_remote_alias_segment() {
        let raw = "refs/remotes/upstream/release/2024/q3\t100\n";
        let branches = parse_ref_listing(raw);
        assert_eq!(names(&branches), vec!["release/2024/q3"]);
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let raw = "garbage\nrefs/heads/ok\t100\nrefs/heads/bad\tnot-a-number\n";
        let branches = parse_ref_listing(raw);
        assert_eq!(names(&branches), vec!["ok"]);
    }
}
