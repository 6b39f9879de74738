//! Shared test fixtures: a real temporary git repository with a bare origin.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

/// A scratch git repository cloned against a local bare `origin`.
///
/// The repository lives in `<temp>/proj` so derived worktree directories
/// land inside the same temp dir and are cleaned up with it.
pub struct TempGitRepo {
    temp: TempDir,
    root: PathBuf,
}

impl TempGitRepo {
    /// Create a repository on branch `main` with one pushed commit.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let origin = temp.path().join("origin.git");
        let root = temp.path().join("proj");

        run_git(temp.path(), &["init", "--bare", "origin.git"]);
        run_git(temp.path(), &["init", "-b", "main", "proj"]);

        let repo = Self { temp, root };
        repo.git(&["config", "user.name", "Test User"]);
        repo.git(&["config", "user.email", "test@example.com"]);
        repo.git(&["config", "commit.gpgsign", "false"]);
        repo.git(&["config", "pull.rebase", "false"]);
        repo.git(&["remote", "add", "origin", origin.to_str().expect("utf8 path")]);

        repo.write_file("README.md", "# proj\n");
        repo.git(&["add", "."]);
        repo.git(&["commit", "-m", "initial commit"]);
        repo.git(&["push", "-u", "origin", "main"]);
        repo
    }

    /// Path of the primary working tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Parent directory (where derived worktree dirs are created).
    pub fn parent(&self) -> &Path {
        self.temp.path()
    }

    /// Run git in the repository, panicking on failure.
    pub fn git(&self, args: &[&str]) -> String {
        run_git(&self.root, args)
    }

    /// Run git in the repository with extra environment variables set.
    pub fn git_with_env(&self, args: &[&str], envs: &[(&str, &str)]) -> String {
        run_git_with_env(&self.root, args, envs)
    }

    /// Write (or overwrite) a file relative to the repository root.
    pub fn write_file(&self, rel: &str, content: &str) {
        std::fs::write(self.root.join(rel), content).expect("write file");
    }

    /// Commit `rel` with `content` on the current branch.
    pub fn commit_file(&self, rel: &str, content: &str, message: &str) {
        self.write_file(rel, content);
        self.git(&["add", "."]);
        self.git(&["commit", "-m", message]);
    }

    /// Commit with a fixed committer date, for deterministic ranking.
    pub fn commit_file_at(&self, rel: &str, content: &str, message: &str, unix_secs: i64) {
        self.write_file(rel, content);
        self.git(&["add", "."]);
        let date = format!("{unix_secs} +0000");
        self.git_with_env(
            &["commit", "-m", message],
            &[("GIT_COMMITTER_DATE", &date), ("GIT_AUTHOR_DATE", &date)],
        );
    }

    /// Create a branch off the current one, commit a file, and push it
    /// with an upstream.
    pub fn create_branch(&self, name: &str, rel: &str, content: &str) {
        self.git(&["checkout", "-b", name]);
        self.commit_file(rel, content, &format!("commit on {name}"));
        self.git(&["push", "-u", "origin", name]);
    }

    /// Check out an existing branch.
    pub fn checkout(&self, name: &str) {
        self.git(&["checkout", name]);
    }

    /// Resolved commit id for a rev (branch, remote-tracking ref, etc).
    pub fn rev(&self, rev: &str) -> String {
        self.git(&["rev-parse", rev]).trim().to_string()
    }

    /// Name of the branch currently checked out.
    pub fn head_branch(&self) -> String {
        self.git(&["rev-parse", "--abbrev-ref", "HEAD"])
            .trim()
            .to_string()
    }
}

/// Run git in `dir`, panicking with full diagnostics on failure.
pub fn run_git(dir: &Path, args: &[&str]) -> String {
    run_git_with_env(dir, args, &[])
}

fn run_git_with_env(dir: &Path, args: &[&str], envs: &[(&str, &str)]) -> String {
    let mut cmd = Command::new("git");
    cmd.args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0");
    for (k, v) in envs {
        cmd.env(k, v);
    }
    let out = cmd.output().expect("spawn git");
    assert!(
        out.status.success(),
        "git {} failed in {}:\nstdout: {}\nstderr: {}",
        args.join(" "),
        dir.display(),
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr),
    );
    String::from_utf8_lossy(&out.stdout).into_owned()
}
