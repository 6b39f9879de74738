//! Git command execution
//!
//! Thin wrapper around the `git` binary. Every invocation runs synchronously
//! against an explicit working directory (the process-wide current directory
//! is never touched) and reports its outcome as a value: callers branch on
//! [`GitOutput::success`] instead of catching errors. Failure to spawn the
//! tool at all is reported through the same contract.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{Error, Result};

/// Outcome of a single git invocation.
#[derive(Debug, Clone)]
pub struct GitOutput {
    /// Whether the command exited zero
    pub success: bool,
    /// Captured stdout (empty for streamed invocations)
    pub output: String,
    /// Diagnostic text on failure (stderr, or the spawn error)
    pub error_message: Option<String>,
}

impl GitOutput {
    /// Convert into a `Result`, mapping failure to [`Error::Tool`].
    pub fn into_result(self, command: &str) -> Result<String> {
        if self.success {
            Ok(self.output)
        } else {
            Err(Error::Tool {
                command: command.to_string(),
                message: self
                    .error_message
                    .unwrap_or_else(|| "unknown error".to_string()),
            })
        }
    }

    /// Captured stdout with surrounding whitespace removed.
    #[must_use]
    pub fn trimmed(&self) -> String {
        self.output.trim().to_string()
    }
}

/// Executes git commands against a fixed working directory.
#[derive(Debug, Clone)]
pub struct GitRunner {
    work_dir: PathBuf,
}

impl GitRunner {
    /// Create a runner bound to `work_dir`.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    /// The directory commands run in.
    #[must_use]
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Run a git command silently, capturing stdout/stderr for parsing.
    #[must_use]
    pub fn run(&self, args: &[&str]) -> GitOutput {
        debug!(dir = %self.work_dir.display(), "git {}", args.join(" "));

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.work_dir)
            // Disable interactive credential prompts so automation never hangs.
            .env("GIT_TERMINAL_PROMPT", "0")
            // Queries must not contend with a user resolving conflicts in
            // another terminal.
            .env("GIT_OPTIONAL_LOCKS", "0")
            .output();

        match output {
            Ok(out) => {
                let success = out.status.success();
                let stdout = String::from_utf8_lossy(&out.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&out.stderr).into_owned();
                debug!(success, code = ?out.status.code(), "git {} finished", args.join(" "));
                GitOutput {
                    success,
                    output: stdout,
                    error_message: if success {
                        None
                    } else {
                        Some(stderr.trim().to_string())
                    },
                }
            }
            Err(e) => GitOutput {
                success: false,
                output: String::new(),
                error_message: Some(format!("failed to execute git: {e}")),
            },
        }
    }

    /// Run a git command with its output streamed straight to the terminal.
    ///
    /// Used for commands whose live output matters to the user (push
    /// progress, merge conflict listings). Nothing is captured; on failure
    /// the diagnostic text has already been shown, so `error_message` only
    /// names the exit status.
    #[must_use]
    pub fn run_streamed(&self, args: &[&str]) -> GitOutput {
        debug!(dir = %self.work_dir.display(), "git {} (streamed)", args.join(" "));

        let status = Command::new("git")
            .args(args)
            .current_dir(&self.work_dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status();

        match status {
            Ok(status) => GitOutput {
                success: status.success(),
                output: String::new(),
                error_message: if status.success() {
                    None
                } else {
                    Some(format!(
                        "exited with status {}",
                        status.code().map_or_else(|| "unknown".to_string(), |c| c.to_string())
                    ))
                },
            },
            Err(e) => GitOutput {
                success: false,
                output: String::new(),
                error_message: Some(format!("failed to execute git: {e}")),
            },
        }
    }
}
